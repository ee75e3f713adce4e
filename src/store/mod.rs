//! Columnar store boundary.
//!
//! Rows travel as positional [`Value`] lists in the column order of their
//! [`Table`]. Two write paths exist: a prepared [`Batch`] sent in one request,
//! and a single-row asynchronous insert the server buffers on its side.

pub mod clickhouse;
pub mod memory;
pub mod schema;

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use thiserror::Error;

pub use clickhouse::{ClickHouseConfig, ClickHouseStore};
pub use memory::MemoryStore;

/// Datetime layout expected by `DateTime` columns.
pub const STORE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("{row} row appended to {batch} batch")]
    TableMismatch { batch: Table, row: Table },

    #[error("{table} expects {expected} columns, got {got}")]
    ColumnCount {
        table: Table,
        expected: usize,
        got: usize,
    },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Candles,
    Securities,
    SecuritiesInfo,
    Trades,
    Quotes,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Candles,
        Table::Securities,
        Table::SecuritiesInfo,
        Table::Trades,
        Table::Quotes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Candles => "transaq_candles",
            Table::Securities => "transaq_securities",
            Table::SecuritiesInfo => "transaq_securities_info",
            Table::Trades => "transaq_trades",
            Table::Quotes => "transaq_quotes",
        }
    }

    /// Column names in insert order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Candles => &[
                "date", "sec_code", "period", "open", "close", "high", "low", "volume",
            ],
            Table::Securities => &[
                "secid",
                "seccode",
                "instrclass",
                "board",
                "market",
                "shortname",
                "decimals",
                "minstep",
                "lotsize",
                "point_cost",
                "sectype",
                "quotestype",
            ],
            Table::SecuritiesInfo => &[
                "secid",
                "sec_name",
                "sec_code",
                "market",
                "pname",
                "mat_date",
                "clearing_price",
                "minprice",
                "maxprice",
                "buy_deposit",
                "sell_deposit",
                "bgo_c",
                "bgo_nc",
                "bgo_buy",
                "accruedint",
                "coupon_value",
                "coupon_date",
                "coupon_period",
                "facevalue",
                "put_call",
                "point_cost",
                "opt_type",
                "lot_volume",
                "isin",
                "regnumber",
                "buybackprice",
                "buybackdate",
                "currencyid",
            ],
            Table::Trades => &[
                "time",
                "secid",
                "sec_code",
                "trade_no",
                "board",
                "price",
                "quantity",
                "buy_sell",
                "open_interest",
                "period",
            ],
            Table::Quotes => &[
                "time", "secid", "board", "sec_code", "price", "source", "yield", "buy", "sell",
            ],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reject a positional row whose width does not match the table.
pub fn check_columns(table: Table, values: &[Value]) -> Result<(), StoreError> {
    let expected = table.columns().len();
    if values.len() != expected {
        return Err(StoreError::ColumnCount {
            table,
            expected,
            got: values.len(),
        });
    }
    Ok(())
}

// ============================================================================
// Values and rows
// ============================================================================

/// One positional column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    DateTime(NaiveDateTime),
    Str(String),
    UInt(u64),
    Int(i64),
    Float(f64),
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::DateTime(dt) => serializer.collect_str(&dt.format(STORE_DATETIME_FORMAT)),
            Value::Str(s) => serializer.serialize_str(s),
            Value::UInt(v) => serializer.serialize_u64(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::UInt(u64::from(v))
    }
}

/// A typed row that knows its table and column order.
pub trait Row {
    const TABLE: Table;

    fn into_values(self) -> Vec<Value>;
}

// ============================================================================
// Batch
// ============================================================================

/// Rows prepared for one table and sent in a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    table: Table,
    rows: Vec<Vec<Value>>,
}

impl Batch {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            rows: Vec::new(),
        }
    }

    pub fn append<R: Row>(&mut self, row: R) -> Result<(), StoreError> {
        if R::TABLE != self.table {
            return Err(StoreError::TableMismatch {
                batch: self.table,
                row: R::TABLE,
            });
        }
        self.append_values(row.into_values())
    }

    pub fn append_values(&mut self, values: Vec<Value>) -> Result<(), StoreError> {
        check_columns(self.table, &values)?;
        self.rows.push(values);
        Ok(())
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Store
// ============================================================================

/// Write primitives of the columnar store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Send a prepared batch as one insert.
    async fn send_batch(&self, batch: Batch) -> Result<(), StoreError>;

    /// Insert one row without waiting for it to be flushed to storage.
    async fn async_insert(&self, table: Table, values: Vec<Value>) -> Result<(), StoreError>;
}
