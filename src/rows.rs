//! Store rows built from connector events.
//!
//! Each row type maps one event record onto the positional columns of its
//! table. Source timestamps use the connector's `dd.mm.yyyy HH:MM:SS`
//! layout and are parsed here; the store side formats them back out.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use transaq_session::{Candle, Candles, Quote, Security, SecurityInfo, Trade};

use crate::error::IngestError;
use crate::store::{Row, Table, Value};

/// Connector timestamp layout, with optional fractional seconds.
pub const SOURCE_DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S%.f";
/// Connector date-only layout.
pub const SOURCE_DATE_FORMAT: &str = "%d.%m.%Y";
/// Clock-of-day layout of tick quotations.
pub const TICK_TIME_FORMAT: &str = "%H:%M:%S";

// ============================================================================
// Timestamp parsing
// ============================================================================

pub fn parse_source_datetime(field: &'static str, value: &str) -> Result<NaiveDateTime, IngestError> {
    NaiveDateTime::parse_from_str(value.trim(), SOURCE_DATETIME_FORMAT).map_err(|source| {
        IngestError::Timestamp {
            field,
            value: value.to_string(),
            source,
        }
    })
}

/// Parse an optional reference date. Empty means unknown; a bare date is
/// taken at midnight.
pub fn parse_source_date(
    field: &'static str,
    value: &str,
) -> Result<Option<NaiveDateTime>, IngestError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, SOURCE_DATETIME_FORMAT) {
        return Ok(Some(dt));
    }
    NaiveDate::parse_from_str(value, SOURCE_DATE_FORMAT)
        .map(|d| Some(d.and_time(NaiveTime::MIN)))
        .map_err(|source| IngestError::Timestamp {
            field,
            value: value.to_string(),
            source,
        })
}

pub fn parse_tick_time(value: &str) -> Result<NaiveTime, IngestError> {
    NaiveTime::parse_from_str(value.trim(), TICK_TIME_FORMAT).map_err(|source| {
        IngestError::Timestamp {
            field: "time",
            value: value.to_string(),
            source,
        }
    })
}

fn non_negative(field: &'static str, value: i64) -> Result<u64, IngestError> {
    u64::try_from(value).map_err(|_| IngestError::OutOfRange { field, value })
}

// ============================================================================
// Candles
// ============================================================================

/// Replacement key of the candle table.
pub type CandleKey = (NaiveDateTime, String, u8);

#[derive(Debug, Clone, PartialEq)]
pub struct CandleRow {
    pub date: NaiveDateTime,
    pub sec_code: String,
    /// Candle kind id.
    pub period: u8,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
}

impl CandleRow {
    /// One row of a history response.
    pub fn from_history(candles: &Candles, candle: &Candle) -> Result<Self, IngestError> {
        let period = u8::try_from(candles.period).map_err(|_| IngestError::OutOfRange {
            field: "period",
            value: candles.period,
        })?;
        Ok(Self {
            date: parse_source_datetime("date", &candle.date)?,
            sec_code: candles.sec_code.clone(),
            period,
            open: candle.open,
            close: candle.close,
            high: candle.high,
            low: candle.low,
            volume: non_negative("volume", candle.volume)?,
        })
    }

    pub fn dedup_key(&self) -> CandleKey {
        (self.date, self.sec_code.clone(), self.period)
    }
}

impl Row for CandleRow {
    const TABLE: Table = Table::Candles;

    fn into_values(self) -> Vec<Value> {
        vec![
            self.date.into(),
            self.sec_code.into(),
            self.period.into(),
            self.open.into(),
            self.close.into(),
            self.high.into(),
            self.low.into(),
            self.volume.into(),
        ]
    }
}

// ============================================================================
// Trades
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRow {
    pub time: NaiveDateTime,
    pub sec_id: i64,
    pub sec_code: String,
    pub trade_no: i64,
    pub board: String,
    pub price: f64,
    pub quantity: i64,
    pub buy_sell: &'static str,
    pub open_interest: i64,
    pub period: String,
}

impl TryFrom<&Trade> for TradeRow {
    type Error = IngestError;

    fn try_from(trade: &Trade) -> Result<Self, Self::Error> {
        Ok(Self {
            time: parse_source_datetime("time", &trade.time)?,
            sec_id: trade.sec_id,
            sec_code: trade.sec_code.clone(),
            trade_no: trade.trade_no,
            board: trade.board.clone(),
            price: trade.price,
            quantity: trade.quantity,
            buy_sell: trade.buy_sell.as_str(),
            open_interest: trade.open_interest,
            period: trade.period.clone(),
        })
    }
}

impl Row for TradeRow {
    const TABLE: Table = Table::Trades;

    fn into_values(self) -> Vec<Value> {
        vec![
            self.time.into(),
            self.sec_id.into(),
            self.sec_code.into(),
            self.trade_no.into(),
            self.board.into(),
            self.price.into(),
            self.quantity.into(),
            self.buy_sell.into(),
            self.open_interest.into(),
            self.period.into(),
        ]
    }
}

// ============================================================================
// Quotes
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRow {
    /// Reference timestamp of the quote batch.
    pub time: NaiveDateTime,
    pub sec_id: i64,
    pub board: String,
    pub sec_code: String,
    pub price: f64,
    pub source: String,
    pub yield_: i64,
    pub buy: i64,
    pub sell: i64,
}

impl QuoteRow {
    pub fn new(quote: &Quote, time: NaiveDateTime) -> Self {
        Self {
            time,
            sec_id: quote.sec_id,
            board: quote.board.clone(),
            sec_code: quote.sec_code.clone(),
            price: quote.price,
            source: quote.source.clone(),
            yield_: quote.yield_,
            buy: quote.buy,
            sell: quote.sell,
        }
    }
}

impl Row for QuoteRow {
    const TABLE: Table = Table::Quotes;

    fn into_values(self) -> Vec<Value> {
        vec![
            self.time.into(),
            self.sec_id.into(),
            self.board.into(),
            self.sec_code.into(),
            self.price.into(),
            self.source.into(),
            self.yield_.into(),
            self.buy.into(),
            self.sell.into(),
        ]
    }
}

// ============================================================================
// Securities
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityRow(pub Security);

impl From<&Security> for SecurityRow {
    fn from(sec: &Security) -> Self {
        Self(sec.clone())
    }
}

impl Row for SecurityRow {
    const TABLE: Table = Table::Securities;

    fn into_values(self) -> Vec<Value> {
        let sec = self.0;
        vec![
            sec.sec_id.into(),
            sec.sec_code.into(),
            sec.instr_class.into(),
            sec.board.into(),
            sec.market.into(),
            sec.short_name.into(),
            sec.decimals.into(),
            sec.min_step.into(),
            sec.lot_size.into(),
            sec.point_cost.into(),
            sec.sec_type.into(),
            sec.quotes_type.into(),
        ]
    }
}

/// Bond or derivative reference record with its dates resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityInfoRow {
    pub info: SecurityInfo,
    pub mat_date: Option<NaiveDateTime>,
    pub coupon_date: Option<NaiveDateTime>,
    pub buyback_date: Option<NaiveDateTime>,
}

impl TryFrom<&SecurityInfo> for SecurityInfoRow {
    type Error = IngestError;

    fn try_from(info: &SecurityInfo) -> Result<Self, Self::Error> {
        Ok(Self {
            mat_date: parse_source_date("mat_date", &info.mat_date)?,
            coupon_date: parse_source_date("coupon_date", &info.coupon_date)?,
            buyback_date: parse_source_date("buybackdate", &info.buyback_date)?,
            info: info.clone(),
        })
    }
}

impl Row for SecurityInfoRow {
    const TABLE: Table = Table::SecuritiesInfo;

    fn into_values(self) -> Vec<Value> {
        let i = self.info;
        vec![
            i.sec_id.into(),
            i.sec_name.into(),
            i.sec_code.into(),
            i.market.into(),
            i.pname.into(),
            self.mat_date.into(),
            i.clearing_price.into(),
            i.min_price.into(),
            i.max_price.into(),
            i.buy_deposit.into(),
            i.sell_deposit.into(),
            i.bgo_c.into(),
            i.bgo_nc.into(),
            i.bgo_buy.into(),
            i.accrued_int.into(),
            i.coupon_value.into(),
            self.coupon_date.into(),
            i.coupon_period.into(),
            i.face_value.into(),
            i.put_call.into(),
            i.point_cost.into(),
            i.opt_type.into(),
            i.lot_volume.into(),
            i.isin.into(),
            i.reg_number.into(),
            i.buyback_price.into(),
            self.buyback_date.into(),
            i.currency_id.into(),
        ]
    }
}
