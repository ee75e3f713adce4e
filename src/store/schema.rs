//! Table DDL.
//!
//! Every table is a ReplacingMergeTree whose sorting key is the row's
//! deduplication key, so re-delivered rows collapse on merge.

use super::Table;

const CANDLES: &str = r#"CREATE TABLE IF NOT EXISTS transaq_candles (
    date       DateTime('Europe/Moscow'),
    sec_code   FixedString(16),
    period     UInt8,
    open       Float64,
    close      Float64,
    high       Float64,
    low        Float64,
    volume     UInt64
) ENGINE = ReplacingMergeTree()
ORDER BY (date, sec_code, period)"#;

const SECURITIES: &str = r#"CREATE TABLE IF NOT EXISTS transaq_securities (
    secid      UInt32,
    seccode    FixedString(16),
    instrclass String,
    board      String,
    market     UInt16,
    shortname  String,
    decimals   UInt8,
    minstep    Float64,
    lotsize    UInt32,
    point_cost Float64,
    sectype    String,
    quotestype UInt8
) ENGINE = ReplacingMergeTree()
ORDER BY (seccode, instrclass, board, market, sectype, quotestype)"#;

const SECURITIES_INFO: &str = r#"CREATE TABLE IF NOT EXISTS transaq_securities_info (
    secid          UInt32,
    sec_name       String,
    sec_code       String,
    market         UInt16,
    pname          String,
    mat_date       Nullable(DateTime('Europe/Moscow')),
    clearing_price Float64,
    minprice       Float64,
    maxprice       Float64,
    buy_deposit    Float64,
    sell_deposit   Float64,
    bgo_c          Float64,
    bgo_nc         Float64,
    bgo_buy        Float64,
    accruedint     Float64,
    coupon_value   Float64,
    coupon_date    Nullable(DateTime('Europe/Moscow')),
    coupon_period  UInt32,
    facevalue      Float64,
    put_call       String,
    point_cost     Float64,
    opt_type       String,
    lot_volume     UInt32,
    isin           String,
    regnumber      String,
    buybackprice   Float64,
    buybackdate    Nullable(DateTime('Europe/Moscow')),
    currencyid     String
) ENGINE = ReplacingMergeTree()
ORDER BY (sec_code, market, regnumber, isin)"#;

const TRADES: &str = r#"CREATE TABLE IF NOT EXISTS transaq_trades (
    time          DateTime('Europe/Moscow'),
    secid         UInt32,
    sec_code      FixedString(16),
    trade_no      Int64,
    board         LowCardinality(String),
    price         Float64,
    quantity      UInt32,
    buy_sell      LowCardinality(String),
    open_interest Int32,
    period        LowCardinality(String)
) ENGINE = ReplacingMergeTree()
ORDER BY (secid, board, sec_code, trade_no, time, buy_sell)"#;

const QUOTES: &str = r#"CREATE TABLE IF NOT EXISTS transaq_quotes (
    time     DateTime('Europe/Moscow'),
    secid    UInt32,
    board    LowCardinality(String),
    sec_code FixedString(16),
    price    Float64,
    source   String,
    yield    Int32,
    buy      Int32,
    sell     Int32
) ENGINE = ReplacingMergeTree()
ORDER BY (time, secid, board, sec_code, source, price)"#;

pub fn create_table(table: Table) -> &'static str {
    match table {
        Table::Candles => CANDLES,
        Table::Securities => SECURITIES,
        Table::SecuritiesInfo => SECURITIES_INFO,
        Table::Trades => TRADES,
        Table::Quotes => QUOTES,
    }
}

/// Sorting-key columns of a table, in key order.
pub fn dedup_key(table: Table) -> &'static [&'static str] {
    match table {
        Table::Candles => &["date", "sec_code", "period"],
        Table::Securities => &["seccode", "instrclass", "board", "market", "sectype", "quotestype"],
        Table::SecuritiesInfo => &["sec_code", "market", "regnumber", "isin"],
        Table::Trades => &["secid", "board", "sec_code", "trade_no", "time", "buy_sell"],
        Table::Quotes => &["time", "secid", "board", "sec_code", "source", "price"],
    }
}
