//! Market data: all-trades, order book quotes, quotations (ticks), candles.

use serde::{Deserialize, Serialize};

// ============================================================================
// All trades
// ============================================================================

/// Aggressor side of an exchange trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuySell {
    B,
    S,
}

impl BuySell {
    pub fn as_str(self) -> &'static str {
        match self {
            BuySell::B => "B",
            BuySell::S => "S",
        }
    }
}

/// One anonymous exchange trade from the `alltrades` feed.
///
/// `time` uses the connector's `dd.mm.yyyy HH:MM:SS[.fff]` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(rename = "secid")]
    pub sec_id: i64,
    #[serde(rename = "seccode")]
    pub sec_code: String,
    #[serde(rename = "tradeno")]
    pub trade_no: i64,
    pub board: String,
    pub time: String,
    pub price: f64,
    pub quantity: i64,
    #[serde(rename = "buysell")]
    pub buy_sell: BuySell,
    #[serde(rename = "openinterest", default)]
    pub open_interest: i64,
    /// Trading session phase code (`O`, `N`, `C`, ...).
    #[serde(default)]
    pub period: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllTrades {
    pub items: Vec<Trade>,
}

// ============================================================================
// Quotes (order book levels)
// ============================================================================

/// One order book price level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quote {
    #[serde(rename = "secid")]
    pub sec_id: i64,
    pub board: String,
    #[serde(rename = "seccode")]
    pub sec_code: String,
    pub price: f64,
    pub source: String,
    #[serde(rename = "yield")]
    pub yield_: i64,
    pub buy: i64,
    pub sell: i64,
}

/// A delivery of order book levels sharing one reference timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quotes {
    /// Reference timestamp, `dd.mm.yyyy HH:MM:SS`. Empty when the bridge
    /// omits it.
    #[serde(default)]
    pub time: String,
    pub items: Vec<Quote>,
}

// ============================================================================
// Quotations (ticks)
// ============================================================================

/// Real-time quotation update for one instrument.
///
/// Only the fields that changed are populated; missing numeric fields are
/// zero and `time` is the last trade's `HH:MM:SS`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quotation {
    #[serde(rename = "secid")]
    pub sec_id: i64,
    pub board: String,
    #[serde(rename = "seccode")]
    pub sec_code: String,
    pub time: String,
    pub last: f64,
    pub open: f64,
    pub quantity: i64,
    pub high: f64,
    pub low: f64,
    pub bid: f64,
    pub offer: f64,
    #[serde(rename = "voltoday")]
    pub vol_today: i64,
}

// ============================================================================
// Candles
// ============================================================================

/// A historical candle. `date` is in `dd.mm.yyyy HH:MM:SS` form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: String,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
    #[serde(default)]
    pub oi: i64,
}

/// Response to `gethistorydata`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candles {
    #[serde(rename = "secid")]
    pub sec_id: i64,
    #[serde(default)]
    pub board: String,
    #[serde(rename = "seccode")]
    pub sec_code: String,
    /// Candle kind id.
    pub period: i64,
    /// 0 = more data available, 1 = no more data, 2 = all requested
    /// candles delivered, 3 = data not available.
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub items: Vec<Candle>,
}
