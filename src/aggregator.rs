//! Tick-to-candle aggregation.
//!
//! Quotation ticks accumulate into one running candle per instrument. A tick
//! stamped on a whole minute (`HH:MM:00`) with a price closes the running
//! candle into a one-period row and clears the slot; the next tick starts a
//! fresh candle.

use std::collections::HashMap;

use chrono::NaiveDate;
use transaq_session::Quotation;

use crate::error::IngestError;
use crate::rows::{parse_tick_time, CandleRow};

/// Candle kind id stored for candles built from ticks.
pub const TICK_CANDLE_PERIOD: u8 = 1;

/// Running candle for one instrument.
///
/// Zero prices mean "not seen yet".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialCandle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
}

impl PartialCandle {
    fn start(tick: &Quotation) -> Self {
        Self {
            open: tick.last,
            high: tick.last,
            low: tick.last,
            volume: tick.quantity,
        }
    }

    fn accumulate(&mut self, tick: &Quotation) {
        if self.open == 0.0 && tick.open != 0.0 {
            self.open = tick.open;
        }
        // Ticks without a trade price only carry volume.
        if tick.last > 0.0 {
            if tick.last > self.high {
                self.high = tick.last;
            }
            if self.low == 0.0 || tick.last < self.low {
                self.low = tick.last;
            }
        }
        self.volume += tick.quantity;
    }
}

fn closes_candle(tick: &Quotation) -> bool {
    tick.time.ends_with(":00") && tick.last > 0.0
}

/// Per-instrument running candles keyed by `secid`.
#[derive(Debug, Default)]
pub struct CandleAggregator {
    candles: HashMap<i64, PartialCandle>,
}

impl CandleAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sec_id: i64) -> Option<&PartialCandle> {
        self.candles.get(&sec_id)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Fold one tick in. Returns the closed candle when the tick is a
    /// boundary tick for an instrument that has a running candle.
    pub fn apply(
        &mut self,
        tick: &Quotation,
        today: NaiveDate,
    ) -> Result<Option<CandleRow>, IngestError> {
        if closes_candle(tick) && self.candles.contains_key(&tick.sec_id) {
            // A bad boundary time must leave the running candle intact.
            let time = parse_tick_time(&tick.time)?;
            if let Some(candle) = self.candles.remove(&tick.sec_id) {
                return Ok(Some(CandleRow {
                    date: today.and_time(time),
                    sec_code: tick.sec_code.clone(),
                    period: TICK_CANDLE_PERIOD,
                    open: candle.open,
                    close: tick.last,
                    high: candle.high,
                    low: candle.low,
                    volume: u64::try_from(candle.volume).unwrap_or(0),
                }));
            }
        }

        self.candles
            .entry(tick.sec_id)
            .and_modify(|c| c.accumulate(tick))
            .or_insert_with(|| PartialCandle::start(tick));
        Ok(None)
    }

    /// Fold a whole quotations response and collect the closed candles.
    /// A tick that cannot be used is logged and skipped.
    pub fn apply_all(&mut self, ticks: &[Quotation], today: NaiveDate) -> Vec<CandleRow> {
        let mut closed = Vec::new();
        for tick in ticks {
            match self.apply(tick, today) {
                Ok(Some(row)) => closed.push(row),
                Ok(None) => {}
                Err(e) => tracing::error!(sec_id = tick.sec_id, "dropping tick: {e}"),
            }
        }
        closed
    }
}
