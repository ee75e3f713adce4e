//! Row writers on top of a [`Store`].
//!
//! Candles and securities go out as one batch per response. Trades, quotes
//! and security info are written row by row through the store's
//! asynchronous insert, since they arrive continuously.

use std::sync::Arc;

use chrono::NaiveDateTime;
use transaq_session::{Candles, Quote, Security, SecurityInfo, Trade};

use crate::error::IngestError;
use crate::rows::{CandleRow, QuoteRow, SecurityInfoRow, SecurityRow, TradeRow};
use crate::store::{Batch, Row, Store, StoreError};

pub struct BatchWriter<S> {
    store: Arc<S>,
}

impl<S> Clone for BatchWriter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> BatchWriter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Append every row that fits and send the batch once. Returns the
    /// number of rows sent; nothing is sent when no row made it in.
    pub async fn flush<R: Row>(
        &self,
        rows: impl IntoIterator<Item = R>,
    ) -> Result<usize, StoreError> {
        let mut batch = Batch::new(R::TABLE);
        for row in rows {
            if let Err(e) = batch.append(row) {
                tracing::error!(table = %R::TABLE, "skipping row: {e}");
            }
        }
        if batch.is_empty() {
            return Ok(0);
        }
        let sent = batch.len();
        self.store.send_batch(batch).await?;
        Ok(sent)
    }

    /// Flush one history response. Candles with an unusable timestamp are
    /// logged and left out.
    pub async fn write_history(&self, candles: &Candles) -> Result<usize, StoreError> {
        let rows = candles
            .items
            .iter()
            .filter_map(|candle| match CandleRow::from_history(candles, candle) {
                Ok(row) => Some(row),
                Err(e) => {
                    tracing::error!(
                        sec_code = %candles.sec_code,
                        period = candles.period,
                        "skipping candle: {e}"
                    );
                    None
                }
            })
            .collect::<Vec<_>>();
        self.flush(rows).await
    }

    pub async fn write_candles(&self, rows: Vec<CandleRow>) -> Result<usize, StoreError> {
        self.flush(rows).await
    }

    pub async fn write_securities(&self, securities: &[Security]) -> Result<usize, StoreError> {
        self.flush(securities.iter().map(SecurityRow::from)).await
    }

    pub async fn insert_trade(&self, trade: &Trade) -> Result<(), IngestError> {
        self.insert(TradeRow::try_from(trade)?).await
    }

    pub async fn insert_quote(&self, quote: &Quote, time: NaiveDateTime) -> Result<(), IngestError> {
        self.insert(QuoteRow::new(quote, time)).await
    }

    pub async fn insert_security_info(&self, info: &SecurityInfo) -> Result<(), IngestError> {
        self.insert(SecurityInfoRow::try_from(info)?).await
    }

    async fn insert<R: Row>(&self, row: R) -> Result<(), IngestError> {
        self.store
            .async_insert(R::TABLE, row.into_values())
            .await
            .map_err(IngestError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Table, Value};
    use transaq_session::{BuySell, Candle};

    fn writer() -> (BatchWriter<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (BatchWriter::new(Arc::clone(&store)), store)
    }

    fn candle(date: &str, volume: i64) -> Candle {
        Candle {
            date: date.into(),
            open: 1.0,
            close: 2.0,
            high: 3.0,
            low: 0.5,
            volume,
            oi: 0,
        }
    }

    #[tokio::test]
    async fn history_batch_skips_bad_rows() {
        let (writer, store) = writer();
        let candles = Candles {
            sec_id: 1,
            sec_code: "SBER".into(),
            period: 2,
            items: vec![
                candle("01.03.2024 10:00:00", 10),
                candle("not a date", 11),
                candle("01.03.2024 10:05:00", 12),
            ],
            ..Candles::default()
        };

        assert_eq!(writer.write_history(&candles).await.unwrap(), 2);
        let batches = store.batches().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].table(), Table::Candles);
        assert_eq!(batches[0].len(), 2);
    }

    #[tokio::test]
    async fn empty_history_sends_nothing() {
        let (writer, store) = writer();
        let candles = Candles {
            sec_code: "SBER".into(),
            period: 2,
            ..Candles::default()
        };
        assert_eq!(writer.write_history(&candles).await.unwrap(), 0);
        assert!(store.batches().await.is_empty());
    }

    #[tokio::test]
    async fn trade_with_bad_time_is_not_written() {
        let (writer, store) = writer();
        let mut trade = Trade {
            sec_id: 7,
            sec_code: "SiH4".into(),
            trade_no: 1,
            board: "FUT".into(),
            time: "01.03.2024 10:05:01".into(),
            price: 90500.0,
            quantity: 1,
            buy_sell: BuySell::B,
            open_interest: 0,
            period: String::new(),
        };
        writer.insert_trade(&trade).await.unwrap();
        trade.time = "10:05".into();
        assert!(matches!(
            writer.insert_trade(&trade).await,
            Err(IngestError::Timestamp { .. })
        ));

        let rows = store.inserts(Table::Trades).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], Value::Int(7));
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_ingest_error() {
        let (writer, store) = writer();
        store.set_failing(true);
        let result = writer
            .insert_security_info(&SecurityInfo::default())
            .await;
        assert!(matches!(result, Err(IngestError::Store(_))));
    }
}
