//! transaq-export -- ingestion core for Transaq market data.
//!
//! Consumes the typed event channels of a [`transaq_session`] session and
//! writes quotes, trades, candles and reference data to a columnar store.
//!
//! ## Modules
//!
//! - [`dispatcher`] -- Single event loop that owns all ingestion state
//! - [`bootstrap`] -- Startup scan, history backfill and subscription plan
//! - [`aggregator`] -- Tick-to-candle aggregation
//! - [`positions`] -- Position cache merged from partial updates
//! - [`liveness`] -- Periodic reconnect watchdog
//! - [`writer`] -- Batched and single-row writers
//! - [`rows`] -- Store rows built from connector events
//! - [`store`] -- Store trait, ClickHouse and in-memory backends, DDL
//! - [`config`] -- Command-line / environment configuration
//! - [`shutdown`] -- Shutdown signal shared by long-running waits

pub mod aggregator;
pub mod bootstrap;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod liveness;
pub mod positions;
pub mod rows;
pub mod shutdown;
pub mod store;
pub mod subscription;
pub mod writer;

pub use bootstrap::Bootstrapper;
pub use config::{Args, ExportConfig, HistoryDepth};
pub use dispatcher::Dispatcher;
pub use error::IngestError;
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use store::{ClickHouseStore, MemoryStore, Store, StoreError};
pub use subscription::{CandleProgress, SubscriptionPlan};
pub use writer::BatchWriter;
