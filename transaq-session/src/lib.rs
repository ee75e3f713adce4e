//! transaq-session -- async client for a Transaq connector bridge.
//!
//! The bridge runs next to the Transaq XML connector and relays its traffic
//! as length-prefixed JSON frames over TCP. This crate turns those frames
//! into typed events on per-category channels and sends typed commands back.
//!
//! ## Modules
//!
//! - [`models`] -- Connector data structures (securities, trades, candles, positions)
//! - [`command`] -- Outgoing `Command` union
//! - [`events`] -- `Response` union and the `SessionEvents` channel bundle
//! - [`session`] -- `Session` trait consumed by event processors
//! - [`errors`] -- Error types for the library
//! - [`transport`] -- Async TCP transport with length-prefixed framing
//! - [`reader`] -- Async frame reader (spawned tokio task)
//! - [`client`] -- `TransaqClient` (main entry point)

pub mod client;
pub mod command;
pub mod errors;
pub mod events;
pub mod models;
pub mod reader;
pub mod session;
pub mod transport;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use errors::SessionError;

pub use models::market::{AllTrades, BuySell, Candle, Candles, Quotation, Quote, Quotes, Trade};
pub use models::portfolio::{
    FortsCollaterals, FortsMoney, FortsPosition, MoneyPosition, Positions, SecPosition, SpotLimit,
    UnitedEquity, UnitedLimit, UnitedPortfolio,
};
pub use models::security::{Board, CandleKind, Market, SecInfoUpdate, Security, SecurityInfo};
pub use models::status::{ConnectionState, ServerStatus};

pub use client::TransaqClient;
pub use command::{Command, ConnectParams, SubSecurity};
pub use events::{EventSenders, Inbound, Response, SessionEvents};
pub use session::Session;
