//! Error types for the ingestion core.

use thiserror::Error;
use transaq_session::SessionError;

use crate::store::StoreError;

/// Errors raised while turning session events into store rows.
///
/// None of these leave the core: handlers log them and move on to the next
/// event.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A source timestamp did not match the connector's format.
    #[error("cannot parse {field} {value:?}: {source}")]
    Timestamp {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A field value does not fit the store column.
    #[error("{field} value {value} out of range")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The dispatcher task has gone away.
    #[error("Dispatcher stopped")]
    DispatcherGone,

    #[error("Shutdown requested")]
    Shutdown,

    #[error("Startup failed: {0}")]
    Startup(String),
}
