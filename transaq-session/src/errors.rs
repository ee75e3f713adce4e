//! Error types for the transaq-session library.

use thiserror::Error;

/// Top-level error type for the Transaq bridge client.
#[derive(Debug, Error)]
pub enum SessionError {
    /// TCP connection failure or socket error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failed to encode an outgoing command.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Failed to decode an inbound frame.
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Framing violation (zero or oversized frame).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Connection was unexpectedly closed.
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Decoding(e.to_string())
    }
}

/// Convenience Result type for this library.
pub type Result<T> = std::result::Result<T, SessionError>;
