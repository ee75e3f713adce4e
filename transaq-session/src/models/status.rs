//! Server connection status.

use serde::{Deserialize, Serialize};

/// Value of the `connected` attribute of a `server_status` message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    #[serde(rename = "true")]
    Connected,
    #[default]
    #[serde(rename = "false")]
    Disconnected,
    #[serde(rename = "error")]
    Error,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Connector status notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub connected: ConnectionState,
    /// Connector is re-establishing the server link on its own.
    #[serde(default)]
    pub recover: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_tz: Option<String>,
    /// Error text, present when `connected` is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServerStatus {
    pub fn new(connected: ConnectionState) -> Self {
        Self {
            connected,
            ..Self::default()
        }
    }
}
