//! Outgoing connector commands.
//!
//! Serialized as JSON objects tagged by `id`, matching the connector's
//! `<command id="...">` names.

use serde::{Deserialize, Serialize};

/// Credentials and tuning for the `connect` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectParams {
    pub login: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    /// Minimum delay between server polls, milliseconds.
    #[serde(rename = "rqdelay")]
    pub rq_delay: u32,
    /// Server session timeout, seconds.
    pub session_timeout: u32,
    /// Socket request timeout, seconds.
    pub request_timeout: u32,
}

/// Instrument reference used by `subscribe`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubSecurity {
    #[serde(rename = "secid")]
    pub sec_id: i64,
    pub board: String,
    #[serde(rename = "seccode")]
    pub sec_code: String,
}

/// A command sent to the connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "snake_case")]
pub enum Command {
    Connect(ConnectParams),
    Disconnect,
    Subscribe {
        quotations: Vec<SubSecurity>,
        #[serde(rename = "alltrades")]
        all_trades: Vec<i64>,
    },
    GetSecuritiesInfo {
        #[serde(rename = "secid")]
        sec_id: i64,
    },
    #[serde(rename = "gethistorydata")]
    GetHistoryData {
        #[serde(rename = "secid")]
        sec_id: i64,
        /// Candle kind id.
        period: i64,
        count: i64,
        /// `true` requests the most recent candles; `false` continues from
        /// where the previous request stopped.
        reset: bool,
    },
}

impl Command {
    /// The connector command name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Connect(_) => "connect",
            Command::Disconnect => "disconnect",
            Command::Subscribe { .. } => "subscribe",
            Command::GetSecuritiesInfo { .. } => "get_securities_info",
            Command::GetHistoryData { .. } => "gethistorydata",
        }
    }
}
