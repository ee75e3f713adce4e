//! The session abstraction consumed by event processors.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::command::Command;
use crate::errors::Result;
use crate::models::security::{CandleKind, Security};
use crate::models::status::ServerStatus;

/// A live connector session.
///
/// Events are delivered through the [`crate::events::SessionEvents`] bundle
/// returned when the session is created; this trait covers the outbound side
/// and the reference data the session accumulates.
#[async_trait]
pub trait Session: Send + Sync {
    /// Send one command to the connector.
    async fn send_command(&self, command: Command) -> Result<()>;

    /// Re-establish the connector link and log in again.
    async fn reconnect(&self) -> Result<()>;

    /// Every security announced since connect, ordered by `secid`.
    async fn securities(&self) -> Vec<Security>;

    /// Candle granularities offered by the server.
    async fn candle_kinds(&self) -> Vec<CandleKind>;
}

/// Reference data accumulated from inbound frames.
#[derive(Debug, Default)]
pub struct SessionData {
    /// Whether the bridge socket is believed to be open.
    pub link_up: bool,
    pub status: ServerStatus,
    pub securities: BTreeMap<i64, Security>,
    pub candle_kinds: Vec<CandleKind>,
}

impl SessionData {
    /// Securities arrive in several chunks; later entries replace earlier
    /// ones with the same `secid`.
    pub fn upsert_securities(&mut self, securities: &[Security]) {
        for sec in securities {
            self.securities.insert(sec.sec_id, sec.clone());
        }
    }
}
