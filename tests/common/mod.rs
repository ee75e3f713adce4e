//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::mpsc;
use transaq_session::errors::Result;
use transaq_session::{CandleKind, Command, Quotation, Security, Session};

/// Session that records commands instead of talking to a connector.
#[derive(Default)]
pub struct FakeSession {
    sent: Mutex<Vec<Command>>,
    observer: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    reconnects: AtomicUsize,
    securities: Vec<Security>,
    kinds: Vec<CandleKind>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_universe(securities: Vec<Security>, kinds: Vec<CandleKind>) -> Self {
        Self {
            securities,
            kinds,
            ..Self::default()
        }
    }

    /// Receive a copy of every command sent from now on.
    pub fn observe(&self) -> mpsc::UnboundedReceiver<Command> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.observer.lock().unwrap() = Some(tx);
        rx
    }

    pub fn sent(&self) -> Vec<Command> {
        self.sent.lock().unwrap().clone()
    }

    pub fn history_requests(&self) -> Vec<Command> {
        self.sent()
            .into_iter()
            .filter(|c| matches!(c, Command::GetHistoryData { .. }))
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn reconnects(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn send_command(&self, command: Command) -> Result<()> {
        if let Some(observer) = self.observer.lock().unwrap().as_ref() {
            let _ = observer.send(command.clone());
        }
        self.sent.lock().unwrap().push(command);
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn securities(&self) -> Vec<Security> {
        self.securities.clone()
    }

    async fn candle_kinds(&self) -> Vec<CandleKind> {
        self.kinds.clone()
    }
}

pub fn trading_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

pub fn security(sec_id: i64, code: &str, board: &str) -> Security {
    Security {
        sec_id,
        active: true,
        sec_code: code.into(),
        board: board.into(),
        short_name: code.into(),
        sec_type: "SHARE".into(),
        ..Security::default()
    }
}

pub fn minute_kind() -> CandleKind {
    CandleKind {
        id: 1,
        period: 60,
        name: "1 minute".into(),
    }
}

pub fn tick(sec_id: i64, time: &str, last: f64, quantity: i64) -> Quotation {
    Quotation {
        sec_id,
        board: "TQBR".into(),
        sec_code: "SBER".into(),
        time: time.into(),
        last,
        quantity,
        ..Quotation::default()
    }
}
