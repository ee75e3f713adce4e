//! Connector event types and the typed channel bundle that delivers them.
//!
//! High-frequency and status events travel on their own channels; every
//! other connector response is a variant of the closed [`Response`] union so
//! consumers match it exhaustively.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::models::market::{AllTrades, Candles, Quotation, Quotes};
use crate::models::portfolio::{Positions, UnitedEquity, UnitedPortfolio};
use crate::models::security::{Board, CandleKind, Market, SecInfoUpdate, Security, SecurityInfo};
use crate::models::status::ServerStatus;

// ============================================================================
// Response
// ============================================================================

/// A connector response delivered on the generic response channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    UnitedPortfolio(UnitedPortfolio),
    UnitedEquity(UnitedEquity),
    Positions(Positions),
    Candles(Candles),
    Quotations(Vec<Quotation>),
    Securities(Vec<Security>),
    CandleKinds(Vec<CandleKind>),
    Markets(Vec<Market>),
    Boards(Vec<Board>),
}

impl Response {
    /// The connector's name for this response.
    pub fn kind(&self) -> &'static str {
        match self {
            Response::UnitedPortfolio(_) => "united_portfolio",
            Response::UnitedEquity(_) => "united_equity",
            Response::Positions(_) => "positions",
            Response::Candles(_) => "candles",
            Response::Quotations(_) => "quotations",
            Response::Securities(_) => "securities",
            Response::CandleKinds(_) => "candlekinds",
            Response::Markets(_) => "markets",
            Response::Boards(_) => "boards",
        }
    }
}

// ============================================================================
// Inbound frame
// ============================================================================

/// One decoded frame from the bridge: `{"kind": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Inbound {
    ServerStatus(ServerStatus),
    SecInfoUpd(SecInfoUpdate),
    #[serde(rename = "alltrades")]
    AllTrades(AllTrades),
    Quotes(Quotes),
    SecInfo(SecurityInfo),
    UnitedPortfolio(UnitedPortfolio),
    UnitedEquity(UnitedEquity),
    Positions(Positions),
    Candles(Candles),
    Quotations(Vec<Quotation>),
    Securities(Vec<Security>),
    #[serde(rename = "candlekinds")]
    CandleKinds(Vec<CandleKind>),
    Markets(Vec<Market>),
    Boards(Vec<Board>),
}

// ============================================================================
// Channels
// ============================================================================

/// Receiving half: one channel per event category.
pub struct SessionEvents {
    pub sec_info_updates: mpsc::UnboundedReceiver<SecInfoUpdate>,
    pub server_status: mpsc::UnboundedReceiver<ServerStatus>,
    pub all_trades: mpsc::UnboundedReceiver<AllTrades>,
    pub quotes: mpsc::UnboundedReceiver<Quotes>,
    pub sec_info: mpsc::UnboundedReceiver<SecurityInfo>,
    pub responses: mpsc::UnboundedReceiver<Response>,
}

/// Sending half, cloned into every reader task of a client.
#[derive(Debug, Clone)]
pub struct EventSenders {
    pub sec_info_updates: mpsc::UnboundedSender<SecInfoUpdate>,
    pub server_status: mpsc::UnboundedSender<ServerStatus>,
    pub all_trades: mpsc::UnboundedSender<AllTrades>,
    pub quotes: mpsc::UnboundedSender<Quotes>,
    pub sec_info: mpsc::UnboundedSender<SecurityInfo>,
    pub responses: mpsc::UnboundedSender<Response>,
}

/// Create a connected sender/receiver bundle.
pub fn channel() -> (EventSenders, SessionEvents) {
    let (sec_info_upd_tx, sec_info_upd_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let (trades_tx, trades_rx) = mpsc::unbounded_channel();
    let (quotes_tx, quotes_rx) = mpsc::unbounded_channel();
    let (sec_info_tx, sec_info_rx) = mpsc::unbounded_channel();
    let (responses_tx, responses_rx) = mpsc::unbounded_channel();

    (
        EventSenders {
            sec_info_updates: sec_info_upd_tx,
            server_status: status_tx,
            all_trades: trades_tx,
            quotes: quotes_tx,
            sec_info: sec_info_tx,
            responses: responses_tx,
        },
        SessionEvents {
            sec_info_updates: sec_info_upd_rx,
            server_status: status_rx,
            all_trades: trades_rx,
            quotes: quotes_rx,
            sec_info: sec_info_rx,
            responses: responses_rx,
        },
    )
}

impl EventSenders {
    /// Route a decoded frame to its channel.
    ///
    /// Returns `false` once the receiving side has been dropped.
    pub fn route(&self, inbound: Inbound) -> bool {
        match inbound {
            Inbound::ServerStatus(s) => self.server_status.send(s).is_ok(),
            Inbound::SecInfoUpd(u) => self.sec_info_updates.send(u).is_ok(),
            Inbound::AllTrades(t) => self.all_trades.send(t).is_ok(),
            Inbound::Quotes(q) => self.quotes.send(q).is_ok(),
            Inbound::SecInfo(i) => self.sec_info.send(i).is_ok(),
            Inbound::UnitedPortfolio(p) => self.respond(Response::UnitedPortfolio(p)),
            Inbound::UnitedEquity(e) => self.respond(Response::UnitedEquity(e)),
            Inbound::Positions(p) => self.respond(Response::Positions(p)),
            Inbound::Candles(c) => self.respond(Response::Candles(c)),
            Inbound::Quotations(q) => self.respond(Response::Quotations(q)),
            Inbound::Securities(s) => self.respond(Response::Securities(s)),
            Inbound::CandleKinds(k) => self.respond(Response::CandleKinds(k)),
            Inbound::Markets(m) => self.respond(Response::Markets(m)),
            Inbound::Boards(b) => self.respond(Response::Boards(b)),
        }
    }

    fn respond(&self, response: Response) -> bool {
        self.responses.send(response).is_ok()
    }
}
