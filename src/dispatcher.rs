//! Event dispatcher: the single loop that owns all ingestion state.
//!
//! Every inbound event is handled here, one at a time, so the running
//! candles, the position cache and the subscription plan need no locks.
//! Handlers log their own failures; nothing an event does can stop the
//! loop. Only the shutdown signal ends it.
//!
//! Two things leave the loop: the connection state on a `watch` channel
//! (the bootstrapper waits on it) and a [`CandleProgress`] broadcast after
//! every history batch (the bootstrapper paces its backfill on it).

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::{broadcast, mpsc, watch};
use transaq_session::{
    AllTrades, Candles, Command, ConnectionState, Positions, Quotation, Quotes, Response,
    SecInfoUpdate, SecurityInfo, ServerStatus, Session, SessionEvents,
};

use crate::aggregator::CandleAggregator;
use crate::config::ExportConfig;
use crate::liveness::{LivenessCheck, LivenessMonitor};
use crate::positions::PositionCache;
use crate::rows::parse_source_datetime;
use crate::shutdown::Shutdown;
use crate::store::Store;
use crate::subscription::{CandleProgress, SubscriptionPlan};
use crate::writer::BatchWriter;

const PROGRESS_CAPACITY: usize = 256;

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct Dispatcher<S, W> {
    session: Arc<S>,
    writer: BatchWriter<W>,
    all_trades_from_positions: bool,

    aggregator: CandleAggregator,
    positions: PositionCache,
    plan: SubscriptionPlan,
    liveness: LivenessMonitor,
    today: fn() -> NaiveDate,

    status_tx: watch::Sender<ConnectionState>,
    progress_tx: broadcast::Sender<CandleProgress>,
}

impl<S: Session + 'static, W: Store + 'static> Dispatcher<S, W> {
    pub fn new(session: Arc<S>, writer: BatchWriter<W>, config: &ExportConfig) -> Self {
        let (status_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (progress_tx, _) = broadcast::channel(PROGRESS_CAPACITY);
        Self {
            session,
            writer,
            all_trades_from_positions: config.all_trades.from_positions,
            aggregator: CandleAggregator::new(),
            positions: PositionCache::new(),
            plan: SubscriptionPlan::default(),
            liveness: LivenessMonitor::default(),
            today: local_today,
            status_tx,
            progress_tx,
        }
    }

    /// Replace the calendar date source used to stamp tick candles.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    pub fn status_watch(&self) -> watch::Receiver<ConnectionState> {
        self.status_tx.subscribe()
    }

    pub fn progress_feed(&self) -> broadcast::Receiver<CandleProgress> {
        self.progress_tx.subscribe()
    }

    pub fn plan(&self) -> &SubscriptionPlan {
        &self.plan
    }

    pub fn positions(&self) -> &PositionCache {
        &self.positions
    }

    pub fn aggregator(&self) -> &CandleAggregator {
        &self.aggregator
    }

    // ========================================================================
    // Loop
    // ========================================================================

    /// Run until shutdown. `plans` delivers the bootstrapper's subscription
    /// plan; it may close without ever sending one.
    pub async fn run(
        mut self,
        mut events: SessionEvents,
        mut plans: mpsc::Receiver<SubscriptionPlan>,
        mut shutdown: Shutdown,
    ) {
        let mut ticker = self.liveness.ticker();
        let mut plans_open = true;
        tracing::info!("dispatcher started");

        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    tracing::info!("dispatcher stopping");
                    break;
                }
                plan = plans.recv(), if plans_open => match plan {
                    Some(plan) => self.install_plan(plan).await,
                    None => plans_open = false,
                },
                Some(update) = events.sec_info_updates.recv() => self.handle_sec_info_update(&update),
                Some(status) = events.server_status.recv() => self.handle_status(status).await,
                _ = ticker.tick() => {
                    self.handle_liveness_tick().await;
                }
                Some(trades) = events.all_trades.recv() => self.handle_trades(trades).await,
                Some(quotes) = events.quotes.recv() => self.handle_quotes(quotes).await,
                Some(info) = events.sec_info.recv() => self.handle_security_info(info).await,
                Some(response) = events.responses.recv() => self.handle_response(response).await,
            }
        }
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    pub fn handle_sec_info_update(&self, update: &SecInfoUpdate) {
        tracing::info!(
            sec_id = update.sec_id,
            sec_code = %update.sec_code,
            min_price = update.min_price,
            max_price = update.max_price,
            "security info update"
        );
    }

    pub async fn handle_status(&mut self, status: ServerStatus) {
        self.liveness.observe(status.connected);
        self.status_tx.send_replace(status.connected);

        match status.connected {
            ConnectionState::Connected => {
                tracing::info!("connector is connected");
                self.send_all(self.plan.commands()).await;
            }
            ConnectionState::Error => {
                tracing::warn!(
                    message = status.message.as_deref().unwrap_or(""),
                    "connector reports an error"
                );
            }
            ConnectionState::Disconnected => {
                tracing::info!(recover = status.recover, "connector is disconnected");
            }
        }
    }

    pub async fn handle_liveness_tick(&mut self) -> LivenessCheck {
        self.liveness.on_tick(self.session.as_ref()).await
    }

    pub async fn handle_trades(&self, trades: AllTrades) {
        for trade in &trades.items {
            if let Err(e) = self.writer.insert_trade(trade).await {
                tracing::error!(
                    sec_code = %trade.sec_code,
                    trade_no = trade.trade_no,
                    "trade not written: {e}"
                );
            }
        }
    }

    /// Write every level with the delivery's reference time, or the
    /// receipt time when the bridge sent none.
    pub async fn handle_quotes(&self, quotes: Quotes) {
        let time = if quotes.time.trim().is_empty() {
            Local::now().naive_local()
        } else {
            match parse_source_datetime("time", &quotes.time) {
                Ok(time) => time,
                Err(e) => {
                    tracing::error!(levels = quotes.items.len(), "quotes not written: {e}");
                    return;
                }
            }
        };
        for quote in &quotes.items {
            if let Err(e) = self.writer.insert_quote(quote, time).await {
                tracing::error!(sec_code = %quote.sec_code, "quote not written: {e}");
            }
        }
    }

    pub async fn handle_security_info(&self, info: SecurityInfo) {
        if let Err(e) = self.writer.insert_security_info(&info).await {
            tracing::error!(sec_code = %info.sec_code, "security info not written: {e}");
        }
    }

    pub async fn handle_response(&mut self, response: Response) {
        match response {
            Response::UnitedPortfolio(portfolio) => tracing::info!(
                union = %portfolio.union,
                equity = portfolio.equity,
                open_equity = portfolio.open_equity,
                unrealized_pnl = portfolio.unrealized_pnl,
                "united portfolio"
            ),
            Response::UnitedEquity(equity) => {
                tracing::info!(union = %equity.union, equity = equity.equity, "united equity")
            }
            Response::Positions(positions) => self.merge_positions(positions).await,
            Response::Candles(candles) => self.flush_history(candles).await,
            Response::Quotations(ticks) => self.aggregate_quotations(&ticks).await,
            // Reference data is cached by the session client.
            other @ (Response::Securities(_)
            | Response::CandleKinds(_)
            | Response::Markets(_)
            | Response::Boards(_)) => tracing::debug!(kind = other.kind(), "response ignored"),
        }
    }

    /// Adopt the bootstrapper's plan and put it in force if already online.
    pub async fn install_plan(&mut self, plan: SubscriptionPlan) {
        tracing::info!(
            quotations = plan.quotations.len(),
            all_trades = plan.all_trades.len(),
            security_info = plan.security_info.len(),
            "subscription plan received"
        );
        self.plan.merge(plan);
        if self.liveness.last_status().is_connected() {
            self.send_all(self.plan.commands()).await;
        }
    }

    // ========================================================================
    // Response handlers
    // ========================================================================

    async fn merge_positions(&mut self, update: Positions) {
        let held: Vec<i64> = if self.all_trades_from_positions {
            update.sec_positions.iter().map(|p| p.sec_id).collect()
        } else {
            Vec::new()
        };

        let replaced = self.positions.merge(update);
        tracing::info!(replaced, "positions updated");
        tracing::debug!(positions = ?self.positions.snapshot(), "position snapshot");

        let added: Vec<i64> = held
            .into_iter()
            .filter(|&sec_id| self.plan.add_all_trades(sec_id))
            .collect();
        if added.is_empty() {
            return;
        }
        tracing::info!(?added, "all-trades targets added from positions");
        if self.liveness.last_status().is_connected() {
            self.send(Command::Subscribe {
                quotations: Vec::new(),
                all_trades: added,
            })
            .await;
        }
    }

    async fn flush_history(&self, candles: Candles) {
        match self.writer.write_history(&candles).await {
            Ok(rows) => tracing::debug!(
                sec_code = %candles.sec_code,
                period = candles.period,
                received = candles.items.len(),
                rows,
                "history batch stored"
            ),
            Err(e) => tracing::error!(sec_code = %candles.sec_code, "history batch failed: {e}"),
        }
        // Nobody listens once the backfill is over.
        let _ = self.progress_tx.send(CandleProgress {
            sec_id: candles.sec_id,
            period: candles.period,
            count: candles.items.len(),
        });
    }

    async fn aggregate_quotations(&mut self, ticks: &[Quotation]) {
        let closed = self.aggregator.apply_all(ticks, (self.today)());
        if closed.is_empty() {
            return;
        }
        if let Err(e) = self.writer.write_candles(closed).await {
            tracing::error!("tick candle batch failed: {e}");
        }
    }

    async fn send(&self, command: Command) {
        let name = command.name();
        if let Err(e) = self.session.send_command(command).await {
            tracing::error!(command = name, "command failed: {e}");
        }
    }

    async fn send_all(&self, commands: Vec<Command>) {
        for command in commands {
            self.send(command).await;
        }
    }
}
