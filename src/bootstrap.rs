//! One-shot startup pass over the instrument universe.
//!
//! Once the connector reports connected, the bootstrapper stores the
//! security reference data, backfills candle history for the exported
//! instruments and hands the live subscription plan to the dispatcher.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use transaq_session::{CandleKind, Command, ConnectionState, Security, Session, SubSecurity};

use crate::config::{ExportConfig, HistoryDepth};
use crate::error::IngestError;
use crate::shutdown::Shutdown;
use crate::store::Store;
use crate::subscription::{CandleProgress, SubscriptionPlan};
use crate::writer::BatchWriter;

/// Longest security code the store keeps.
pub const MAX_SEC_CODE_LEN: usize = 16;

/// History wanted for one instrument at one candle kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub sec_id: i64,
    pub sec_code: String,
    /// Candle kind id.
    pub period: i64,
}

/// Outcome of scanning the instrument universe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scan {
    pub plan: SubscriptionPlan,
    /// Securities worth storing as reference data.
    pub securities: Vec<Security>,
    pub history: Vec<HistoryRequest>,
}

/// Decide what to store, subscribe and backfill.
pub fn scan(config: &ExportConfig, securities: &[Security], kinds: &[CandleKind]) -> Scan {
    let mut out = Scan::default();

    for sec in securities {
        let board_exported = config.board_exported(&sec.board);

        if board_exported && config.all_trades.contains(&sec.sec_code) {
            out.plan.add_all_trades(sec.sec_id);
        }
        if config.wants_security_info(sec) {
            out.plan.add_security_info(sec.sec_id);
        }

        if sec.sec_id == 0 || !sec.active || sec.sec_code.len() > MAX_SEC_CODE_LEN {
            continue;
        }
        out.securities.push(sec.clone());

        if !board_exported || !config.codes.matches(sec) {
            continue;
        }
        out.plan.add_quotation(SubSecurity {
            sec_id: sec.sec_id,
            board: sec.board.clone(),
            sec_code: sec.sec_code.clone(),
        });

        if config.history == HistoryDepth::Skip {
            continue;
        }
        out.history.extend(
            kinds
                .iter()
                .filter(|kind| config.period_allowed(kind.period))
                .map(|kind| HistoryRequest {
                    sec_id: sec.sec_id,
                    sec_code: sec.sec_code.clone(),
                    period: kind.id,
                }),
        );
    }

    out
}

pub struct Bootstrapper<S, W> {
    session: Arc<S>,
    writer: BatchWriter<W>,
    config: Arc<ExportConfig>,
    status: watch::Receiver<ConnectionState>,
    progress: broadcast::Receiver<CandleProgress>,
    plans: mpsc::Sender<SubscriptionPlan>,
    shutdown: Shutdown,
}

impl<S: Session, W: Store> Bootstrapper<S, W> {
    pub fn new(
        session: Arc<S>,
        writer: BatchWriter<W>,
        config: Arc<ExportConfig>,
        status: watch::Receiver<ConnectionState>,
        progress: broadcast::Receiver<CandleProgress>,
        plans: mpsc::Sender<SubscriptionPlan>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            session,
            writer,
            config,
            status,
            progress,
            plans,
            shutdown,
        }
    }

    pub async fn run(mut self) -> Result<(), IngestError> {
        if self.config.codes.is_empty() {
            tracing::warn!("no security codes configured, nothing will be subscribed for quotations");
        }
        self.wait_connected().await?;

        let securities = self.session.securities().await;
        let kinds = self.session.candle_kinds().await;
        let scan = scan(&self.config, &securities, &kinds);
        tracing::info!(
            universe = securities.len(),
            stored = scan.securities.len(),
            quotations = scan.plan.quotations.len(),
            history_requests = scan.history.len(),
            "instrument universe scanned"
        );

        match self.writer.write_securities(&scan.securities).await {
            Ok(rows) => tracing::info!(rows, "securities stored"),
            Err(e) => tracing::error!("securities batch failed: {e}"),
        }

        for request in &scan.history {
            self.backfill(request).await?;
        }

        if scan.plan.is_empty() {
            tracing::warn!("no instrument matched the export filters");
        }
        self.plans
            .send(scan.plan)
            .await
            .map_err(|_| IngestError::DispatcherGone)?;
        tracing::info!("bootstrap complete");
        Ok(())
    }

    async fn wait_connected(&mut self) -> Result<(), IngestError> {
        tracing::info!("waiting for the connector to connect");
        tokio::select! {
            _ = self.shutdown.wait() => Err(IngestError::Shutdown),
            ready = self.status.wait_for(|s| s.is_connected()) => {
                ready.map(|_| ()).map_err(|_| IngestError::DispatcherGone)
            }
        }
    }

    /// Request history for one instrument and candle kind.
    pub async fn backfill(&mut self, request: &HistoryRequest) -> Result<(), IngestError> {
        match self.config.history {
            HistoryDepth::Skip => Ok(()),
            HistoryDepth::Last(count) => {
                self.request_history(request, i64::from(count), true).await;
                Ok(())
            }
            HistoryDepth::All => self.backfill_all(request).await,
        }
    }

    /// Page through the whole history until an empty batch arrives.
    async fn backfill_all(&mut self, request: &HistoryRequest) -> Result<(), IngestError> {
        let page = i64::from(self.config.history_page);
        let mut received = 0usize;
        loop {
            self.request_history(request, page, false).await;
            match self.next_batch(request).await? {
                Some(0) => {
                    tracing::info!(
                        sec_code = %request.sec_code,
                        period = request.period,
                        received,
                        "history backfill complete"
                    );
                    return Ok(());
                }
                Some(count) => received += count,
                None => tracing::debug!(
                    sec_code = %request.sec_code,
                    period = request.period,
                    "no history batch in time, asking again"
                ),
            }
        }
    }

    async fn request_history(&self, request: &HistoryRequest, count: i64, reset: bool) {
        let command = Command::GetHistoryData {
            sec_id: request.sec_id,
            period: request.period,
            count,
            reset,
        };
        if let Err(e) = self.session.send_command(command).await {
            tracing::error!(sec_code = %request.sec_code, "history request failed: {e}");
        }
    }

    /// Size of the next history batch for `request`, or `None` if nothing
    /// arrived within the wait bound.
    async fn next_batch(&mut self, request: &HistoryRequest) -> Result<Option<usize>, IngestError> {
        let deadline = tokio::time::sleep(self.config.history_wait);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = self.shutdown.wait() => return Err(IngestError::Shutdown),
                _ = &mut deadline => return Ok(None),
                progress = self.progress.recv() => match progress {
                    Ok(p) if p.sec_id == request.sec_id && p.period == request.period => {
                        return Ok(Some(p.count));
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "missed history progress notifications");
                    }
                    Err(RecvError::Closed) => return Err(IngestError::DispatcherGone),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AllTradesFilter, SecCodeFilter};

    fn sec(sec_id: i64, code: &str, board: &str) -> Security {
        Security {
            sec_id,
            active: true,
            sec_code: code.into(),
            board: board.into(),
            short_name: code.into(),
            ..Security::default()
        }
    }

    fn kinds() -> Vec<CandleKind> {
        vec![
            CandleKind {
                id: 1,
                period: 60,
                name: "1 minute".into(),
            },
            CandleKind {
                id: 4,
                period: 3600,
                name: "1 hour".into(),
            },
        ]
    }

    fn config() -> ExportConfig {
        ExportConfig {
            codes: SecCodeFilter::new(vec!["SBER".into(), "SiH4".into()]),
            history: HistoryDepth::Last(5),
            ..ExportConfig::default()
        }
    }

    #[test]
    fn exported_instruments_get_quotations_and_history() {
        let universe = vec![
            sec(1, "SBER", "TQBR"),
            sec(2, "GAZP", "TQBR"),
            sec(3, "SiH4", "FUT"),
            sec(4, "SBER", "SMAL"),
        ];
        let out = scan(&config(), &universe, &kinds());

        let quoted: Vec<i64> = out.plan.quotations.iter().map(|q| q.sec_id).collect();
        assert_eq!(quoted, vec![1, 3]);
        assert_eq!(out.securities.len(), 4);
        assert_eq!(out.history.len(), 4);
        assert_eq!(
            out.history[1],
            HistoryRequest {
                sec_id: 1,
                sec_code: "SBER".into(),
                period: 4,
            }
        );
    }

    #[test]
    fn period_allow_list_limits_history() {
        let config = ExportConfig {
            periods: vec![3600],
            ..config()
        };
        let out = scan(&config, &[sec(1, "SBER", "TQBR")], &kinds());
        assert_eq!(out.history.len(), 1);
        assert_eq!(out.history[0].period, 4);
    }

    #[test]
    fn skip_depth_plans_no_history() {
        let config = ExportConfig {
            history: HistoryDepth::Skip,
            ..config()
        };
        let out = scan(&config, &[sec(1, "SBER", "TQBR")], &kinds());
        assert!(out.history.is_empty());
        assert_eq!(out.plan.quotations.len(), 1);
    }

    #[test]
    fn unusable_securities_are_not_stored() {
        let mut inactive = sec(5, "LKOH", "TQBR");
        inactive.active = false;
        let universe = vec![
            sec(0, "ZERO", "TQBR"),
            inactive,
            sec(6, "ABCDEFGHIJKLMNOPQ", "TQBR"),
            sec(7, "ROSN", "TQBR"),
        ];
        let out = scan(&ExportConfig::default(), &universe, &kinds());
        let stored: Vec<i64> = out.securities.iter().map(|s| s.sec_id).collect();
        assert_eq!(stored, vec![7]);
        assert!(out.plan.quotations.is_empty());
    }

    #[test]
    fn all_trades_and_security_info_ignore_activity() {
        let mut bond = sec(9, "SU26238RMFS4", "TQOB");
        bond.sec_type = "BOND".into();
        bond.short_name = "ОФЗ 26238 ПД".into();
        bond.active = false;
        let mut future = sec(3, "SiH4", "FUT");
        future.active = false;

        let config = ExportConfig {
            sec_info_names: vec!["ПД".into()],
            all_trades: AllTradesFilter::parse(&["SiH4".into()]),
            ..ExportConfig::default()
        };
        let out = scan(&config, &[bond, future], &kinds());
        assert_eq!(out.plan.security_info, vec![9]);
        assert_eq!(out.plan.all_trades, vec![3]);
        assert!(out.securities.is_empty());
    }

    #[test]
    fn all_trades_needs_an_exported_board() {
        let config = ExportConfig {
            all_trades: AllTradesFilter::parse(&["SiH4".into()]),
            ..ExportConfig::default()
        };
        let out = scan(&config, &[sec(3, "SiH4", "SPBFUT")], &kinds());
        assert!(out.plan.all_trades.is_empty());
    }
}
