//! Session liveness watchdog.
//!
//! The connector does not reconnect by itself. The dispatcher ticks this
//! monitor on a fixed period; every tick that finds the last reported status
//! other than connected asks the session to reconnect. Failures wait for the
//! next tick.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use transaq_session::{ConnectionState, Session};

pub const LIVENESS_PERIOD: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessCheck {
    Healthy,
    Reconnect,
}

#[derive(Debug)]
pub struct LivenessMonitor {
    period: Duration,
    last_status: ConnectionState,
    reconnects: u64,
}

impl LivenessMonitor {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_status: ConnectionState::Disconnected,
            reconnects: 0,
        }
    }

    pub fn observe(&mut self, status: ConnectionState) {
        self.last_status = status;
    }

    pub fn last_status(&self) -> ConnectionState {
        self.last_status
    }

    /// Reconnect attempts made so far.
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    pub fn check(&self) -> LivenessCheck {
        if self.last_status.is_connected() {
            LivenessCheck::Healthy
        } else {
            LivenessCheck::Reconnect
        }
    }

    /// Timer whose first tick comes one full period from now.
    pub fn ticker(&self) -> Interval {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    pub async fn on_tick<S: Session + ?Sized>(&mut self, session: &S) -> LivenessCheck {
        let check = self.check();
        if check == LivenessCheck::Reconnect {
            self.reconnects += 1;
            tracing::info!(
                status = %self.last_status,
                attempt = self.reconnects,
                "session not connected, reconnecting"
            );
            if let Err(e) = session.reconnect().await {
                tracing::error!("reconnect failed: {e}");
            }
        }
        check
    }
}

impl Default for LivenessMonitor {
    fn default() -> Self {
        Self::new(LIVENESS_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use transaq_session::{CandleKind, Command, Security, SessionError};

    #[derive(Default)]
    struct CountingSession {
        reconnects: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Session for CountingSession {
        async fn send_command(&self, _command: Command) -> transaq_session::errors::Result<()> {
            Ok(())
        }

        async fn reconnect(&self) -> transaq_session::errors::Result<()> {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SessionError::Connection("refused".into()));
            }
            Ok(())
        }

        async fn securities(&self) -> Vec<Security> {
            Vec::new()
        }

        async fn candle_kinds(&self) -> Vec<CandleKind> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn connected_tick_is_a_no_op() {
        let session = CountingSession::default();
        let mut monitor = LivenessMonitor::default();
        monitor.observe(ConnectionState::Connected);
        assert_eq!(monitor.on_tick(&session).await, LivenessCheck::Healthy);
        assert_eq!(session.reconnects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn each_unhealthy_tick_reconnects_once() {
        let session = CountingSession {
            fail: true,
            ..CountingSession::default()
        };
        let mut monitor = LivenessMonitor::default();
        for status in [ConnectionState::Disconnected, ConnectionState::Error] {
            monitor.observe(status);
            assert_eq!(monitor.on_tick(&session).await, LivenessCheck::Reconnect);
        }
        assert_eq!(session.reconnects.load(Ordering::SeqCst), 2);
        assert_eq!(monitor.reconnects(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_waits_a_full_period() {
        let monitor = LivenessMonitor::new(Duration::from_secs(300));
        let mut ticker = monitor.ticker();
        let started = Instant::now();
        ticker.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(300));
    }
}
