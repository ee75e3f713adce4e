//! Live subscription targets and backfill progress notifications.

use transaq_session::{Command, SubSecurity};

/// What the exporter subscribes to once the session is up.
///
/// Built by the bootstrapper, then owned by the dispatcher, which adds
/// all-trades targets as positions come in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPlan {
    pub quotations: Vec<SubSecurity>,
    pub all_trades: Vec<i64>,
    /// Instruments whose security info is requested on every connect.
    pub security_info: Vec<i64>,
}

impl SubscriptionPlan {
    pub fn add_quotation(&mut self, target: SubSecurity) -> bool {
        if self.quotations.contains(&target) {
            return false;
        }
        self.quotations.push(target);
        true
    }

    /// Returns `false` when `sec_id` is already subscribed.
    pub fn add_all_trades(&mut self, sec_id: i64) -> bool {
        if self.all_trades.contains(&sec_id) {
            return false;
        }
        self.all_trades.push(sec_id);
        true
    }

    pub fn add_security_info(&mut self, sec_id: i64) -> bool {
        if self.security_info.contains(&sec_id) {
            return false;
        }
        self.security_info.push(sec_id);
        true
    }

    /// Fold another plan into this one, keeping existing entries first.
    pub fn merge(&mut self, other: SubscriptionPlan) {
        for target in other.quotations {
            self.add_quotation(target);
        }
        for sec_id in other.all_trades {
            self.add_all_trades(sec_id);
        }
        for sec_id in other.security_info {
            self.add_security_info(sec_id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quotations.is_empty() && self.all_trades.is_empty() && self.security_info.is_empty()
    }

    /// Commands that put the whole plan in force on a fresh connection.
    pub fn commands(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(1 + self.security_info.len());
        if !self.quotations.is_empty() || !self.all_trades.is_empty() {
            commands.push(Command::Subscribe {
                quotations: self.quotations.clone(),
                all_trades: self.all_trades.clone(),
            });
        }
        commands.extend(
            self.security_info
                .iter()
                .map(|&sec_id| Command::GetSecuritiesInfo { sec_id }),
        );
        commands
    }
}

/// Published after every candle history batch is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandleProgress {
    pub sec_id: i64,
    /// Candle kind id.
    pub period: i64,
    /// Candles in the batch; zero means the history is exhausted.
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(sec_id: i64, code: &str) -> SubSecurity {
        SubSecurity {
            sec_id,
            board: "TQBR".into(),
            sec_code: code.into(),
        }
    }

    #[test]
    fn empty_plan_issues_nothing() {
        assert!(SubscriptionPlan::default().commands().is_empty());
    }

    #[test]
    fn commands_subscribe_then_request_info() {
        let mut plan = SubscriptionPlan::default();
        plan.add_quotation(target(1, "SBER"));
        plan.add_all_trades(7);
        plan.add_security_info(11);
        plan.add_security_info(12);

        let commands = plan.commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[0],
            Command::Subscribe {
                quotations: vec![target(1, "SBER")],
                all_trades: vec![7],
            }
        );
        assert_eq!(commands[2], Command::GetSecuritiesInfo { sec_id: 12 });
    }

    #[test]
    fn merge_deduplicates() {
        let mut plan = SubscriptionPlan::default();
        assert!(plan.add_all_trades(7));
        assert!(!plan.add_all_trades(7));

        let mut other = SubscriptionPlan::default();
        other.add_all_trades(7);
        other.add_all_trades(9);
        other.add_quotation(target(1, "SBER"));
        plan.merge(other);

        assert_eq!(plan.all_trades, vec![7, 9]);
        assert_eq!(plan.quotations.len(), 1);
    }
}
