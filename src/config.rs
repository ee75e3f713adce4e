//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable so the exporter can run
//! from a container definition without arguments. [`Args`] is the raw
//! surface; [`ExportConfig`] is the cleaned value object the core reads.

use std::time::Duration;

use clap::Parser;
use transaq_session::{ConnectParams, Security};

use crate::store::ClickHouseConfig;

/// `EXPORT_ALL_TRADES` token that pulls instruments in from position updates.
pub const POSITIONS_TOKEN: &str = "positions";
/// `EXPORT_SEC_CODES` wildcard.
pub const ALL_CODES: &str = "ALL";

// ============================================================================
// Args
// ============================================================================

/// Transaq Export: market data and account events into ClickHouse.
#[derive(Parser, Debug, Clone)]
#[command(name = "transaq-export", version = "1.0.0")]
pub struct Args {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// ClickHouse HTTP endpoint
    #[arg(long, env = "CLICKHOUSE_URL", default_value = "http://127.0.0.1:8123")]
    pub clickhouse_url: String,

    #[arg(long, env = "CLICKHOUSE_USER")]
    pub clickhouse_user: Option<String>,

    #[arg(long, env = "CLICKHOUSE_PASSWORD", hide_env_values = true)]
    pub clickhouse_password: Option<String>,

    #[arg(long, env = "CLICKHOUSE_DATABASE")]
    pub clickhouse_database: Option<String>,

    /// Address of the connector bridge
    #[arg(long, env = "TC_BRIDGE_ADDR", default_value = "127.0.0.1:50051")]
    pub bridge_addr: String,

    #[arg(long, env = "TC_LOGIN", default_value = "")]
    pub login: String,

    #[arg(long, env = "TC_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Transaq server host
    #[arg(long, env = "TC_HOST", default_value = "tr1.finam.ru")]
    pub host: String,

    /// Transaq server port
    #[arg(long, env = "TC_PORT", default_value_t = 3900)]
    pub port: u16,

    /// Boards whose instruments are exported
    #[arg(
        long,
        env = "EXPORT_SEC_BOARDS",
        value_delimiter = ',',
        default_value = "TQBR,TQCB,FUT"
    )]
    pub sec_boards: Vec<String>,

    /// Security codes or short-name fragments to export, or ALL
    #[arg(long, env = "EXPORT_SEC_CODES", value_delimiter = ',')]
    pub sec_codes: Vec<String>,

    /// Bond short-name suffixes that trigger a security-info request
    #[arg(long, env = "EXPORT_SEC_INFO_NAMES", value_delimiter = ',')]
    pub sec_info_names: Vec<String>,

    /// Candle lengths in seconds to backfill; empty means all
    #[arg(long, env = "EXPORT_PERIOD_SECONDS", value_delimiter = ',')]
    pub period_seconds: Vec<i64>,

    /// Security codes with an all-trades feed; `positions` adds held ones
    #[arg(long, env = "EXPORT_ALL_TRADES", value_delimiter = ',')]
    pub all_trades: Vec<String>,

    /// History depth: 0 skips, N fetches the last N candles, negative fetches all
    #[arg(long, env = "EXPORT_CANDLE_COUNT", default_value_t = 0, allow_negative_numbers = true)]
    pub candle_count: i64,

    /// Candles requested per page in unbounded backfill
    #[arg(long, env = "EXPORT_HISTORY_PAGE", default_value_t = 1000)]
    pub history_page: u32,

    /// Seconds to wait for a history page before asking again
    #[arg(long, env = "EXPORT_HISTORY_WAIT_SECS", default_value_t = 2)]
    pub history_wait_secs: u64,
}

impl Args {
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            boards: clean(&self.sec_boards),
            codes: SecCodeFilter::new(clean(&self.sec_codes)),
            periods: self.period_seconds.iter().copied().filter(|p| *p > 0).collect(),
            sec_info_names: clean(&self.sec_info_names),
            all_trades: AllTradesFilter::parse(&self.all_trades),
            history: HistoryDepth::from_count(self.candle_count),
            history_page: self.history_page.max(1),
            history_wait: Duration::from_secs(self.history_wait_secs.max(1)),
        }
    }

    pub fn clickhouse_config(&self) -> ClickHouseConfig {
        ClickHouseConfig {
            url: self.clickhouse_url.clone(),
            user: self.clickhouse_user.clone(),
            password: self.clickhouse_password.clone(),
            database: self.clickhouse_database.clone(),
            ..ClickHouseConfig::default()
        }
    }

    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams {
            login: self.login.clone(),
            password: self.password.clone(),
            host: self.host.clone(),
            port: self.port,
            rq_delay: 100,
            session_timeout: 120,
            request_timeout: 20,
        }
    }
}

fn clean(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Export configuration
// ============================================================================

/// How much candle history to request per instrument and period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDepth {
    Skip,
    /// The most recent N candles, in one request.
    Last(u32),
    /// Page backwards until the server has nothing more.
    All,
}

impl HistoryDepth {
    pub fn from_count(count: i64) -> Self {
        match count {
            0 => HistoryDepth::Skip,
            n if n < 0 => HistoryDepth::All,
            n => HistoryDepth::Last(u32::try_from(n).unwrap_or(u32::MAX)),
        }
    }
}

/// Security-code filter: exact code, substring of the code, exact short
/// name, or the `ALL` wildcard. An empty filter matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecCodeFilter {
    patterns: Vec<String>,
}

impl SecCodeFilter {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, sec: &Security) -> bool {
        self.patterns.iter().any(|p| {
            p == ALL_CODES
                || *p == sec.sec_code
                || sec.sec_code.contains(p.as_str())
                || *p == sec.short_name
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllTradesFilter {
    pub codes: Vec<String>,
    /// Subscribe every instrument that shows up in a position update.
    pub from_positions: bool,
}

impl AllTradesFilter {
    pub fn parse(entries: &[String]) -> Self {
        let mut filter = Self::default();
        for entry in clean(entries) {
            if entry == POSITIONS_TOKEN {
                filter.from_positions = true;
            } else {
                filter.codes.push(entry);
            }
        }
        filter
    }

    pub fn contains(&self, sec_code: &str) -> bool {
        self.codes.iter().any(|c| c == sec_code)
    }
}

/// Values the ingestion core consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub boards: Vec<String>,
    pub codes: SecCodeFilter,
    /// Allowed candle lengths in seconds; empty allows all.
    pub periods: Vec<i64>,
    pub sec_info_names: Vec<String>,
    pub all_trades: AllTradesFilter,
    pub history: HistoryDepth,
    pub history_page: u32,
    pub history_wait: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            boards: vec!["TQBR".into(), "TQCB".into(), "FUT".into()],
            codes: SecCodeFilter::default(),
            periods: Vec::new(),
            sec_info_names: Vec::new(),
            all_trades: AllTradesFilter::default(),
            history: HistoryDepth::Skip,
            history_page: 1000,
            history_wait: Duration::from_secs(2),
        }
    }
}

impl ExportConfig {
    pub fn board_exported(&self, board: &str) -> bool {
        self.boards.iter().any(|b| b == board)
    }

    pub fn period_allowed(&self, seconds: i64) -> bool {
        self.periods.is_empty() || self.periods.contains(&seconds)
    }

    pub fn wants_security_info(&self, sec: &Security) -> bool {
        sec.is_bond()
            && self
                .sec_info_names
                .iter()
                .any(|suffix| sec.short_name.ends_with(suffix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sec(code: &str, short_name: &str) -> Security {
        Security {
            sec_code: code.into(),
            short_name: short_name.into(),
            ..Security::default()
        }
    }

    #[test]
    fn history_depth_from_signed_count() {
        assert_eq!(HistoryDepth::from_count(0), HistoryDepth::Skip);
        assert_eq!(HistoryDepth::from_count(5), HistoryDepth::Last(5));
        assert_eq!(HistoryDepth::from_count(-1), HistoryDepth::All);
        assert_eq!(HistoryDepth::from_count(-100), HistoryDepth::All);
    }

    #[test]
    fn code_filter_modes() {
        let filter = SecCodeFilter::new(vec!["SBER".into(), "Si".into(), "ОФЗ 26238".into()]);
        assert!(filter.matches(&sec("SBER", "Sberbank")));
        assert!(filter.matches(&sec("SBERP", "Sberbank-p")));
        assert!(filter.matches(&sec("SiH4", "Si-3.24")));
        assert!(filter.matches(&sec("SU26238RMFS4", "ОФЗ 26238")));
        assert!(!filter.matches(&sec("GAZP", "Gazprom")));

        // Short names match whole, never by fragment.
        let fragment = SecCodeFilter::new(vec!["ОФЗ".into()]);
        assert!(!fragment.matches(&sec("SU26238RMFS4", "ОФЗ 26238")));
        assert!(!fragment.matches(&sec("SU26240RMFS0", "ОФЗ 26240")));

        assert!(SecCodeFilter::new(vec!["ALL".into()]).matches(&sec("GAZP", "Gazprom")));
        assert!(!SecCodeFilter::default().matches(&sec("GAZP", "Gazprom")));
    }

    #[test]
    fn all_trades_positions_token() {
        let filter = AllTradesFilter::parse(&["SiH4".into(), " positions ".into(), "".into()]);
        assert!(filter.from_positions);
        assert_eq!(filter.codes, vec!["SiH4"]);
        assert!(filter.contains("SiH4"));
        assert!(!filter.contains("positions"));
    }

    #[test]
    fn args_from_command_line() {
        let args = Args::try_parse_from([
            "transaq-export",
            "--sec-boards",
            "TQBR,FUT",
            "--sec-codes",
            "SBER,GAZP",
            "--period-seconds",
            "60,3600",
            "--all-trades",
            "positions",
            "--candle-count=-1",
        ])
        .unwrap();
        let config = args.export_config();

        assert_eq!(config.boards, vec!["TQBR", "FUT"]);
        assert!(config.board_exported("FUT"));
        assert!(!config.board_exported("TQCB"));
        assert!(config.period_allowed(3600));
        assert!(!config.period_allowed(300));
        assert!(config.all_trades.from_positions);
        assert_eq!(config.history, HistoryDepth::All);
        assert_eq!(config.history_page, 1000);
    }

    #[test]
    fn empty_period_list_allows_every_period() {
        let config = ExportConfig::default();
        assert!(config.period_allowed(60));
        assert!(config.period_allowed(86400));
    }

    #[test]
    fn security_info_needs_a_bond_with_matching_suffix() {
        let config = ExportConfig {
            sec_info_names: vec!["ПД".into()],
            ..ExportConfig::default()
        };
        let mut bond = sec("SU26238RMFS4", "ОФЗ 26238 ПД");
        assert!(!config.wants_security_info(&bond));
        bond.sec_type = "BOND".into();
        assert!(config.wants_security_info(&bond));
        bond.short_name = "ОФЗ 26238".into();
        assert!(!config.wants_security_info(&bond));
    }
}
