//! Account data: positions, limits and united portfolio snapshots.

use serde::{Deserialize, Serialize};

// ============================================================================
// Positions
// ============================================================================

/// Positions update. The connector sends only the sub-collections that
/// changed; the rest arrive empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Positions {
    pub united_limits: Vec<UnitedLimit>,
    pub sec_positions: Vec<SecPosition>,
    pub forts_money: Vec<FortsMoney>,
    pub money_position: Vec<MoneyPosition>,
    pub forts_position: Vec<FortsPosition>,
    pub forts_collaterals: Vec<FortsCollaterals>,
    pub spot_limit: Vec<SpotLimit>,
}

impl Positions {
    pub fn is_empty(&self) -> bool {
        self.united_limits.is_empty()
            && self.sec_positions.is_empty()
            && self.forts_money.is_empty()
            && self.money_position.is_empty()
            && self.forts_position.is_empty()
            && self.forts_collaterals.is_empty()
            && self.spot_limit.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitedLimit {
    pub union: String,
    pub open_equity: f64,
    pub equity: f64,
    pub requirements: f64,
    pub free: f64,
    pub vm: f64,
    pub finres: f64,
    pub go: f64,
}

/// Securities position on a stock market register.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecPosition {
    #[serde(rename = "secid")]
    pub sec_id: i64,
    pub market: i64,
    #[serde(rename = "seccode")]
    pub sec_code: String,
    pub register: String,
    pub client: String,
    pub union: String,
    #[serde(rename = "shortname")]
    pub short_name: String,
    #[serde(rename = "saldoin")]
    pub saldo_in: i64,
    pub bought: i64,
    pub sold: i64,
    pub saldo: i64,
    #[serde(rename = "ordbuy")]
    pub ord_buy: i64,
    #[serde(rename = "ordsell")]
    pub ord_sell: i64,
    pub amount: f64,
    pub equity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FortsMoney {
    pub client: String,
    pub union: String,
    pub markets: Vec<i64>,
    #[serde(rename = "shortname")]
    pub short_name: String,
    pub current: f64,
    pub blocked: f64,
    pub free: f64,
    #[serde(rename = "varmargin")]
    pub var_margin: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneyPosition {
    pub client: String,
    pub union: String,
    pub markets: Vec<i64>,
    pub register: String,
    pub asset: String,
    #[serde(rename = "shortname")]
    pub short_name: String,
    #[serde(rename = "saldoin")]
    pub saldo_in: f64,
    pub bought: f64,
    pub sold: f64,
    pub saldo: f64,
    #[serde(rename = "ordbuy")]
    pub ord_buy: f64,
    #[serde(rename = "ordbuycond")]
    pub ord_buy_cond: f64,
    pub commission: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FortsPosition {
    #[serde(rename = "secid")]
    pub sec_id: i64,
    pub client: String,
    pub union: String,
    pub markets: Vec<i64>,
    #[serde(rename = "seccode")]
    pub sec_code: String,
    #[serde(rename = "startnet")]
    pub start_net: i64,
    #[serde(rename = "openbuys")]
    pub open_buys: i64,
    #[serde(rename = "opensells")]
    pub open_sells: i64,
    #[serde(rename = "totalnet")]
    pub total_net: i64,
    #[serde(rename = "todaybuy")]
    pub today_buy: i64,
    #[serde(rename = "todaysell")]
    pub today_sell: i64,
    #[serde(rename = "optmargin")]
    pub opt_margin: f64,
    #[serde(rename = "varmargin")]
    pub var_margin: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FortsCollaterals {
    pub client: String,
    pub union: String,
    pub markets: Vec<i64>,
    pub current: f64,
    pub blocked: f64,
    pub free: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotLimit {
    pub client: String,
    pub union: String,
    pub markets: Vec<i64>,
    #[serde(rename = "shortname")]
    pub short_name: String,
    #[serde(rename = "buylimit")]
    pub buy_limit: f64,
    #[serde(rename = "buylimitused")]
    pub buy_limit_used: f64,
}

// ============================================================================
// United portfolio
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitedPortfolio {
    pub union: String,
    pub open_equity: f64,
    pub equity: f64,
    pub chrgoff_ir: f64,
    pub init_req: f64,
    pub chrgoff_mr: f64,
    pub maint_req: f64,
    pub reg_equity: f64,
    pub unrealized_pnl: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitedEquity {
    pub union: String,
    pub equity: f64,
}
