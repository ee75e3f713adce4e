//! Instrument reference data: securities, markets, boards, candle kinds.

use serde::{Deserialize, Serialize};

// ============================================================================
// Security
// ============================================================================

/// One entry of the `securities` list sent after connect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Security {
    #[serde(rename = "secid")]
    pub sec_id: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "seccode")]
    pub sec_code: String,
    #[serde(rename = "instrclass", default)]
    pub instr_class: String,
    pub board: String,
    #[serde(default)]
    pub market: i64,
    #[serde(rename = "shortname", default)]
    pub short_name: String,
    #[serde(default)]
    pub decimals: i64,
    #[serde(rename = "minstep", default)]
    pub min_step: f64,
    #[serde(rename = "lotsize", default)]
    pub lot_size: i64,
    #[serde(rename = "point_cost", default)]
    pub point_cost: f64,
    #[serde(rename = "sectype", default)]
    pub sec_type: String,
    #[serde(rename = "quotestype", default)]
    pub quotes_type: i64,
}

impl Security {
    pub fn is_bond(&self) -> bool {
        self.sec_type == "BOND"
    }
}

// ============================================================================
// SecurityInfo
// ============================================================================

/// Extended bond/derivative reference record (`sec_info`).
///
/// Date fields are kept in the connector's `dd.mm.yyyy[ HH:MM:SS]` form and
/// may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityInfo {
    #[serde(rename = "secid")]
    pub sec_id: i64,
    #[serde(rename = "secname")]
    pub sec_name: String,
    #[serde(rename = "seccode")]
    pub sec_code: String,
    pub market: i64,
    pub pname: String,
    pub mat_date: String,
    pub clearing_price: f64,
    #[serde(rename = "minprice")]
    pub min_price: f64,
    #[serde(rename = "maxprice")]
    pub max_price: f64,
    pub buy_deposit: f64,
    pub sell_deposit: f64,
    pub bgo_c: f64,
    pub bgo_nc: f64,
    pub bgo_buy: f64,
    #[serde(rename = "accruedint")]
    pub accrued_int: f64,
    pub coupon_value: f64,
    pub coupon_date: String,
    pub coupon_period: i64,
    #[serde(rename = "facevalue")]
    pub face_value: f64,
    pub put_call: String,
    pub point_cost: f64,
    pub opt_type: String,
    pub lot_volume: i64,
    pub isin: String,
    #[serde(rename = "regnumber")]
    pub reg_number: String,
    #[serde(rename = "buybackprice")]
    pub buyback_price: f64,
    #[serde(rename = "buybackdate")]
    pub buyback_date: String,
    #[serde(rename = "currencyid")]
    pub currency_id: String,
}

/// Intraday change of derivative parameters (`sec_info_upd`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecInfoUpdate {
    #[serde(rename = "secid")]
    pub sec_id: i64,
    #[serde(rename = "seccode")]
    pub sec_code: String,
    pub market: i64,
    #[serde(rename = "minprice")]
    pub min_price: f64,
    #[serde(rename = "maxprice")]
    pub max_price: f64,
    pub buy_deposit: f64,
    pub sell_deposit: f64,
    pub point_cost: f64,
}

// ============================================================================
// Markets / Boards / Candle kinds
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub market: i64,
    #[serde(rename = "type", default)]
    pub kind: i64,
}

/// A candle granularity offered by the server.
///
/// `id` is what `gethistorydata` takes and what candle rows store as their
/// period; `period` is the length in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleKind {
    pub id: i64,
    pub period: i64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_uses_connector_attribute_names() {
        let json = r#"{
            "secid": 3, "active": true, "seccode": "SBER", "instrclass": "E",
            "board": "TQBR", "market": 1, "shortname": "Sberbank", "decimals": 2,
            "minstep": 0.01, "lotsize": 10, "point_cost": 1.0,
            "sectype": "SHARE", "quotestype": 1
        }"#;
        let sec: Security = serde_json::from_str(json).unwrap();
        assert_eq!(sec.sec_id, 3);
        assert_eq!(sec.sec_code, "SBER");
        assert_eq!(sec.short_name, "Sberbank");
        assert_eq!(sec.lot_size, 10);
        assert!(!sec.is_bond());
    }

    #[test]
    fn security_info_tolerates_missing_fields() {
        let info: SecurityInfo =
            serde_json::from_str(r#"{"secid": 7, "seccode": "SU26238RMFS4", "isin": "RU000A1038V6"}"#)
                .unwrap();
        assert_eq!(info.sec_id, 7);
        assert!(info.mat_date.is_empty());
        assert_eq!(info.isin, "RU000A1038V6");
    }
}
