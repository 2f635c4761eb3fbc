//! VIC identifiers: `24PS601720`, `24 PS601720`, or a bare plan `PS601720`

use std::sync::LazyLock;

use lotplan_core::RegionTag;
use regex::Regex;

use super::{sql_literal, ParcelQuery};

pub const OUT_FIELDS: &str = "*";

static WITH_LOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<lot>\d{1,5})\s*(?P<plan>(?:PS|TP)[0-9A-Z]+)\s*$").unwrap()
});

static PLAN_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?P<plan>(?:PS|TP)[0-9A-Z]+)\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VicParcelId {
    /// `None` selects every lot on the plan
    pub lot: Option<String>,
    pub plan: String,
}

pub fn parse(input: &str) -> Option<VicParcelId> {
    let text = input.trim().to_uppercase().replace('/', " ");

    if let Some(caps) = WITH_LOT_RE.captures(&text) {
        let lot = match caps["lot"].trim_start_matches('0') {
            "" => "0".to_string(),
            lot => lot.to_string(),
        };
        return Some(VicParcelId {
            lot: Some(lot),
            plan: caps["plan"].to_string(),
        });
    }

    PLAN_ONLY_RE.captures(&text).map(|caps| VicParcelId {
        lot: None,
        plan: caps["plan"].to_string(),
    })
}

impl VicParcelId {
    pub fn where_clause(&self) -> String {
        match &self.lot {
            Some(lot) => format!(
                "parcel_lot_number={} AND parcel_plan_number={}",
                sql_literal(lot),
                sql_literal(&self.plan)
            ),
            None => format!("parcel_plan_number={}", sql_literal(&self.plan)),
        }
    }

    pub fn to_query(&self) -> ParcelQuery {
        ParcelQuery {
            region: RegionTag::Vic,
            where_clause: self.where_clause(),
            out_fields: OUT_FIELDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lot_and_plan() {
        let id = parse("24PS601720").unwrap();
        assert_eq!(id.lot.as_deref(), Some("24"));
        assert_eq!(id.plan, "PS601720");
        assert_eq!(
            id.where_clause(),
            "parcel_lot_number='24' AND parcel_plan_number='PS601720'"
        );
    }

    #[test]
    fn test_spacing_slashes_and_leading_zeros() {
        assert_eq!(parse("024 ps601720"), parse("24PS601720"));
        assert_eq!(parse("24/PS601720"), parse("24PS601720"));
        assert_eq!(parse("0TP17741").unwrap().lot.as_deref(), Some("0"));
    }

    #[test]
    fn test_plan_only() {
        let id = parse("TP17741").unwrap();
        assert_eq!(id.lot, None);
        assert_eq!(id.where_clause(), "parcel_plan_number='TP17741'");
    }

    #[test]
    fn test_rejects_other_plan_types() {
        assert_eq!(parse("1RP912949"), None);
        assert_eq!(parse("3//DP753311"), None);
    }
}
