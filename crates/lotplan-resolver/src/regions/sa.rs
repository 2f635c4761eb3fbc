//! SA identifiers: plan type + plan number, parcel type + parcel number
//!
//! e.g. `D10000A1`, `D 10000 A 1`, `D10000AL1` (optional `L` parcel subtype),
//! `H835100 B829`.

use std::sync::LazyLock;

use lotplan_core::RegionTag;
use regex::Regex;

use super::{sql_literal, ParcelQuery};

pub const OUT_FIELDS: &str = "*";

static SA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<plan_t>[A-Za-z])\s*(?P<plan>\d{1,9})\s*(?P<parcel_t>[A-Za-z])\s*(?:[Ll]\s*)?(?P<parcel>\d{1,10})\s*$",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaParcelId {
    pub plan_type: String,
    pub plan: String,
    pub parcel_type: String,
    pub parcel: String,
}

pub fn parse(input: &str) -> Option<SaParcelId> {
    let caps = SA_RE.captures(input)?;
    Some(SaParcelId {
        plan_type: caps["plan_t"].to_uppercase(),
        plan: caps["plan"].to_string(),
        parcel_type: caps["parcel_t"].to_uppercase(),
        parcel: caps["parcel"].to_string(),
    })
}

impl SaParcelId {
    pub fn where_clause(&self) -> String {
        format!(
            "plan_t={} AND plan={} AND parcel_t={} AND parcel={}",
            sql_literal(&self.plan_type),
            sql_literal(&self.plan),
            sql_literal(&self.parcel_type),
            sql_literal(&self.parcel)
        )
    }

    pub fn to_query(&self) -> ParcelQuery {
        ParcelQuery {
            region: RegionTag::Sa,
            where_clause: self.where_clause(),
            out_fields: OUT_FIELDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_and_spaced_forms() {
        let compact = parse("D10000A1").unwrap();
        let spaced = parse("d 10000 a 1").unwrap();
        assert_eq!(compact, spaced);
        assert_eq!(
            compact.where_clause(),
            "plan_t='D' AND plan='10000' AND parcel_t='A' AND parcel='1'"
        );
    }

    #[test]
    fn test_optional_l_subtype() {
        let id = parse("D10000AL1").unwrap();
        assert_eq!(id.parcel_type, "A");
        assert_eq!(id.parcel, "1");
    }

    #[test]
    fn test_hundred_plan() {
        let id = parse("H835100 B829").unwrap();
        assert_eq!(id.plan_type, "H");
        assert_eq!(id.plan, "835100");
        assert_eq!(id.parcel_type, "B");
        assert_eq!(id.parcel, "829");
    }

    #[test]
    fn test_rejects_other_grammars() {
        assert_eq!(parse("1RP912949"), None);
        assert_eq!(parse("PS601720"), None);
        assert_eq!(parse("3//DP753311"), None);
    }
}
