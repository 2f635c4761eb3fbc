//! QLD identifiers: lot number immediately followed by the plan, e.g. `3SP181800`
//!
//! Spaces are ignored and the input is upper-cased, so `3 sp 181800` works too.
//! Also accepted: `Lot 3 on Survey Plan 181800` and `3 181800`, both of which
//! default the plan prefix to `SP`.

use std::sync::LazyLock;

use lotplan_core::RegionTag;
use regex::Regex;

use super::{sql_literal, ParcelQuery};

pub const OUT_FIELDS: &str = "lot,plan,lotplan,locality";

/// Plan prefix assumed when the input only gives the plan number
pub const DEFAULT_PLAN_PREFIX: &str = "SP";

/// Lot digits, then a plan starting with a letter
static LOTPLAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)([A-Z].+)$").unwrap());

/// `Lot 3 on Survey Plan 181800`, `lot 3 on registered plan RP912949`, `Lot 3 SP181800`
static VERBOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*lot\s*(?P<lot>\d+)\s*(?:on\s*(?:registered|survey)\s*plan\s*)?(?P<prefix>[A-Za-z]{1,4})?\s*(?P<number>\d{1,7})\s*$",
    )
    .unwrap()
});

/// `3 181800`
static BARE_NUMBERS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?P<lot>\d+)\s+(?P<number>\d{1,7})\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QldLotPlan {
    pub lot: String,
    pub plan: String,
}

pub fn parse(input: &str) -> Option<QldLotPlan> {
    parse_compact(input)
        .or_else(|| parse_verbose(input))
        .or_else(|| parse_bare_numbers(input))
}

fn parse_compact(input: &str) -> Option<QldLotPlan> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let caps = LOTPLAN_RE.captures(&compact)?;
    Some(QldLotPlan {
        lot: caps[1].to_string(),
        plan: caps[2].to_string(),
    })
}

fn parse_verbose(input: &str) -> Option<QldLotPlan> {
    let caps = VERBOSE_RE.captures(input)?;
    let prefix = caps
        .name("prefix")
        .map_or(DEFAULT_PLAN_PREFIX.to_string(), |m| m.as_str().to_uppercase());
    Some(QldLotPlan {
        lot: caps["lot"].to_string(),
        plan: format!("{}{}", prefix, &caps["number"]),
    })
}

fn parse_bare_numbers(input: &str) -> Option<QldLotPlan> {
    let caps = BARE_NUMBERS_RE.captures(input)?;
    Some(QldLotPlan {
        lot: caps["lot"].to_string(),
        plan: format!("{}{}", DEFAULT_PLAN_PREFIX, &caps["number"]),
    })
}

impl QldLotPlan {
    pub fn lotplan(&self) -> String {
        format!("{}{}", self.lot, self.plan)
    }

    pub fn where_clause(&self) -> String {
        format!(
            "lot={} AND plan={}",
            sql_literal(&self.lot),
            sql_literal(&self.plan)
        )
    }

    pub fn to_query(&self) -> ParcelQuery {
        ParcelQuery {
            region: RegionTag::Qld,
            where_clause: self.where_clause(),
            out_fields: OUT_FIELDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenated_lotplan() {
        let id = parse("1RP912949").unwrap();
        assert_eq!(id.lot, "1");
        assert_eq!(id.plan, "RP912949");
        assert_eq!(id.where_clause(), "lot='1' AND plan='RP912949'");
    }

    #[test]
    fn test_spaces_and_case_are_normalized() {
        let id = parse(" 3 sp 181800 ").unwrap();
        assert_eq!(id.lotplan(), "3SP181800");
    }

    #[test]
    fn test_verbose_survey_plan_defaults_to_sp() {
        let id = parse("Lot 3 on Survey Plan 181800").unwrap();
        assert_eq!(id.lot, "3");
        assert_eq!(id.plan, "SP181800");
    }

    #[test]
    fn test_verbose_with_prefix() {
        let id = parse("lot 1 on registered plan rp912949").unwrap();
        assert_eq!(id.lotplan(), "1RP912949");
    }

    #[test]
    fn test_bare_numbers_default_to_sp() {
        let id = parse("3 181800").unwrap();
        assert_eq!(id.where_clause(), "lot='3' AND plan='SP181800'");
    }

    #[test]
    fn test_rejects_other_grammars() {
        assert_eq!(parse("3//SP181800"), None);
        assert_eq!(parse("SP181800"), None);
        assert_eq!(parse("3"), None);
        assert_eq!(parse("D10000A1"), None);
    }
}
