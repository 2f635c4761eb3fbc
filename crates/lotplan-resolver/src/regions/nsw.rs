//! NSW identifiers: `lot/section/plan`, `lot//plan` or `lot/plan`, plus the
//! spelled-out `Lot 3 Sec 2 DP753311` and spaced `3 DP753311` forms
//!
//! Queried against the NSW Cadastre lot layer by lot number, section and the
//! numeric part of the plan label.

use std::sync::LazyLock;

use lotplan_core::RegionTag;
use regex::Regex;

use super::{sql_literal, ParcelQuery};

pub const OUT_FIELDS: &str = "lotnumber,sectionnumber,planlabel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NswLotId {
    pub lot: String,
    /// `None` when the lot is not in a section
    pub section: Option<String>,
    /// Digits of the plan label, leading zeros removed
    pub plan_number: String,
}

/// `Lot 3 Sec 2 DP753311`, `lot 3 section A 753311`, `Lot 3 DP753311`
static VERBOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*lot\s*(?P<lot>\d+)\s*(?:sec(?:tion)?\s*(?P<section>\w+))?\s*(?P<prefix>[A-Za-z]{1,3})?\s*(?P<number>\d{1,7})\s*$",
    )
    .unwrap()
});

/// `3 DP753311`; the space keeps `1RP912949` a QLD-only identifier
static SPACED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<lot>\d+)\s+(?P<prefix>[A-Za-z]{1,3})\s*(?P<number>\d{1,7})\s*$").unwrap()
});

/// Parse NSW input. Slash forms need a lot and a plan containing digits.
pub fn parse(input: &str) -> Option<NswLotId> {
    if input.contains('/') {
        return parse_slashed(input);
    }
    parse_verbose(input).or_else(|| parse_spaced(input))
}

fn parse_slashed(input: &str) -> Option<NswLotId> {
    let parts: Vec<&str> = input.split('/').map(str::trim).collect();
    let (lot, section, plan) = match parts.as_slice() {
        [lot, section, plan] => (*lot, *section, *plan),
        [lot, plan] => (*lot, "", *plan),
        _ => return None,
    };

    let digits: String = plan.chars().filter(char::is_ascii_digit).collect();
    if lot.is_empty() {
        return None;
    }

    Some(NswLotId {
        lot: lot.to_string(),
        section: (!section.is_empty()).then(|| section.to_string()),
        plan_number: plan_number(&digits)?,
    })
}

fn parse_verbose(input: &str) -> Option<NswLotId> {
    let caps = VERBOSE_RE.captures(input)?;
    Some(NswLotId {
        lot: caps["lot"].to_string(),
        section: caps.name("section").map(|m| m.as_str().to_uppercase()),
        plan_number: plan_number(&caps["number"])?,
    })
}

fn parse_spaced(input: &str) -> Option<NswLotId> {
    let caps = SPACED_RE.captures(input)?;
    Some(NswLotId {
        lot: caps["lot"].to_string(),
        section: None,
        plan_number: plan_number(&caps["number"])?,
    })
}

/// Plan digits with leading zeros removed; `None` when there are no digits
fn plan_number(digits: &str) -> Option<String> {
    if digits.is_empty() {
        return None;
    }
    Some(match digits.trim_start_matches('0') {
        "" => "0".to_string(),
        trimmed => trimmed.to_string(),
    })
}

impl NswLotId {
    pub fn where_clause(&self) -> String {
        let section = match &self.section {
            Some(section) => format!("sectionnumber={}", sql_literal(section)),
            None => "(sectionnumber IS NULL OR sectionnumber = '')".to_string(),
        };
        format!(
            "lotnumber={} AND {} AND plannumber={}",
            sql_literal(&self.lot),
            section,
            self.plan_number
        )
    }

    pub fn to_query(&self) -> ParcelQuery {
        ParcelQuery {
            region: RegionTag::Nsw,
            where_clause: self.where_clause(),
            out_fields: OUT_FIELDS,
        }
    }
}
