//! Per-jurisdiction input grammars
//!
//! Each state writes lot/plan identifiers differently. A query is offered to
//! every jurisdiction in `route` order and produces one `ParcelQuery` for each
//! grammar it matches; an identifier that reads as both NSW and QLD is looked
//! up in both.

pub mod nsw;
pub mod qld;
pub mod sa;
pub mod vic;

use lotplan_core::RegionTag;

/// One ArcGIS layer query derived from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelQuery {
    pub region: RegionTag,
    pub where_clause: String,
    pub out_fields: &'static str,
}

/// Every jurisdiction query `input` parses as, NSW first
pub fn route(input: &str) -> Vec<ParcelQuery> {
    let input = input.trim();
    if input.is_empty() {
        return Vec::new();
    }

    [
        nsw::parse(input).map(|id| id.to_query()),
        qld::parse(input).map(|id| id.to_query()),
        sa::parse(input).map(|id| id.to_query()),
        vic::parse(input).map(|id| id.to_query()),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// SQL string literal with embedded quotes doubled
pub(crate) fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions(input: &str) -> Vec<RegionTag> {
        route(input).into_iter().map(|q| q.region).collect()
    }

    #[test]
    fn test_route_by_grammar() {
        assert_eq!(regions("3//DP753311"), vec![RegionTag::Nsw]);
        assert_eq!(regions("1RP912949"), vec![RegionTag::Qld]);
        assert_eq!(regions("D10000A1"), vec![RegionTag::Sa]);
        assert_eq!(regions("PS601720"), vec![RegionTag::Vic]);
    }

    #[test]
    fn test_spelled_out_and_spaced_forms() {
        assert_eq!(regions("Lot 3 on Survey Plan 181800"), vec![RegionTag::Qld]);
        assert_eq!(regions("3 181800"), vec![RegionTag::Qld]);
        assert_eq!(regions("Lot 3 Sec 2 DP753311"), vec![RegionTag::Nsw]);
    }

    #[test]
    fn test_ambiguous_input_goes_to_every_match() {
        assert_eq!(regions("24PS601720"), vec![RegionTag::Qld, RegionTag::Vic]);
        assert_eq!(regions("3 DP753311"), vec![RegionTag::Nsw, RegionTag::Qld]);
    }

    #[test]
    fn test_unroutable_input() {
        assert!(route("").is_empty());
        assert!(route("hello world").is_empty());
        assert!(route("12345").is_empty());
    }

    #[test]
    fn test_sql_literal_escapes_quotes() {
        assert_eq!(sql_literal("O'Brien"), "'O''Brien'");
    }
}
