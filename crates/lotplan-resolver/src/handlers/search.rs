//! POST /search: resolve a batch of lot/plan identifiers

use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use lotplan_core::SearchResponse;
use serde::Deserialize;

use crate::error::AppError;
use crate::router::Limits;
use crate::service::SearchService;

/// `queries` may be a single string or a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Queries {
    One(String),
    Many(Vec<String>),
}

impl Default for Queries {
    fn default() -> Self {
        Queries::Many(Vec::new())
    }
}

impl Queries {
    /// Non-blank queries, trimmed
    pub fn into_vec(self) -> Vec<String> {
        let all = match self {
            Queries::One(query) => vec![query],
            Queries::Many(queries) => queries,
        };
        all.into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub queries: Queries,
}

pub async fn search(
    Extension(service): Extension<SearchService>,
    Extension(limits): Extension<Limits>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(body) = body?;
    let queries = body.queries.into_vec();

    if queries.len() > limits.max_queries {
        return Err(AppError::TooManyQueries {
            count: queries.len(),
            limit: limits.max_queries,
        });
    }

    Ok(Json(service.search(&queries).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Vec<String> {
        serde_json::from_str::<SearchBody>(body)
            .unwrap()
            .queries
            .into_vec()
    }

    #[test]
    fn test_single_string_and_list() {
        assert_eq!(parse(r#"{"queries": "1RP912949"}"#), vec!["1RP912949"]);
        assert_eq!(
            parse(r#"{"queries": ["1RP912949", " 3//DP753311 "]}"#),
            vec!["1RP912949", "3//DP753311"]
        );
    }

    #[test]
    fn test_missing_and_blank_queries() {
        assert!(parse("{}").is_empty());
        assert!(parse(r#"{"queries": ["", "   "]}"#).is_empty());
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        assert!(serde_json::from_str::<SearchBody>(r#"{"queries": 42}"#).is_err());
    }
}
