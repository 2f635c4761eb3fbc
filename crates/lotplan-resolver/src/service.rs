//! Batch search: route every query, fan out to the upstream layers, merge
//!
//! Output order is query order, then jurisdiction order within a query
//! (NSW, QLD, SA, VIC), then upstream feature order. A failed upstream call
//! is logged and contributes nothing.

use std::sync::Arc;

use futures::future::join_all;
use lotplan_core::{RawFeature, RegionTag, SearchResponse};

use crate::arcgis::ParcelSource;
use crate::regions::{self, ParcelQuery};

#[derive(Clone)]
pub struct SearchService {
    source: Arc<dyn ParcelSource>,
}

impl SearchService {
    pub fn new(source: Arc<dyn ParcelSource>) -> Self {
        Self { source }
    }

    pub async fn search(&self, queries: &[String]) -> SearchResponse {
        let plan: Vec<(usize, ParcelQuery)> = queries
            .iter()
            .enumerate()
            .flat_map(|(index, input)| {
                let routed = regions::route(input);
                if routed.is_empty() {
                    tracing::debug!(query = %input, "No jurisdiction grammar matched");
                }
                routed.into_iter().map(move |q| (index, q))
            })
            .collect();

        tracing::info!(
            queries = queries.len(),
            upstream_calls = plan.len(),
            "Resolving lot/plan batch"
        );

        let results = join_all(plan.iter().map(|(_, query)| self.source.query(query))).await;

        let mut features: Vec<RawFeature> = Vec::new();
        let mut regions: Vec<RegionTag> = Vec::new();
        for ((index, query), result) in plan.iter().zip(results) {
            match result {
                Ok(found) => {
                    regions.extend(std::iter::repeat(query.region).take(found.len()));
                    features.extend(found);
                }
                Err(e) => {
                    tracing::warn!(
                        query = %queries[*index],
                        region = %query.region,
                        error = %e,
                        "Upstream query failed"
                    );
                }
            }
        }

        tracing::info!(features = features.len(), "Batch resolved");
        SearchResponse {
            features,
            regions: Some(regions),
        }
    }
}
