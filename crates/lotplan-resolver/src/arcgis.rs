//! ArcGIS REST client for the state cadastre layers
//!
//! Every jurisdiction publishes its parcels as an ArcGIS feature/map layer
//! with the same `query` operation, so one client serves all four. Features
//! come back as GeoJSON in WGS84.

use std::time::Duration;

use async_trait::async_trait;
use lotplan_core::{RawFeature, RegionTag};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::regions::ParcelQuery;

pub const QLD_URL: &str = "https://spatial-gis.information.qld.gov.au/arcgis/rest/services/PlanningCadastre/LandParcelPropertyFramework/MapServer/4/query";
pub const NSW_URL: &str =
    "https://maps.six.nsw.gov.au/arcgis/rest/services/public/NSW_Cadastre/MapServer/9/query";
pub const SA_URL: &str = "https://dpti.geohub.sa.gov.au/server/rest/services/Hosted/Reference_WFL1/FeatureServer/1/query";
pub const VIC_URL: &str = "https://services6.arcgis.com/GB33F62SbDxJjwEL/ArcGIS/rest/services/Vicmap_Parcel/FeatureServer/0/query";

/// WGS84
const OUT_SR: &str = "4326";

/// Layer query endpoint per jurisdiction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub qld: String,
    pub nsw: String,
    pub sa: String,
    pub vic: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            qld: QLD_URL.to_string(),
            nsw: NSW_URL.to_string(),
            sa: SA_URL.to_string(),
            vic: VIC_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Endpoint for `region`; `Other` has no layer
    pub fn for_region(&self, region: RegionTag) -> Option<&str> {
        match region {
            RegionTag::Qld => Some(self.qld.as_str()),
            RegionTag::Nsw => Some(self.nsw.as_str()),
            RegionTag::Sa => Some(self.sa.as_str()),
            RegionTag::Vic => Some(self.vic.as_str()),
            RegionTag::Other => None,
        }
    }
}

/// Source of parcel features for a single jurisdiction query
#[async_trait]
pub trait ParcelSource: Send + Sync {
    async fn query(&self, query: &ParcelQuery) -> Result<Vec<RawFeature>, UpstreamError>;
}

#[derive(Clone)]
pub struct ArcGisClient {
    client: Client,
    endpoints: Endpoints,
}

impl ArcGisClient {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

/// Body of a `query?f=geojson` response. Errors arrive with HTTP 200.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    features: Option<Vec<RawFeature>>,
    #[serde(default)]
    error: Option<Value>,
}

fn service_error(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

pub(crate) fn parse_query_response(body: &str) -> Result<Vec<RawFeature>, UpstreamError> {
    let response: QueryResponse = serde_json::from_str(body)?;
    if let Some(error) = response.error {
        return Err(UpstreamError::Service(service_error(&error)));
    }
    Ok(response.features.unwrap_or_default())
}

#[async_trait]
impl ParcelSource for ArcGisClient {
    async fn query(&self, query: &ParcelQuery) -> Result<Vec<RawFeature>, UpstreamError> {
        let Some(url) = self.endpoints.for_region(query.region) else {
            return Ok(Vec::new());
        };

        tracing::debug!(region = %query.region, clause = %query.where_clause, "ArcGIS query");

        let response = self
            .client
            .get(url)
            .query(&[
                ("where", query.where_clause.as_str()),
                ("outFields", query.out_fields),
                ("outSR", OUT_SR),
                ("f", "geojson"),
                ("returnGeometry", "true"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let features = parse_query_response(&body)?;
        tracing::debug!(region = %query.region, count = features.len(), "ArcGIS features");
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_per_region() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.for_region(RegionTag::Nsw), Some(NSW_URL));
        assert_eq!(endpoints.for_region(RegionTag::Vic), Some(VIC_URL));
        assert_eq!(endpoints.for_region(RegionTag::Other), None);
    }

    #[test]
    fn test_parse_features() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": null, "properties": {"lot": "1", "plan": "RP912949"}}
            ]
        }"#;
        let features = parse_query_response(body).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].properties["plan"], "RP912949");
    }

    #[test]
    fn test_missing_or_null_features_is_empty() {
        assert!(parse_query_response(r#"{"type": "FeatureCollection"}"#)
            .unwrap()
            .is_empty());
        assert!(parse_query_response(r#"{"features": null}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_service_error_body() {
        let body = r#"{"error": {"code": 400, "message": "Invalid query parameters"}}"#;
        match parse_query_response(body) {
            Err(UpstreamError::Service(message)) => assert_eq!(message, "Invalid query parameters"),
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body() {
        assert!(matches!(
            parse_query_response("<html>busy</html>"),
            Err(UpstreamError::Decode(_))
        ));
    }
}
