//! Batch dispatch to the cadastral resolver
//!
//! The whole token batch goes out as one `{ queries: [...] }` request. Every
//! dispatch carries a `DispatchTicket` drawn from a `DispatchSequence` that is
//! shared with the `ResultStore`, so a response that comes back after a newer
//! search was issued can be recognised and dropped.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::DispatchError;
use crate::input::QueryToken;
use crate::types::{RawFeature, RegionTag, SearchRequest, SearchResponse};

// =============================================================================
// SEQUENCING
// =============================================================================

/// Sequence number of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DispatchTicket(u64);

impl DispatchTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DispatchTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic ticket counter
#[derive(Debug, Default)]
pub struct DispatchSequence {
    latest: AtomicU64,
}

impl DispatchSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ticket. The first ticket is #1.
    pub fn issue(&self) -> DispatchTicket {
        DispatchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Most recently issued ticket, `None` before the first dispatch
    pub fn latest(&self) -> Option<DispatchTicket> {
        match self.latest.load(Ordering::SeqCst) {
            0 => None,
            n => Some(DispatchTicket(n)),
        }
    }

    pub fn is_current(&self, ticket: DispatchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

// =============================================================================
// RESOLVER SEAM
// =============================================================================

/// Anything that can answer a batch lot/plan search
#[async_trait]
pub trait CadastreResolver: Send + Sync {
    async fn resolve(&self, request: &SearchRequest) -> Result<SearchResponse, DispatchError>;
}

/// Default per-request timeout for the HTTP resolver
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolver reached over HTTP (`POST <endpoint>` with a JSON body)
#[derive(Clone)]
pub struct HttpResolver {
    client: Client,
    endpoint: String,
}

impl HttpResolver {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, DispatchError> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CadastreResolver for HttpResolver {
    async fn resolve(&self, request: &SearchRequest) -> Result<SearchResponse, DispatchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Status { status, body });
        }

        let text = response.text().await?;
        tracing::debug!(
            bytes = text.len(),
            "Resolver response: {}",
            text.chars().take(500).collect::<String>()
        );

        Ok(serde_json::from_str(&text)?)
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

/// Features of one response, each paired with the region it was tagged with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaggedFeatures {
    pub features: Vec<RawFeature>,
    pub regions: Vec<RegionTag>,
}

impl TaggedFeatures {
    /// Align `regions` with `features`. Absent tags mean every feature is `OTHER`.
    pub fn from_response(response: SearchResponse) -> Result<Self, DispatchError> {
        let SearchResponse { features, regions } = response;
        let regions = match regions {
            Some(regions) if regions.len() == features.len() => regions,
            Some(regions) => {
                return Err(DispatchError::malformed(format!(
                    "{} region tags for {} features",
                    regions.len(),
                    features.len()
                )))
            }
            None => vec![RegionTag::Other; features.len()],
        };
        Ok(Self { features, regions })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&RawFeature, RegionTag)> {
        self.features.iter().zip(self.regions.iter().copied())
    }
}

/// Result of one dispatch, tagged with its ticket
#[derive(Debug)]
pub struct Dispatch {
    pub ticket: DispatchTicket,
    pub result: Result<TaggedFeatures, DispatchError>,
}

/// Sends token batches to a resolver, one round trip per search
pub struct QueryDispatcher {
    resolver: Arc<dyn CadastreResolver>,
    sequence: Arc<DispatchSequence>,
}

impl QueryDispatcher {
    pub fn new(resolver: Arc<dyn CadastreResolver>, sequence: Arc<DispatchSequence>) -> Self {
        Self { resolver, sequence }
    }

    pub fn sequence(&self) -> &Arc<DispatchSequence> {
        &self.sequence
    }

    /// Issue a ticket and send the batch. No retries; a failure yields no features.
    pub async fn dispatch(&self, tokens: &[QueryToken]) -> Dispatch {
        let ticket = self.sequence.issue();
        let request = SearchRequest {
            queries: tokens.iter().map(|t| t.as_str().to_string()).collect(),
        };

        tracing::info!(%ticket, tokens = request.queries.len(), "Dispatching lot/plan search");

        let result = match self.resolver.resolve(&request).await {
            Ok(response) => TaggedFeatures::from_response(response),
            Err(e) => Err(e),
        };

        match &result {
            Ok(tagged) => tracing::info!(%ticket, features = tagged.len(), "Resolver answered"),
            Err(e) => tracing::warn!(%ticket, error = %e, "Resolver dispatch failed"),
        }

        Dispatch { ticket, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Properties;
    use std::sync::Mutex;

    struct RecordingResolver {
        requests: Mutex<Vec<SearchRequest>>,
        response: fn() -> Result<SearchResponse, DispatchError>,
    }

    #[async_trait]
    impl CadastreResolver for RecordingResolver {
        async fn resolve(
            &self,
            request: &SearchRequest,
        ) -> Result<SearchResponse, DispatchError> {
            self.requests.lock().unwrap().push(request.clone());
            (self.response)()
        }
    }

    fn two_features() -> Vec<RawFeature> {
        vec![
            RawFeature::new(None, Properties::new()),
            RawFeature::new(None, Properties::new()),
        ]
    }

    #[test]
    fn test_sequence_issues_increasing_tickets() {
        let sequence = DispatchSequence::new();
        assert_eq!(sequence.latest(), None);

        let first = sequence.issue();
        let second = sequence.issue();

        assert_eq!(first.value(), 1);
        assert_eq!(second.value(), 2);
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
        assert_eq!(sequence.latest(), Some(second));
    }

    #[test]
    fn test_missing_regions_default_to_other() {
        let tagged = TaggedFeatures::from_response(SearchResponse {
            features: two_features(),
            regions: None,
        })
        .unwrap();
        assert_eq!(tagged.regions, vec![RegionTag::Other, RegionTag::Other]);
    }

    #[test]
    fn test_misaligned_regions_are_malformed() {
        let result = TaggedFeatures::from_response(SearchResponse {
            features: two_features(),
            regions: Some(vec![RegionTag::Qld]),
        });
        assert!(matches!(result, Err(DispatchError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_dispatch_sends_one_batch_request() {
        let resolver = Arc::new(RecordingResolver {
            requests: Mutex::new(Vec::new()),
            response: || {
                Ok(SearchResponse {
                    features: two_features(),
                    regions: Some(vec![RegionTag::Qld, RegionTag::Nsw]),
                })
            },
        });
        let dispatcher = QueryDispatcher::new(resolver.clone(), Arc::new(DispatchSequence::new()));
        let tokens = crate::input::parse_queries("1RP912949\n3//DP753311\n1RP912949");

        let dispatch = dispatcher.dispatch(&tokens).await;

        let requests = resolver.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].queries,
            vec!["1RP912949", "3//DP753311", "1RP912949"]
        );
        assert_eq!(dispatch.ticket.value(), 1);
        let tagged = dispatch.result.unwrap();
        assert_eq!(tagged.regions, vec![RegionTag::Qld, RegionTag::Nsw]);
    }

    #[tokio::test]
    async fn test_dispatch_failure_yields_no_features() {
        let resolver = Arc::new(RecordingResolver {
            requests: Mutex::new(Vec::new()),
            response: || {
                Err(DispatchError::Status {
                    status: 502,
                    body: "bad gateway".to_string(),
                })
            },
        });
        let dispatcher = QueryDispatcher::new(resolver, Arc::new(DispatchSequence::new()));
        let tokens = crate::input::parse_queries("1RP912949");

        let dispatch = dispatcher.dispatch(&tokens).await;

        assert!(matches!(
            dispatch.result,
            Err(DispatchError::Status { status: 502, .. })
        ));
    }
}
