//! Search pipeline integration tests against in-memory resolvers.
//!
//! Covers the full cycle (parse → dispatch → normalize → store → export),
//! failure handling, and discarding of out-of-order responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lotplan_core::{
    CadastreResolver, DispatchError, KmlExporter, ParcelStyle, RawFeature, RegionTag,
    SearchOutcome, SearchPipeline, SearchRequest, SearchResponse, TableRow,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::sync::oneshot;

// ── Test resolvers ─────────────────────────────────────────────

/// Answers every request with the same canned response
struct FixedResolver {
    response: SearchResponse,
    requests: Mutex<Vec<SearchRequest>>,
}

impl FixedResolver {
    fn new(response: SearchResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CadastreResolver for FixedResolver {
    async fn resolve(&self, request: &SearchRequest) -> Result<SearchResponse, DispatchError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

type Reply = Result<SearchResponse, DispatchError>;

/// Holds each request until the test releases its reply
struct GatedResolver {
    gates: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
}

impl GatedResolver {
    fn new(count: usize) -> (Arc<Self>, Vec<oneshot::Sender<Reply>>) {
        let mut senders = Vec::new();
        let mut gates = VecDeque::new();
        for _ in 0..count {
            let (tx, rx) = oneshot::channel();
            senders.push(tx);
            gates.push_back(rx);
        }
        (
            Arc::new(Self {
                gates: Mutex::new(gates),
            }),
            senders,
        )
    }
}

#[async_trait]
impl CadastreResolver for GatedResolver {
    async fn resolve(&self, _: &SearchRequest) -> Result<SearchResponse, DispatchError> {
        let gate = self
            .gates
            .lock()
            .unwrap()
            .pop_front()
            .expect("more requests than gates");
        gate.await
            .unwrap_or_else(|_| Err(DispatchError::malformed("gate dropped")))
    }
}

// ── Fixtures ───────────────────────────────────────────────────

fn square(lon: f64, lat: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[lon, lat], [lon + 0.1, lat], [lon + 0.1, lat - 0.1], [lon, lat - 0.1], [lon, lat]]]
    })
}

fn feature(properties: Value, geometry: Option<Value>) -> RawFeature {
    let Value::Object(properties) = properties else {
        panic!("properties must be an object");
    };
    RawFeature::new(geometry, properties)
}

fn mixed_response() -> SearchResponse {
    SearchResponse {
        features: vec![
            feature(
                json!({"lot": "169-173, 203", "plan": "DP753311"}),
                Some(square(150.0, -28.0)),
            ),
            feature(
                json!({"lotnumber": "1", "planlabel": "RP912949"}),
                Some(square(151.0, -33.0)),
            ),
        ],
        regions: Some(vec![RegionTag::Qld, RegionTag::Other]),
    }
}

fn single_response(lot: &str) -> SearchResponse {
    SearchResponse {
        features: vec![feature(json!({"lot": lot, "plan": "SP1"}), None)],
        regions: Some(vec![RegionTag::Qld]),
    }
}

fn rows(pipeline: &SearchPipeline) -> Vec<TableRow> {
    pipeline.table_rows()
}

fn row(id: u32, lot: &str, plan: &str) -> TableRow {
    TableRow {
        id,
        lot: lot.to_string(),
        plan: plan.to_string(),
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_mixed_jurisdictions() {
    let resolver = FixedResolver::new(mixed_response());
    let pipeline = SearchPipeline::new(resolver.clone());

    let outcome = pipeline
        .search("169-173, 203//DP753311\n1RP912949")
        .await
        .unwrap();

    assert!(matches!(outcome, SearchOutcome::Completed { records: 2, .. }));
    assert_eq!(
        resolver.requests.lock().unwrap()[0].queries,
        vec!["169-173, 203//DP753311", "1RP912949"]
    );
    assert_eq!(
        rows(&pipeline),
        vec![row(1, "169-173, 203", "DP753311"), row(2, "1", "RP912949")]
    );

    let layer = pipeline.highlight(&ParcelStyle::default());
    assert_eq!(layer.feature_count(), 2);
    assert_eq!(layer.bounds, [[-33.1, 150.0], [-28.0, 151.1]]);

    let kml = pipeline.export_kml(&KmlExporter::default()).unwrap();
    assert_eq!(kml.matches("<Placemark>").count(), 2);
    assert!(kml.contains("<name>Lot 1 Plan RP912949</name>"));
}

#[tokio::test]
async fn response_without_regions_uses_fallback_schema() {
    let response = SearchResponse {
        features: vec![
            feature(json!({"lotnumber": "4", "planlabel": "DP1"}), None),
            feature(json!({"lot": "5", "plan": "SP2"}), None),
        ],
        regions: None,
    };
    let pipeline = SearchPipeline::new(FixedResolver::new(response));

    pipeline.search("4//DP1\n5SP2").await.unwrap();

    assert_eq!(rows(&pipeline), vec![row(1, "4", "DP1"), row(2, "", "")]);
}

#[tokio::test]
async fn new_search_replaces_previous_results() {
    let (resolver, mut gates) = GatedResolver::new(2);
    let pipeline = SearchPipeline::new(resolver);

    let first = gates.remove(0);
    first.send(Ok(mixed_response())).unwrap();
    pipeline.search("a\nb").await.unwrap();
    assert_eq!(pipeline.current().len(), 2);

    let second = gates.remove(0);
    second.send(Ok(single_response("9"))).unwrap();
    pipeline.search("c").await.unwrap();

    assert_eq!(rows(&pipeline), vec![row(1, "9", "SP1")]);
}

#[tokio::test]
async fn dispatch_failure_clears_previous_results() {
    let (resolver, mut gates) = GatedResolver::new(3);
    let pipeline = SearchPipeline::new(resolver);

    gates.remove(0).send(Ok(mixed_response())).unwrap();
    pipeline.search("a").await.unwrap();
    assert_eq!(pipeline.current().len(), 2);

    gates
        .remove(0)
        .send(Err(DispatchError::Status {
            status: 500,
            body: "boom".to_string(),
        }))
        .unwrap();
    let err = pipeline.search("b").await.unwrap_err();
    assert!(matches!(err.source, DispatchError::Status { status: 500, .. }));
    assert!(pipeline.current().is_empty());

    gates
        .remove(0)
        .send(Err(DispatchError::malformed("not json")))
        .unwrap();
    assert!(pipeline.search("c").await.is_err());
    assert!(pipeline.current().is_empty());

    let kml = pipeline.export_kml(&KmlExporter::default()).unwrap();
    assert!(!kml.contains("<Placemark>"));
}

#[tokio::test]
async fn stale_response_never_overwrites_newer_results() {
    let (resolver, gates) = GatedResolver::new(2);
    let pipeline = SearchPipeline::new(resolver);
    let mut gates = gates.into_iter();
    let older_gate = gates.next().unwrap();
    let newer_gate = gates.next().unwrap();

    let older = pipeline.search("old");
    let newer = pipeline.search("new");
    let driver = async move {
        newer_gate.send(Ok(single_response("new"))).unwrap();
        tokio::task::yield_now().await;
        older_gate.send(Ok(single_response("old"))).unwrap();
    };

    let (older, newer, ()) = tokio::join!(older, newer, driver);

    assert!(matches!(older.unwrap(), SearchOutcome::Superseded { .. }));
    assert!(matches!(newer.unwrap(), SearchOutcome::Completed { records: 1, .. }));
    assert_eq!(rows(&pipeline), vec![row(1, "new", "SP1")]);
}

#[tokio::test]
async fn stale_response_is_dropped_even_when_it_arrives_first() {
    let (resolver, gates) = GatedResolver::new(2);
    let pipeline = SearchPipeline::new(resolver);
    let mut gates = gates.into_iter();
    let older_gate = gates.next().unwrap();
    let newer_gate = gates.next().unwrap();

    let older = pipeline.search("old");
    let newer = pipeline.search("new");
    let driver = async move {
        older_gate.send(Ok(single_response("old"))).unwrap();
        tokio::task::yield_now().await;
        newer_gate.send(Ok(single_response("new"))).unwrap();
    };

    let (older, newer, ()) = tokio::join!(older, newer, driver);

    assert!(matches!(older.unwrap(), SearchOutcome::Superseded { .. }));
    assert!(matches!(newer.unwrap(), SearchOutcome::Completed { .. }));
    assert_eq!(rows(&pipeline), vec![row(1, "new", "SP1")]);
}

#[tokio::test]
async fn stale_failure_does_not_clear_newer_results() {
    let (resolver, gates) = GatedResolver::new(2);
    let pipeline = SearchPipeline::new(resolver);
    let mut gates = gates.into_iter();
    let older_gate = gates.next().unwrap();
    let newer_gate = gates.next().unwrap();

    let older = pipeline.search("old");
    let newer = pipeline.search("new");
    let driver = async move {
        newer_gate.send(Ok(single_response("new"))).unwrap();
        tokio::task::yield_now().await;
        older_gate
            .send(Err(DispatchError::malformed("late failure")))
            .unwrap();
    };

    let (older, _, ()) = tokio::join!(older, newer, driver);

    assert!(matches!(older.unwrap(), SearchOutcome::Superseded { .. }));
    assert_eq!(pipeline.current().len(), 1);
}
