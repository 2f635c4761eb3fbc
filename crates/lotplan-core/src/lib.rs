//! Lot/Plan parcel search pipeline
//!
//! Turns pasted cadastral Lot/Plan identifiers into one canonical list of
//! parcels, whatever jurisdiction answered, and feeds that list to the
//! results table, the map highlight layer and the KML and shapefile exports.
//!
//! ## Architecture
//!
//! ```text
//! raw text → input::parse_queries → QueryDispatcher ──(one request)──► resolver
//!                                        │
//!                          (features, region tags)
//!                                        ▼
//!                               normalize::normalize
//!                                        ▼
//!                                   ResultStore ──► table rows
//!                                               ├─► HighlightLayer
//!                                               ├─► KmlExporter
//!                                               └─► ShapefileExporter
//! ```
//!
//! ## Configuration
//!
//! `PipelineConfig::from_env` reads `LOTPLAN_RESOLVER_URL` and
//! `LOTPLAN_TIMEOUT_SECS`.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod highlight;
pub mod input;
pub mod kml;
pub mod normalize;
pub mod pipeline;
pub mod shapefile;
pub mod store;
pub mod style;
pub mod types;

// Re-exports for convenience
pub use config::PipelineConfig;
pub use dispatch::{
    CadastreResolver, DispatchSequence, DispatchTicket, HttpResolver, QueryDispatcher,
    TaggedFeatures,
};
pub use error::{ConfigError, DispatchError, KmlError, SearchError, ShapefileError};
pub use highlight::HighlightLayer;
pub use input::{parse_queries, QueryToken};
pub use kml::KmlExporter;
pub use normalize::{normalize, PropertySchema};
pub use pipeline::{SearchOutcome, SearchPipeline};
pub use shapefile::{ShapefileDataset, ShapefileExporter};
pub use store::ResultStore;
pub use style::ParcelStyle;
pub use types::{ParcelRecord, RawFeature, RegionTag, SearchRequest, SearchResponse, TableRow};
