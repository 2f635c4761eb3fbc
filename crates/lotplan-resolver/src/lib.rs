//! Cadastral search service
//!
//! Accepts batches of lot/plan identifiers on `POST /search`, routes each one
//! to every state whose identifier grammar it matches, queries that state's
//! ArcGIS parcel layer and answers with `{ features, regions }`, the shape
//! `lotplan_core::HttpResolver` consumes.

pub mod arcgis;
pub mod config;
pub mod error;
pub mod handlers;
pub mod regions;
pub mod router;
pub mod service;

pub use arcgis::{ArcGisClient, Endpoints, ParcelSource};
pub use config::ResolverConfig;
pub use error::{AppError, UpstreamError};
pub use router::{build_router, Limits};
pub use service::SearchService;
