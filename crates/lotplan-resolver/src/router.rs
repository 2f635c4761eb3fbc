//! Router construction for the resolver service.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::arcgis::ParcelSource;
use crate::config::DEFAULT_MAX_QUERIES;
use crate::handlers;
use crate::service::SearchService;

/// Request limits shared with handlers
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_queries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_queries: DEFAULT_MAX_QUERIES,
        }
    }
}

/// Build the axum router with all routes and middleware.
pub fn build_router(source: Arc<dyn ParcelSource>, limits: Limits) -> Router {
    let service = SearchService::new(source);

    Router::new()
        .route("/search", post(handlers::search::search))
        .route("/health", get(handlers::health::health))
        .layer(Extension(service))
        .layer(Extension(limits))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
