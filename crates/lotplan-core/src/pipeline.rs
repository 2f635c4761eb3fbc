//! One search cycle: parse → dispatch → normalize → store
//!
//! The dispatcher call is the only await point. Whatever the outcome, the
//! store is touched at most once per cycle and only if the cycle's ticket is
//! still the latest one issued.

use std::sync::Arc;

use crate::dispatch::{CadastreResolver, DispatchSequence, DispatchTicket, QueryDispatcher};
use crate::error::{KmlError, SearchError, ShapefileError};
use crate::highlight::HighlightLayer;
use crate::input::parse_queries;
use crate::kml::KmlExporter;
use crate::normalize::normalize;
use crate::shapefile::ShapefileExporter;
use crate::store::{RecordSnapshot, ResultStore};
use crate::style::ParcelStyle;
use crate::types::TableRow;

/// How a search cycle ended (failures are the `Err` side)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// No non-blank lines; nothing was dispatched
    NoInput,
    /// Results are now in the store
    Completed {
        ticket: DispatchTicket,
        records: usize,
    },
    /// A newer search was issued while this one was in flight; results dropped
    Superseded { ticket: DispatchTicket },
}

/// Wires the components together around a shared `ResultStore`
pub struct SearchPipeline {
    dispatcher: QueryDispatcher,
    store: Arc<ResultStore>,
}

impl SearchPipeline {
    pub fn new(resolver: Arc<dyn CadastreResolver>) -> Self {
        let sequence = Arc::new(DispatchSequence::new());
        let store = Arc::new(ResultStore::new(Arc::clone(&sequence)));
        Self {
            dispatcher: QueryDispatcher::new(resolver, sequence),
            store,
        }
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Run one search over the raw textarea contents
    pub async fn search(&self, text: &str) -> Result<SearchOutcome, SearchError> {
        let tokens = parse_queries(text);
        if tokens.is_empty() {
            tracing::debug!("No lot/plan input, skipping dispatch");
            return Ok(SearchOutcome::NoInput);
        }

        let dispatch = self.dispatcher.dispatch(&tokens).await;
        let ticket = dispatch.ticket;

        match dispatch.result {
            Ok(tagged) => {
                let records = normalize(&tagged);
                let count = records.len();
                if self.store.commit(ticket, records) {
                    tracing::info!(%ticket, records = count, "Search results published");
                    Ok(SearchOutcome::Completed {
                        ticket,
                        records: count,
                    })
                } else {
                    Ok(SearchOutcome::Superseded { ticket })
                }
            }
            Err(source) => {
                if self.store.clear_for(ticket) {
                    tracing::warn!(%ticket, error = %source, "Search failed, results cleared");
                    Err(SearchError { ticket, source })
                } else {
                    tracing::debug!(%ticket, error = %source, "Stale search failed");
                    Ok(SearchOutcome::Superseded { ticket })
                }
            }
        }
    }

    pub fn current(&self) -> RecordSnapshot {
        self.store.current()
    }

    pub fn table_rows(&self) -> Vec<TableRow> {
        self.store.table_rows()
    }

    pub fn highlight(&self, style: &ParcelStyle) -> HighlightLayer {
        HighlightLayer::new(&self.store.current(), style)
    }

    pub fn export_kml(&self, exporter: &KmlExporter) -> Result<String, KmlError> {
        exporter.export(&self.store.current())
    }

    /// Zipped shapefile of the current results
    pub fn export_shapefile(&self, exporter: &ShapefileExporter) -> Result<Vec<u8>, ShapefileError> {
        exporter.export(&self.store.current())
    }
}
