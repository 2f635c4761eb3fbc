//! Current search results
//!
//! `ResultStore` holds exactly one ordered record list. It is swapped as a
//! whole, never merged, and readers get an `Arc` snapshot so the table, the
//! map layer and the exporter all see the same list.

use std::sync::{Arc, PoisonError, RwLock};

use crate::dispatch::{DispatchSequence, DispatchTicket};
use crate::types::{ParcelRecord, TableRow};

/// Snapshot of the current records
pub type RecordSnapshot = Arc<[ParcelRecord]>;

struct StoreState {
    records: RecordSnapshot,
    /// Ticket of the dispatch that produced `records`
    ticket: Option<DispatchTicket>,
}

/// Holder of the current canonical result list
pub struct ResultStore {
    state: RwLock<StoreState>,
    sequence: Arc<DispatchSequence>,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(Arc::new(DispatchSequence::new()))
    }
}

impl ResultStore {
    /// Create an empty store judging staleness against `sequence`
    pub fn new(sequence: Arc<DispatchSequence>) -> Self {
        Self {
            state: RwLock::new(StoreState {
                records: Arc::from(Vec::new()),
                ticket: None,
            }),
            sequence,
        }
    }

    pub fn sequence(&self) -> &Arc<DispatchSequence> {
        &self.sequence
    }

    /// Read-only snapshot of the current records
    pub fn current(&self) -> RecordSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&state.records)
    }

    /// Ticket of the dispatch whose results are currently held
    pub fn ticket(&self) -> Option<DispatchTicket> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ticket
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Swap in a new record list unconditionally
    pub fn replace(&self, records: Vec<ParcelRecord>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.records = Arc::from(records);
        state.ticket = None;
    }

    /// Reset to an empty list
    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    /// Swap in `records` if `ticket` is still the most recently issued one.
    ///
    /// Returns `false` and leaves the store untouched for a stale ticket.
    pub fn commit(&self, ticket: DispatchTicket, records: Vec<ParcelRecord>) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !self.sequence.is_current(ticket) {
            tracing::debug!(%ticket, "Discarding stale search results");
            return false;
        }
        state.records = Arc::from(records);
        state.ticket = Some(ticket);
        true
    }

    /// Clear on behalf of a failed dispatch, unless a newer one was issued
    pub fn clear_for(&self, ticket: DispatchTicket) -> bool {
        self.commit(ticket, Vec::new())
    }

    /// `{id, lot, plan}` rows for the results table
    pub fn table_rows(&self) -> Vec<TableRow> {
        self.current().iter().map(ParcelRecord::table_row).collect()
    }
}
