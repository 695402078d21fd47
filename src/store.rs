//! In-memory catalog store.
//!
//! Holds the current authoritative document snapshot. Each update replaces
//! the snapshot wholesale; there is no incremental merge, because nothing in
//! the update contract guarantees ordering or completeness between
//! snapshots. The store performs no shape validation, and tolerating odd or
//! missing fields is left to consumers.

use std::sync::{Arc, RwLock};

use crate::models::Document;

/// Owner of the current catalog snapshot.
///
/// `replace` swaps a single `Arc`, so a reader either sees the old snapshot
/// or the new one, never a mixture. Readers receive a shared handle and can
/// keep using a snapshot after it has been superseded.
pub struct CatalogStore {
    snapshot: RwLock<Arc<Vec<Document>>>,
}

impl CatalogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Unconditionally overwrite the held snapshot.
    pub fn replace(&self, documents: Vec<Document>) {
        *self.snapshot.write().unwrap() = Arc::new(documents);
    }

    /// The latest snapshot, never a partial or torn view.
    pub fn current(&self) -> Arc<Vec<Document>> {
        Arc::clone(&self.snapshot.read().unwrap())
    }

    /// Number of documents in the current snapshot.
    pub fn len(&self) -> usize {
        self.snapshot.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}
