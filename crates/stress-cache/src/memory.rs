//! In-process cache backed by a concurrent hash map

use crate::store::DecompositionCache;
use dashmap::DashMap;
use std::sync::Arc;
use stress_core::{Decomposition, Fingerprint, Result};

/// Decompositions held in memory for the lifetime of the process
///
/// Used for tests and for services configured without a cache directory.
#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    entries: Arc<DashMap<Fingerprint, Arc<Decomposition>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl DecompositionCache for MemoryCache {
    fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Decomposition>> {
        self.entries.get(fingerprint).map(|e| Arc::clone(e.value()))
    }

    fn put(&self, fingerprint: &Fingerprint, decomposition: Arc<Decomposition>) -> Result<()> {
        self.entries.insert(*fingerprint, decomposition);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
