//! The cache abstraction consumed by the decomposition engine

use std::sync::Arc;
use stress_core::{Decomposition, Fingerprint, Result};

/// Content-addressed storage for decomposition results
///
/// Keys are fingerprints of the exact signal values (salted with the
/// decomposition parameters), so an entry can never be stale: different input
/// always means a different key. Implementations must make `put` idempotent:
/// writing the same fingerprint twice, possibly concurrently, leaves one
/// intact entry.
pub trait DecompositionCache: Send + Sync {
    /// Look up a decomposition. A miss is `None`, never an error.
    fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Decomposition>>;

    /// Store a decomposition under its fingerprint
    fn put(&self, fingerprint: &Fingerprint, decomposition: Arc<Decomposition>) -> Result<()>;

    /// Short name used in log output
    fn backend_name(&self) -> &'static str;
}

impl<C: DecompositionCache + ?Sized> DecompositionCache for Arc<C> {
    fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Decomposition>> {
        (**self).get(fingerprint)
    }

    fn put(&self, fingerprint: &Fingerprint, decomposition: Arc<Decomposition>) -> Result<()> {
        (**self).put(fingerprint, decomposition)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

/// Cache that stores nothing; every lookup misses
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl DecompositionCache for NoCache {
    fn get(&self, _fingerprint: &Fingerprint) -> Option<Arc<Decomposition>> {
        None
    }

    fn put(&self, _fingerprint: &Fingerprint, _decomposition: Arc<Decomposition>) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "none"
    }
}
