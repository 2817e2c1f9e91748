//! Content-addressed decomposition cache
//!
//! Decomposing a signal is the most expensive step of the pipeline, and the
//! same minute of telemetry is typically analysed many times (dashboard
//! polling, overlapping requests). This crate persists decompositions keyed by
//! the [`Fingerprint`](stress_core::Fingerprint) of the signal they were
//! computed from.
//!
//! - [`DecompositionCache`] is the injected abstraction (`get` / `put`).
//! - [`MemoryCache`] and [`FileCache`] are the two backends.
//! - [`ComputeOnce`] sits in front of any backend and guarantees that
//!   concurrent misses for one fingerprint trigger a single computation.
//!
//! ```rust
//! use std::sync::Arc;
//! use stress_cache::{CacheOutcome, ComputeOnce, MemoryCache};
//! use stress_core::{Decomposition, Fingerprint};
//!
//! let cache = ComputeOnce::new(MemoryCache::new());
//! let fp = Fingerprint::of_signal(&[0.8, 0.9, 0.8]);
//! let (value, outcome) = cache
//!     .get_or_try_compute(&fp, || Ok(Decomposition::new(vec![], vec![0.8, 0.9, 0.8])))
//!     .unwrap();
//! assert_eq!(outcome, CacheOutcome::Computed);
//! assert_eq!(value.signal_len(), 3);
//! ```

pub mod compute_once;
pub mod file;
pub mod memory;
pub mod store;

pub use compute_once::{CacheOutcome, CacheStats, ComputeOnce};
pub use file::FileCache;
pub use memory::MemoryCache;
pub use store::{DecompositionCache, NoCache};

use std::sync::Arc;
use stress_core::{CacheConfig, Result};

/// Build the backend described by a [`CacheConfig`]
pub fn from_config(config: &CacheConfig) -> Result<Arc<dyn DecompositionCache>> {
    Ok(match &config.directory {
        Some(dir) => Arc::new(FileCache::open(dir)?),
        None => Arc::new(MemoryCache::new()),
    })
}
