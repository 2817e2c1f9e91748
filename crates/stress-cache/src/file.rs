//! Filesystem-backed cache that survives process restarts
//!
//! Each entry is one JSON file named after the fingerprint's hex digest.
//! Writes go to a uniquely named temporary file in the same directory and are
//! then renamed over the final path, so readers only ever observe complete
//! entries and concurrent writers of the same fingerprint cannot interleave.

use crate::store::DecompositionCache;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stress_core::{Decomposition, Error, Fingerprint, Result};
use tracing::{debug, warn};
use uuid::Uuid;

const FORMAT_VERSION: u32 = 1;
const ENTRY_EXTENSION: &str = "json";

#[derive(Serialize, Deserialize)]
struct CacheRecord {
    version: u32,
    fingerprint: Fingerprint,
    decomposition: Decomposition,
}

/// Decomposition cache persisted under a directory
#[derive(Debug, Clone)]
pub struct FileCache {
    directory: PathBuf,
}

impl FileCache {
    /// Open (creating if necessary) a cache directory
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| {
            Error::Cache(format!(
                "cannot create cache directory {}: {e}",
                directory.display()
            ))
        })?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.directory
            .join(format!("{}.{ENTRY_EXTENSION}", fingerprint.to_hex()))
    }

    /// Number of complete entries on disk
    pub fn len(&self) -> Result<usize> {
        Ok(self.entry_paths()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<()> {
        for path in self.entry_paths()? {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn entry_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            let is_entry = path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION)
                && path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(Fingerprint::from_hex)
                    .is_some();
            if is_entry {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    fn read_record(&self, path: &Path) -> io::Result<Option<CacheRecord>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable cache entry");
                Ok(None)
            }
        }
    }
}

impl DecompositionCache for FileCache {
    fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Decomposition>> {
        let path = self.entry_path(fingerprint);
        let record = match self.read_record(&path) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        if record.version != FORMAT_VERSION || record.fingerprint != *fingerprint {
            debug!(
                %fingerprint,
                stored = %record.fingerprint,
                version = record.version,
                "cache entry does not match its key"
            );
            return None;
        }
        Some(Arc::new(record.decomposition))
    }

    fn put(&self, fingerprint: &Fingerprint, decomposition: Arc<Decomposition>) -> Result<()> {
        let record = CacheRecord {
            version: FORMAT_VERSION,
            fingerprint: *fingerprint,
            decomposition: (*decomposition).clone(),
        };
        let bytes = serde_json::to_vec(&record)?;

        let final_path = self.entry_path(fingerprint);
        let tmp_path = self
            .directory
            .join(format!(".{}.{}.tmp", fingerprint.to_hex(), Uuid::new_v4().simple()));

        if let Err(e) = fs::write(&tmp_path, &bytes) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::Cache(format!(
                "cannot write {}: {e}",
                tmp_path.display()
            )));
        }
        if let Err(e) = fs::rename(&tmp_path, &final_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::Cache(format!(
                "cannot publish {}: {e}",
                final_path.display()
            )));
        }
        debug!(%fingerprint, bytes = bytes.len(), "stored decomposition");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
