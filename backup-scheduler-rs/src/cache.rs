//! File-backed transaction cache.
//!
//! One plain-text file per backup unit under the cache directory, named by
//! the unit's artifact name and holding the last committed fingerprint.
//! Records are only ever created or overwritten here; retention is someone
//! else's problem.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use crate::error::{BackupError, Result};

#[derive(Debug, Clone)]
pub struct TransactionCache {
    dir: PathBuf,
}

impl TransactionCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TransactionCache { dir: dir.into() }
    }

    /// All units with a previously committed fingerprint. An unreadable or
    /// missing cache directory reads as an empty set, not an error.
    pub fn known_units(&self) -> HashSet<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return HashSet::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect()
    }

    /// True when no record exists for the unit, or when the stored
    /// fingerprint differs from `fingerprint` by exact string inequality.
    pub fn has_changed(&self, artifact: &str, fingerprint: &str) -> bool {
        match fs::read_to_string(self.dir.join(artifact)) {
            Ok(stored) => stored.trim() != fingerprint,
            Err(_) => true,
        }
    }

    /// Atomically overwrites the unit's record. Writing the same value
    /// twice leaves the stored state identical to writing it once.
    pub fn commit(&self, artifact: &str, fingerprint: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| BackupError::Cache(format!("create {}: {}", self.dir.display(), e)))?;
        let tmp = self.dir.join(format!(".{}.tmp", artifact));
        let path = self.dir.join(artifact);
        fs::write(&tmp, fingerprint)
            .map_err(|e| BackupError::Cache(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| BackupError::Cache(format!("rename to {}: {}", path.display(), e)))?;
        Ok(())
    }
}
