//! Consistency ledger (`.safemiglock.yml`).
//!
//! Maps each migration id to the fingerprint of the definition it was last
//! compiled from and of the output it produced. Loaded once at the start of
//! a run and written once, atomically, at the end.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::checksum::compute_checksum;
use crate::error::{CoreError, CoreResult};
use crate::migration_id::MigrationId;

/// File name of the lockfile inside the configured directory
pub const LOCKFILE_NAME: &str = ".safemiglock.yml";

/// Fingerprints recorded for one migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockEntry {
    /// SHA-256 of the definition source
    pub source_digest: String,

    /// SHA-256 of the rendered, post-processed output
    pub compiled_digest: String,
}

/// State of a compiled file relative to its lockfile entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftStatus {
    /// No entry for this migration
    Untracked,
    /// Output matches what was recorded
    Clean,
    /// Output was edited or replaced since it was compiled
    Drifted,
}

/// Persisted mapping from migration id to its fingerprints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lockfile {
    entries: BTreeMap<MigrationId, LockEntry>,
}

impl Lockfile {
    /// Create an empty lockfile
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the lockfile inside a directory
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(LOCKFILE_NAME)
    }

    /// Load the lockfile; a missing file is an empty ledger.
    ///
    /// A file that exists but cannot be parsed is [`CoreError::LedgerCorruption`].
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            log::debug!("No lockfile at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        serde_yaml::from_str(&content).map_err(|e| CoreError::LedgerCorruption {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save the lockfile atomically.
    ///
    /// Writes to a temp file next to the target and renames it over, so a
    /// crash leaves the previous lockfile intact.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::IoWithPath {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let temp_path = path.with_extension(format!("yml.{}.tmp", std::process::id()));
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(&temp_path, &yaml).map_err(|e| CoreError::IoWithPath {
            path: temp_path.display().to_string(),
            source: e,
        })?;
        std::fs::rename(&temp_path, path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            }
        })?;
        log::debug!("Wrote {} lockfile entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Returns `true` if the migration has never been compiled or its
    /// definition changed since it was.
    pub fn needs_compile(&self, id: &MigrationId, source: &str) -> bool {
        match self.entries.get(id) {
            Some(entry) => entry.source_digest != compute_checksum(source),
            None => true,
        }
    }

    /// Record a successful compile, replacing any previous entry
    pub fn record(&mut self, id: MigrationId, source: &str, compiled: &str) {
        self.entries.insert(
            id,
            LockEntry {
                source_digest: compute_checksum(source),
                compiled_digest: compute_checksum(compiled),
            },
        );
    }

    /// Compare a compiled file's current contents with the recorded digest
    pub fn check_drift(&self, id: &MigrationId, compiled_on_disk: &str) -> DriftStatus {
        match self.entries.get(id) {
            None => DriftStatus::Untracked,
            Some(entry) if entry.compiled_digest == compute_checksum(compiled_on_disk) => {
                DriftStatus::Clean
            }
            Some(_) => DriftStatus::Drifted,
        }
    }

    pub fn get(&self, id: &str) -> Option<&LockEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (&MigrationId, &LockEntry)> {
        self.entries.iter()
    }
}

#[cfg(test)]
#[path = "lockfile_test.rs"]
mod tests;
