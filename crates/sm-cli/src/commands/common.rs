//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;
use sm_core::{DirectoryWriter, DriftStatus, Lockfile, MigrationSource};
use std::fmt;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main.rs exits with the code and prints nothing.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Where a definition stands relative to the lockfile and its compiled file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum MigrationStatus {
    /// Never compiled
    New,
    /// Definition changed since it was compiled
    Stale,
    /// Recorded in the lockfile but the compiled file is gone
    Missing,
    /// Compiled file was edited after it was compiled
    Drifted,
    UpToDate,
}

impl MigrationStatus {
    pub(crate) fn is_up_to_date(&self) -> bool {
        *self == MigrationStatus::UpToDate
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationStatus::New => write!(f, "new"),
            MigrationStatus::Stale => write!(f, "stale"),
            MigrationStatus::Missing => write!(f, "missing"),
            MigrationStatus::Drifted => write!(f, "drifted"),
            MigrationStatus::UpToDate => write!(f, "up_to_date"),
        }
    }
}

/// Compare a definition with its lockfile entry and compiled output
pub(crate) fn status_of(
    source: &MigrationSource,
    lockfile: &Lockfile,
    writer: &DirectoryWriter,
) -> Result<MigrationStatus> {
    if lockfile.needs_compile(&source.id, &source.content) {
        return Ok(if lockfile.contains(source.id.as_str()) {
            MigrationStatus::Stale
        } else {
            MigrationStatus::New
        });
    }

    let compiled_path = writer.path_for(source.id.as_str(), &source.slug);
    if !compiled_path.exists() {
        return Ok(MigrationStatus::Missing);
    }
    let compiled = std::fs::read_to_string(&compiled_path)
        .with_context(|| format!("Failed to read {}", compiled_path.display()))?;

    Ok(match lockfile.check_drift(&source.id, &compiled) {
        DriftStatus::Clean => MigrationStatus::UpToDate,
        DriftStatus::Drifted => MigrationStatus::Drifted,
        DriftStatus::Untracked => MigrationStatus::New,
    })
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
