//! File selection for compile runs
//!
//! Supports the `compile_files` selector forms:
//! - `all` - every migration definition
//! - `git-diff` - definitions changed since the last commit (including untracked)
//! - `20190513` - a full or partial version timestamp (prefix match)
//! - `>=20190101`, `<=20191231`, `>=20190101,<=20191231` - an inclusive range;
//!   partial bounds are padded (`0` for lower, `9` for upper)

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::migration_id::{MigrationId, MIGRATION_ID_LEN};

/// Parsed `compile_files` selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSelection {
    /// Every migration
    All,
    /// Migrations changed since the last commit
    GitDiff,
    /// Migrations whose id starts with the given digits
    Timestamp(String),
    /// Migrations with ids inside an inclusive range
    Range {
        from: Option<MigrationId>,
        to: Option<MigrationId>,
    },
}

impl FileSelection {
    /// Parse a selector string
    pub fn parse(selector: &str) -> CoreResult<Self> {
        let trimmed = selector.trim();
        let invalid = |reason: String| CoreError::InvalidSelector {
            selector: selector.to_string(),
            reason,
        };

        match trimmed {
            "" => return Err(invalid("selector cannot be empty".to_string())),
            "all" => return Ok(FileSelection::All),
            "git-diff" => return Ok(FileSelection::GitDiff),
            _ => {}
        }

        if trimmed.starts_with(">=") || trimmed.starts_with("<=") {
            let mut from = None;
            let mut to = None;
            for part in trimmed.split(',').map(str::trim) {
                if let Some(digits) = part.strip_prefix(">=") {
                    if from.is_some() {
                        return Err(invalid("lower bound given twice".to_string()));
                    }
                    from = Some(pad_bound(digits, '0').map_err(&invalid)?);
                } else if let Some(digits) = part.strip_prefix("<=") {
                    if to.is_some() {
                        return Err(invalid("upper bound given twice".to_string()));
                    }
                    to = Some(pad_bound(digits, '9').map_err(&invalid)?);
                } else {
                    return Err(invalid(format!(
                        "range part '{}' must start with '>=' or '<='",
                        part
                    )));
                }
            }
            if let (Some(lo), Some(hi)) = (&from, &to) {
                if lo > hi {
                    return Err(invalid(format!("empty range: {} is after {}", lo, hi)));
                }
            }
            return Ok(FileSelection::Range { from, to });
        }

        check_digits(trimmed).map_err(&invalid)?;
        Ok(FileSelection::Timestamp(trimmed.to_string()))
    }

    /// Returns `true` if the id is selected.
    ///
    /// [`FileSelection::GitDiff`] matches everything here; discovery narrows
    /// it down with the working tree status.
    pub fn matches(&self, id: &MigrationId) -> bool {
        match self {
            FileSelection::All | FileSelection::GitDiff => true,
            FileSelection::Timestamp(prefix) => id.as_str().starts_with(prefix.as_str()),
            FileSelection::Range { from, to } => {
                from.as_ref().map_or(true, |lo| id >= lo) && to.as_ref().map_or(true, |hi| id <= hi)
            }
        }
    }
}

impl FromStr for FileSelection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FileSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSelection::All => write!(f, "all"),
            FileSelection::GitDiff => write!(f, "git-diff"),
            FileSelection::Timestamp(prefix) => write!(f, "{}", prefix),
            FileSelection::Range { from, to } => match (from, to) {
                (Some(lo), Some(hi)) => write!(f, ">={},<={}", lo, hi),
                (Some(lo), None) => write!(f, ">={}", lo),
                (None, Some(hi)) => write!(f, "<={}", hi),
                (None, None) => write!(f, "all"),
            },
        }
    }
}

fn check_digits(digits: &str) -> Result<(), String> {
    if digits.is_empty() {
        return Err("timestamp cannot be empty".to_string());
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not a numeric timestamp", digits));
    }
    if digits.len() > MIGRATION_ID_LEN {
        return Err(format!(
            "timestamp '{}' is longer than {} digits",
            digits, MIGRATION_ID_LEN
        ));
    }
    Ok(())
}

fn pad_bound(digits: &str, fill: char) -> Result<MigrationId, String> {
    check_digits(digits)?;
    let mut padded = digits.to_string();
    while padded.len() < MIGRATION_ID_LEN {
        padded.push(fill);
    }
    MigrationId::parse(&padded).ok_or_else(|| format!("'{}' is not a valid timestamp", digits))
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod tests;
