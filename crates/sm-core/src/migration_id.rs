//! Migration version key.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Number of digits in a full `YYYYMMDDHHMMSS` version.
pub const MIGRATION_ID_LEN: usize = 14;

/// Version timestamp identifying a migration, e.g. `20190513163422`.
///
/// Always exactly 14 ASCII digits, so string ordering is chronological.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MigrationId(String);

impl MigrationId {
    /// Parse a full version, returning `None` unless it is 14 digits.
    pub fn parse(value: &str) -> Option<Self> {
        if value.len() == MIGRATION_ID_LEN && value.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(value.to_string()))
        } else {
            None
        }
    }

    /// Build a version from the current UTC time.
    pub fn now() -> Self {
        Self(chrono::Utc::now().format("%Y%m%d%H%M%S").to_string())
    }

    /// Return the version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MigrationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MigrationId::parse(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "migration id must be {} digits, found '{}'",
                MIGRATION_ID_LEN, s
            ))
        })
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for MigrationId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MigrationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for MigrationId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
