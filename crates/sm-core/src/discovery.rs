//! Migration definition discovery

use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use crate::error::{CoreError, CoreResult};
use crate::migration::class_name;
use crate::migration_id::MigrationId;
use crate::selector::FileSelection;

/// One migration definition as found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSource {
    /// Version key from the file name
    pub id: MigrationId,

    /// Snake-case name from the file name, e.g. `add_payer_index`
    pub slug: String,

    /// Path of the definition file
    pub path: PathBuf,

    /// Raw definition source
    pub content: String,
}

impl MigrationSource {
    /// Default class name derived from the slug
    pub fn class_name(&self) -> String {
        class_name(&self.slug)
    }

    /// File name of the compiled output, without directory
    pub fn output_file_name(&self, extension: &str) -> String {
        format!("{}_{}.{}", self.id, self.slug, extension)
    }
}

/// Source of migration definitions for a compile run
pub trait Discovery {
    /// Return the selected definitions in ascending id order.
    ///
    /// Malformed selectors must fail before anything is returned.
    fn discover(&self, selection: &FileSelection) -> CoreResult<Vec<MigrationSource>>;
}

fn definition_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{14})_([a-z0-9_]+)\.ya?ml$").expect("valid regex"))
}

/// Split a definition file name into id and slug
pub fn parse_file_name(file_name: &str) -> Option<(MigrationId, String)> {
    let captures = definition_file_pattern().captures(file_name)?;
    let id = MigrationId::parse(captures.get(1)?.as_str())?;
    Some((id, captures.get(2)?.as_str().to_string()))
}

/// Discovers `<id>_<slug>.yml` files in one directory
#[derive(Debug, Clone)]
pub struct DirectoryDiscovery {
    dir: PathBuf,
}

impl DirectoryDiscovery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Scan the directory, keyed by id so the result is sorted
    fn scan(&self) -> CoreResult<BTreeMap<MigrationId, (String, PathBuf)>> {
        if !self.dir.is_dir() {
            return Err(CoreError::MigrationDirectoryNotFound {
                path: self.dir.display().to_string(),
            });
        }

        let mut found: BTreeMap<MigrationId, (String, PathBuf)> = BTreeMap::new();
        for entry in std::fs::read_dir(&self.dir).map_err(|e| CoreError::IoWithPath {
            path: self.dir.display().to_string(),
            source: e,
        })? {
            let entry = entry.map_err(|e| CoreError::IoWithPath {
                path: self.dir.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((id, slug)) = parse_file_name(file_name) else {
                if path.extension().is_some_and(|e| e == "yml" || e == "yaml") {
                    log::warn!(
                        "Ignoring {}: expected <YYYYMMDDHHMMSS>_<name>.yml",
                        path.display()
                    );
                }
                continue;
            };
            if let Some((_, existing)) = found.get(&id) {
                return Err(CoreError::DuplicateMigrationId {
                    id: id.to_string(),
                    first: existing.display().to_string(),
                    second: path.display().to_string(),
                });
            }
            found.insert(id, (slug, path));
        }
        Ok(found)
    }

    /// File names under the directory that git reports as changed or untracked
    fn git_changed_files(&self) -> CoreResult<HashSet<String>> {
        let output = Command::new("git")
            .args(["status", "--porcelain", "--untracked-files=all", "--", "."])
            .current_dir(&self.dir)
            .output()
            .map_err(|e| CoreError::GitFailed {
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(CoreError::GitFailed {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(parse_porcelain(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Extract file names of added, modified, renamed and untracked entries
/// from `git status --porcelain` output. Deletions are skipped.
pub(crate) fn parse_porcelain(stdout: &str) -> HashSet<String> {
    stdout
        .lines()
        .filter(|line| line.len() > 3)
        .filter(|line| !line[..2].contains('D'))
        .filter_map(|line| {
            let path = &line[3..];
            let path = path.rsplit(" -> ").next().unwrap_or(path);
            let path = path.trim_matches('"');
            Path::new(path)
                .file_name()
                .and_then(|n| n.to_str())
                .map(String::from)
        })
        .collect()
}

impl Discovery for DirectoryDiscovery {
    fn discover(&self, selection: &FileSelection) -> CoreResult<Vec<MigrationSource>> {
        let found = self.scan()?;
        let changed = match selection {
            FileSelection::GitDiff => Some(self.git_changed_files()?),
            _ => None,
        };

        let mut sources = Vec::new();
        for (id, (slug, path)) in found {
            if !selection.matches(&id) {
                continue;
            }
            if let Some(changed) = &changed {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                if !changed.contains(name) {
                    continue;
                }
            }
            let content = std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            })?;
            sources.push(MigrationSource {
                id,
                slug,
                path,
                content,
            });
        }

        log::debug!(
            "Selected {} migration(s) from {} with '{}'",
            sources.len(),
            self.dir.display(),
            selection
        );
        Ok(sources)
    }
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
