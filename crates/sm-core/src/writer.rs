//! Writes compiled migrations into the output directory

use std::path::{Path, PathBuf};

use crate::migration::Migration;
use crate::pipeline::{CollaboratorError, MigrationWriter};

/// Writes `<dir>/<id>_<slug>.<extension>`, creating the directory as needed
#[derive(Debug, Clone)]
pub struct DirectoryWriter {
    dir: PathBuf,
    extension: String,
}

impl DirectoryWriter {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where a migration with this id and slug is written
    pub fn path_for(&self, id: &str, slug: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.{}", id, slug, self.extension))
    }
}

impl MigrationWriter for DirectoryWriter {
    fn write(&self, migration: &Migration, text: &str) -> Result<PathBuf, CollaboratorError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| format!("cannot create {}: {}", self.dir.display(), e))?;
        let path = self.path_for(migration.id().as_str(), migration.slug());
        std::fs::write(&path, text).map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
        Ok(path)
    }

    fn existing(
        &self,
        migration: &Migration,
    ) -> Result<Option<(PathBuf, String)>, CollaboratorError> {
        let path = self.path_for(migration.id().as_str(), migration.slug());
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some((path, text))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(format!("cannot read {}: {}", path.display(), e).into()),
        }
    }
}
