//! Project state shared by every command

use anyhow::{Context, Result};
use sm_core::{
    Config, DirectoryDiscovery, DirectoryWriter, Discovery, FileSelection, Lockfile,
    MigrationSource, ProcedureRegistry,
};
use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Loaded configuration and procedure registry for one project directory
pub(crate) struct ProjectContext {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
    pub(crate) registry: ProcedureRegistry,
    verbose: bool,
}

impl ProjectContext {
    /// Load the project from `--project-dir`, using `--config` when given.
    ///
    /// Without `--config` a missing `safemig.yml` means defaults.
    pub(crate) fn load(global: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&global.project_dir);
        let config = match &global.config {
            Some(path) => Config::load(Path::new(path))
                .with_context(|| format!("Failed to load config from {}", path))?,
            None => Config::load_or_default(&root).context("Failed to load project config")?,
        };
        let registry = config
            .procedure_registry()
            .context("Failed to register custom procedures")?;

        let ctx = Self {
            root,
            config,
            registry,
            verbose: global.verbose,
        };
        ctx.verbose(format!(
            "Project {} ({} procedures, renderer {})",
            ctx.root.display(),
            ctx.registry.len(),
            ctx.config.renderer
        ));
        Ok(ctx)
    }

    pub(crate) fn migration_dir(&self) -> PathBuf {
        self.config.migration_directory_absolute(&self.root)
    }

    pub(crate) fn lockfile_path(&self) -> PathBuf {
        self.config.lockfile_path(&self.root)
    }

    /// Parse the `--files` selector, falling back to `compile_files`
    pub(crate) fn selection(&self, files: Option<&str>) -> Result<FileSelection> {
        self.config
            .file_selection(files)
            .context("Invalid --files selector")
    }

    /// Selected definitions in ascending id order
    pub(crate) fn discover(&self, selection: &FileSelection) -> Result<Vec<MigrationSource>> {
        let sources = DirectoryDiscovery::new(self.migration_dir())
            .discover(selection)
            .context("Failed to discover migration definitions")?;
        self.verbose(format!(
            "Selected {} migration(s) with '{}'",
            sources.len(),
            selection
        ));
        Ok(sources)
    }

    pub(crate) fn load_lockfile(&self) -> Result<Lockfile> {
        let path = self.lockfile_path();
        Lockfile::load(&path).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Writer for compiled migrations in the configured output directory
    pub(crate) fn writer(&self) -> DirectoryWriter {
        DirectoryWriter::new(
            self.config.output_directory_absolute(&self.root),
            self.config.renderer.file_extension(),
        )
    }

    /// Path relative to the project root for display
    pub(crate) fn display_path<'p>(&self, path: &'p Path) -> std::path::Display<'p> {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }

    pub(crate) fn verbose(&self, message: impl Display) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }
}
