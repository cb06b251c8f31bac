//! Compiler pipeline.
//!
//! For each selected definition, in ascending id order: consult the
//! lockfile, build the migration, validate, resolve timeouts, check the
//! previous output for hand edits, render, post-process, write, record. A failure at any step stops that migration
//! only; the run carries on with the next one and reports everything at the
//! end.

use std::path::PathBuf;

use crate::definition::MigrationDefinition;
use crate::discovery::MigrationSource;
use crate::error::CompileError;
use crate::lockfile::{DriftStatus, Lockfile};
use crate::migration::Migration;
use crate::migration_id::MigrationId;
use crate::procedure::ProcedureRegistry;
use crate::timeout::TimeoutPolicy;
use crate::validation::validate_migration;

/// Error type returned by external collaborators
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Turns a resolved migration into host-framework source text
pub trait Renderer {
    fn render(&self, migration: &Migration) -> Result<String, CollaboratorError>;
}

/// Optional transform applied to rendered text before it is written
pub trait PostProcessor {
    fn process(&self, rendered: &str) -> Result<String, CollaboratorError>;
}

/// Persists compiled output
pub trait MigrationWriter {
    /// Write the text and return where it went
    fn write(&self, migration: &Migration, text: &str) -> Result<PathBuf, CollaboratorError>;

    /// Output currently at the migration's destination, with its location.
    ///
    /// Writers that cannot read back what they wrote return `None`, which
    /// turns off drift protection for them.
    fn existing(
        &self,
        _migration: &Migration,
    ) -> Result<Option<(PathBuf, String)>, CollaboratorError> {
        Ok(None)
    }
}

/// A migration that was compiled and recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMigration {
    pub id: MigrationId,
    pub path: PathBuf,
}

/// A migration that could not be compiled, with every collected error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFailure {
    pub id: MigrationId,
    pub source: PathBuf,
    pub errors: Vec<CompileError>,
}

/// Batch outcome of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub compiled: Vec<CompiledMigration>,
    pub skipped: Vec<MigrationId>,
    pub failed: Vec<MigrationFailure>,
}

impl CompileReport {
    /// Returns `true` if no migration failed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of errors across failed migrations
    pub fn error_count(&self) -> usize {
        self.failed.iter().map(|f| f.errors.len()).sum()
    }
}

/// Orchestrates a compile run over already-discovered sources
pub struct Compiler<'a> {
    registry: &'a ProcedureRegistry,
    policy: &'a TimeoutPolicy,
    renderer: &'a dyn Renderer,
    writer: &'a dyn MigrationWriter,
    post_processor: Option<&'a dyn PostProcessor>,
    force: bool,
}

impl<'a> Compiler<'a> {
    pub fn new(
        registry: &'a ProcedureRegistry,
        policy: &'a TimeoutPolicy,
        renderer: &'a dyn Renderer,
        writer: &'a dyn MigrationWriter,
    ) -> Self {
        Self {
            registry,
            policy,
            renderer,
            writer,
            post_processor: None,
            force: false,
        }
    }

    /// Run the given hook on every rendered migration
    pub fn with_post_processor(mut self, post_processor: &'a dyn PostProcessor) -> Self {
        self.post_processor = Some(post_processor);
        self
    }

    /// Recompile even when the lockfile says the source is unchanged
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Build, validate and resolve one migration without rendering it.
    ///
    /// Validation failures stop before timeout resolution is attempted.
    pub fn build(&self, source: &MigrationSource) -> Result<Migration, Vec<CompileError>> {
        let definition = MigrationDefinition::parse(&source.content).map_err(|e| vec![e])?;
        let mut migration =
            Migration::from_definition(source.id.clone(), &source.slug, definition, self.registry)?;

        let errors = validate_migration(&migration, self.registry);
        if !errors.is_empty() {
            return Err(errors);
        }

        self.policy.resolve_migration(&mut migration, self.registry)?;
        Ok(migration)
    }

    /// Compile every source, updating the in-memory lockfile for successes.
    ///
    /// The caller persists the lockfile once this returns.
    pub fn compile(&self, sources: &[MigrationSource], lockfile: &mut Lockfile) -> CompileReport {
        let mut ordered: Vec<&MigrationSource> = sources.iter().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        let mut report = CompileReport::default();
        for source in ordered {
            if !self.force && !lockfile.needs_compile(&source.id, &source.content) {
                log::debug!("Skipping {}: unchanged since last compile", source.id);
                report.skipped.push(source.id.clone());
                continue;
            }

            match self.compile_one(source, lockfile) {
                Ok((path, text)) => {
                    lockfile.record(source.id.clone(), &source.content, &text);
                    log::info!("Compiled {} -> {}", source.id, path.display());
                    report.compiled.push(CompiledMigration {
                        id: source.id.clone(),
                        path,
                    });
                }
                Err(errors) => {
                    log::warn!(
                        "Migration {} failed with {} error(s)",
                        source.id,
                        errors.len()
                    );
                    report.failed.push(MigrationFailure {
                        id: source.id.clone(),
                        source: source.path.clone(),
                        errors,
                    });
                }
            }
        }
        report
    }

    fn compile_one(
        &self,
        source: &MigrationSource,
        lockfile: &Lockfile,
    ) -> Result<(PathBuf, String), Vec<CompileError>> {
        let migration = self.build(source)?;
        if !self.force {
            self.ensure_not_drifted(&migration, lockfile)?;
        }

        let rendered = self.renderer.render(&migration).map_err(|e| {
            vec![CompileError::RendererFailure {
                message: e.to_string(),
            }]
        })?;

        let text = match self.post_processor {
            Some(hook) => hook.process(&rendered).map_err(|e| {
                vec![CompileError::PostProcessFailure {
                    message: e.to_string(),
                }]
            })?,
            None => rendered,
        };

        let path = self.writer.write(&migration, &text).map_err(|e| {
            vec![CompileError::WriteFailure {
                message: e.to_string(),
            }]
        })?;
        Ok((path, text))
    }

    /// Refuse to overwrite recorded output that no longer matches its
    /// lockfile hash. Output never recorded is not considered drifted.
    fn ensure_not_drifted(
        &self,
        migration: &Migration,
        lockfile: &Lockfile,
    ) -> Result<(), Vec<CompileError>> {
        if !lockfile.contains(migration.id().as_str()) {
            return Ok(());
        }
        let existing = self.writer.existing(migration).map_err(|e| {
            vec![CompileError::WriteFailure {
                message: e.to_string(),
            }]
        })?;
        match existing {
            Some((path, text))
                if lockfile.check_drift(migration.id(), &text) == DriftStatus::Drifted =>
            {
                Err(vec![CompileError::OutputDrifted {
                    path: path.display().to_string(),
                }])
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
