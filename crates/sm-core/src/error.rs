//! Error types for sm-core
//!
//! [`CoreError`] aborts a whole run. [`CompileError`] belongs to a single
//! migration: the pipeline collects these and keeps going.

use thiserror::Error;

use crate::procedure::LockClass;
use crate::timeout::{Bound, TimeoutKind};

/// Run-level error for safemig
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config {path}: {message}")]
    ConfigParseError { path: String, message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Migration directory not found
    #[error("[E004] Migration directory not found: {path}")]
    MigrationDirectoryNotFound { path: String },

    /// E005: Invalid file selector
    #[error("[E005] Invalid file selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// E006: Lockfile exists but cannot be parsed
    #[error("[E006] Lockfile {path} is corrupt and cannot be trusted: {message}")]
    LedgerCorruption { path: String, message: String },

    /// E007: Two definition files share a migration id
    #[error("[E007] Duplicate migration id {id}: {first} and {second}")]
    DuplicateMigrationId {
        id: String,
        first: String,
        second: String,
    },

    /// E008: Procedure registered twice
    #[error("[E008] Procedure '{name}' is already registered")]
    DuplicateProcedure { name: String },

    /// E009: git could not report changed files
    #[error("[E009] git-diff selection failed: {message}")]
    GitFailed { message: String },

    /// E010: IO error
    #[error("[E010] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E011: IO error with file path context
    #[error("[E011] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E012: YAML serialization error
    #[error("[E012] YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Failure that aborts compilation of one migration only
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// C001: Instruction or migration shape is unsafe
    #[error("[C001] {target}: {requirement}")]
    ValidationFailure { target: String, requirement: String },

    /// C002: Author-declared timeout outside the policy for a lock class
    #[error(
        "[C002] {instruction}: {kind} of {value}ms is {bound} {limit}ms for {lock_class} operations (off by {delta}ms)"
    )]
    TimeoutOutOfBounds {
        instruction: String,
        kind: TimeoutKind,
        lock_class: LockClass,
        bound: Bound,
        limit: u64,
        value: u64,
        delta: u64,
    },

    /// C003: Definition file could not be turned into a migration
    #[error("[C003] Invalid migration definition: {message}")]
    DefinitionError { message: String },

    /// C004: Renderer raised an error
    #[error("[C004] Renderer failed: {message}")]
    RendererFailure { message: String },

    /// C005: Post-process hook raised an error
    #[error("[C005] Post-process hook failed: {message}")]
    PostProcessFailure { message: String },

    /// C006: Rendered output could not be written
    #[error("[C006] Failed to write compiled migration: {message}")]
    WriteFailure { message: String },

    /// C007: Compiled output was edited after it was last compiled
    #[error(
        "[C007] {path} was edited by hand since it was compiled; move the change into the definition or recompile with --force to overwrite it"
    )]
    OutputDrifted { path: String },
}

impl CompileError {
    /// Short code used in batch reports
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::ValidationFailure { .. } => "C001",
            CompileError::TimeoutOutOfBounds { .. } => "C002",
            CompileError::DefinitionError { .. } => "C003",
            CompileError::RendererFailure { .. } => "C004",
            CompileError::PostProcessFailure { .. } => "C005",
            CompileError::WriteFailure { .. } => "C006",
            CompileError::OutputDrifted { .. } => "C007",
        }
    }
}
