//! sm-core - Core library for safemig
//!
//! This crate provides the migration model, procedure registry, validators,
//! timeout policy, lockfile, configuration parsing, discovery and the
//! compiler pipeline used by the safemig CLI and renderers.

pub mod checksum;
pub mod config;
pub mod definition;
pub mod discovery;
pub mod error;
pub mod hooks;
pub mod instruction;
pub mod lockfile;
pub mod migration;
pub mod migration_id;
mod newtype_string;
pub mod pipeline;
pub mod procedure;
pub mod procedure_name;
pub mod selector;
pub mod timeout;
pub mod validation;
pub mod writer;

pub use checksum::compute_checksum;
pub use config::{Config, CustomProcedureConfig, PostProcessConfig, RendererKind};
pub use definition::{InstructionDefinition, MigrationDefinition};
pub use discovery::{DirectoryDiscovery, Discovery, MigrationSource};
pub use error::{CompileError, CoreError, CoreResult};
pub use hooks::CommandPostProcessor;
pub use instruction::Instruction;
pub use lockfile::{DriftStatus, LockEntry, Lockfile, LOCKFILE_NAME};
pub use migration::{Direction, InstructionRef, Migration, TimeoutOverrides};
pub use migration_id::MigrationId;
pub use pipeline::{
    CollaboratorError, CompileReport, CompiledMigration, Compiler, MigrationFailure,
    MigrationWriter, PostProcessor, Renderer,
};
pub use procedure::{LockClass, ProcedureDef, ProcedureRegistry};
pub use procedure_name::ProcedureName;
pub use selector::FileSelection;
pub use timeout::{Bound, ResolvedTimeouts, TimeoutKind, TimeoutPolicy};
pub use validation::{validate_instruction, validate_migration, Validator};
pub use writer::DirectoryWriter;
