//! Validators rejecting unsafe instruction and migration shapes.
//!
//! Validators are keyed by procedure through the [`ProcedureRegistry`]; a
//! procedure without one is valid. Every failure of a migration is
//! collected before anything is reported.

use serde_yaml::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::CompileError;
use crate::instruction::Instruction;
use crate::migration::{Direction, Migration};
use crate::procedure::{LockClass, ProcedureRegistry};

/// Predicate signature for programmatically registered validators
pub type ValidatorFn = Arc<dyn Fn(&Instruction) -> bool + Send + Sync>;

/// Argument-shape check for one procedure
#[derive(Clone)]
pub enum Validator {
    /// `drop_index` must name the index or its column
    DropIndex,
    /// `add_column` must not force a rewrite or an index build under lock
    AddColumn,
    /// At least one of the listed options must be present
    RequireAnyOption(Vec<String>),
    /// Caller-supplied predicate with a description of what it requires
    Custom {
        requirement: String,
        check: ValidatorFn,
    },
}

impl Validator {
    /// Validator shipped for a built-in procedure
    pub fn builtin_for(procedure: &str) -> Option<Self> {
        match procedure {
            "drop_index" => Some(Validator::DropIndex),
            "add_column" => Some(Validator::AddColumn),
            _ => None,
        }
    }

    /// Create a validator from a closure
    pub fn custom<F>(requirement: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Instruction) -> bool + Send + Sync + 'static,
    {
        Validator::Custom {
            requirement: requirement.into(),
            check: Arc::new(check),
        }
    }

    /// Returns `true` if the instruction's arguments are safe to compile
    pub fn check(&self, instruction: &Instruction) -> bool {
        match self {
            Validator::DropIndex => instruction.has_option("name") || instruction.has_option("column"),
            Validator::AddColumn => add_column_is_safe(instruction),
            Validator::RequireAnyOption(keys) => keys.iter().any(|k| instruction.has_option(k)),
            Validator::Custom { check, .. } => check(instruction),
        }
    }

    /// What the validator requires, for failure messages
    pub fn requirement(&self) -> String {
        match self {
            Validator::DropIndex => {
                "drop_index requires a `name` or `column` option; dropping by table alone is ambiguous"
                    .to_string()
            }
            Validator::AddColumn => {
                "add_column requires a nullable column or a `default`, and must not be `unique`"
                    .to_string()
            }
            Validator::RequireAnyOption(keys) => {
                let keys: Vec<String> = keys.iter().map(|k| format!("`{}`", k)).collect();
                format!("requires one of the options {}", keys.join(", "))
            }
            Validator::Custom { requirement, .. } => requirement.clone(),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::DropIndex => write!(f, "DropIndex"),
            Validator::AddColumn => write!(f, "AddColumn"),
            Validator::RequireAnyOption(keys) => f.debug_tuple("RequireAnyOption").field(keys).finish(),
            Validator::Custom { requirement, .. } => f
                .debug_struct("Custom")
                .field("requirement", requirement)
                .finish_non_exhaustive(),
        }
    }
}

/// `null: false` needs a default to fill existing rows, and `unique: true`
/// builds an index while holding the table lock.
fn add_column_is_safe(instruction: &Instruction) -> bool {
    let nullable = !matches!(instruction.option("null"), Some(Value::Bool(false)));
    let has_default = matches!(instruction.option("default"), Some(v) if !v.is_null());
    let unique = matches!(instruction.option("unique"), Some(Value::Bool(true)));
    (nullable || has_default) && !unique
}

/// Returns `true` if the instruction passes its procedure's validator.
///
/// Procedures without a validator always pass.
pub fn validate_instruction(registry: &ProcedureRegistry, instruction: &Instruction) -> bool {
    registry
        .validator(instruction.procedure())
        .map_or(true, |v| v.check(instruction))
}

/// Validate every instruction and the migration's overall shape.
///
/// Returns all failures; an empty vector means the migration is valid.
pub fn validate_migration(migration: &Migration, registry: &ProcedureRegistry) -> Vec<CompileError> {
    let mut errors = Vec::new();

    for (position, instruction) in migration.instructions() {
        if let Some(validator) = registry.validator(instruction.procedure()) {
            if !validator.check(instruction) {
                errors.push(CompileError::ValidationFailure {
                    target: position.to_string(),
                    requirement: validator.requirement(),
                });
            }
        }
    }

    for direction in [Direction::Up, Direction::Down] {
        check_concurrent_isolation(migration, direction, registry, &mut errors);
        check_single_exclusive_table(migration, direction, registry, &mut errors);
    }

    if !errors.is_empty() {
        log::debug!(
            "Migration {} failed validation with {} issue(s)",
            migration.id(),
            errors.len()
        );
    }
    errors
}

/// A concurrent operation has to be the only instruction in its direction.
fn check_concurrent_isolation(
    migration: &Migration,
    direction: Direction,
    registry: &ProcedureRegistry,
    errors: &mut Vec<CompileError>,
) {
    let instructions = migration.direction(direction);
    if instructions.len() < 2 {
        return;
    }
    for instruction in instructions {
        if instruction.lock_class(registry) == Some(LockClass::Concurrent) {
            errors.push(CompileError::ValidationFailure {
                target: format!("migration {} ({})", migration.id(), direction),
                requirement: format!(
                    "concurrent operation {} must be the only instruction in its direction, found {}",
                    instruction.procedure(),
                    instructions.len()
                ),
            });
            return;
        }
    }
}

/// Exclusive-lock instructions of one direction may touch a single table.
fn check_single_exclusive_table(
    migration: &Migration,
    direction: Direction,
    registry: &ProcedureRegistry,
    errors: &mut Vec<CompileError>,
) {
    let tables: BTreeSet<&str> = migration
        .direction(direction)
        .iter()
        .filter(|i| i.lock_class(registry) == Some(LockClass::Exclusive))
        .filter_map(Instruction::table)
        .collect();

    if tables.len() > 1 {
        let names: Vec<&str> = tables.into_iter().collect();
        errors.push(CompileError::ValidationFailure {
            target: format!("migration {} ({})", migration.id(), direction),
            requirement: format!(
                "exclusive locks may be taken on one table per migration, found {}",
                names.join(", ")
            ),
        });
    }
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
