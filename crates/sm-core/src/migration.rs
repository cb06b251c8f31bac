//! Migration model: ordered instructions plus migration-level settings.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::definition::MigrationDefinition;
use crate::error::CompileError;
use crate::instruction::Instruction;
use crate::migration_id::MigrationId;
use crate::procedure::{LockClass, ProcedureRegistry};
use crate::procedure_name::ProcedureName;

/// Which half of a migration an instruction belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Timeouts declared by the migration author
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_timeout: Option<u64>,
}

impl TimeoutOverrides {
    pub fn is_empty(&self) -> bool {
        self.lock_timeout.is_none() && self.statement_timeout.is_none()
    }
}

/// Position of an instruction inside a migration, used in error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionRef {
    pub direction: Direction,
    pub index: usize,
    pub procedure: ProcedureName,
}

impl fmt::Display for InstructionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} {}", self.direction, self.index + 1, self.procedure)
    }
}

/// One schema change, ready for validation and timeout resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    id: MigrationId,
    slug: String,
    name: String,
    up: Vec<Instruction>,
    down: Vec<Instruction>,
    overrides: TimeoutOverrides,
    disable_ddl_transaction: bool,
}

impl Migration {
    /// Create a migration directly from instruction sequences
    pub fn new(
        id: MigrationId,
        slug: impl Into<String>,
        up: Vec<Instruction>,
        down: Vec<Instruction>,
    ) -> Self {
        let slug = slug.into();
        Self {
            id,
            name: class_name(&slug),
            slug,
            up,
            down,
            overrides: TimeoutOverrides::default(),
            disable_ddl_transaction: false,
        }
    }

    /// Build a migration from a parsed definition.
    ///
    /// Every procedure must be registered; the `non_transactional` mixin of
    /// any procedure used switches the whole migration out of its DDL
    /// transaction.
    pub fn from_definition(
        id: MigrationId,
        slug: &str,
        definition: MigrationDefinition,
        registry: &ProcedureRegistry,
    ) -> Result<Self, Vec<CompileError>> {
        let mut errors = Vec::new();
        let mut build = |direction: Direction, steps: Vec<crate::definition::InstructionDefinition>| {
            let mut instructions = Vec::with_capacity(steps.len());
            for (index, step) in steps.into_iter().enumerate() {
                let Some(procedure) = ProcedureName::try_new(step.procedure) else {
                    errors.push(CompileError::DefinitionError {
                        message: format!("{} #{}: procedure name is empty", direction, index + 1),
                    });
                    continue;
                };
                if !registry.contains(&procedure) {
                    errors.push(CompileError::DefinitionError {
                        message: format!(
                            "{} #{}: unknown procedure '{}'",
                            direction,
                            index + 1,
                            procedure
                        ),
                    });
                    continue;
                }
                instructions.push(Instruction::new(procedure, step.args, step.options));
            }
            instructions
        };

        let up = build(Direction::Up, definition.up);
        let down = build(Direction::Down, definition.down);
        if !errors.is_empty() {
            return Err(errors);
        }

        let mixin_requires_no_transaction = up
            .iter()
            .chain(down.iter())
            .filter_map(|i| registry.get(i.procedure()))
            .any(|p| p.non_transactional);

        Ok(Self {
            id,
            slug: slug.to_string(),
            name: definition.name.unwrap_or_else(|| class_name(slug)),
            up,
            down,
            overrides: TimeoutOverrides {
                lock_timeout: definition.lock_timeout,
                statement_timeout: definition.statement_timeout,
            },
            disable_ddl_transaction: definition.disable_ddl_transaction
                || mixin_requires_no_transaction,
        })
    }

    /// Set author-declared timeouts
    pub fn with_overrides(mut self, overrides: TimeoutOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn id(&self) -> &MigrationId {
        &self.id
    }

    /// Snake-case file slug, e.g. `add_payer_index`
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Class name used by the renderer, e.g. `AddPayerIndex`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn up(&self) -> &[Instruction] {
        &self.up
    }

    pub fn down(&self) -> &[Instruction] {
        &self.down
    }

    pub fn overrides(&self) -> &TimeoutOverrides {
        &self.overrides
    }

    pub fn disable_ddl_transaction(&self) -> bool {
        self.disable_ddl_transaction
    }

    /// Instructions of one direction
    pub fn direction(&self, direction: Direction) -> &[Instruction] {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    /// All instructions in execution order: `up` first, then `down`
    pub fn instructions(&self) -> impl Iterator<Item = (InstructionRef, &Instruction)> {
        let up = self.up.iter().enumerate().map(|(index, i)| {
            (
                InstructionRef {
                    direction: Direction::Up,
                    index,
                    procedure: i.procedure().clone(),
                },
                i,
            )
        });
        let down = self.down.iter().enumerate().map(|(index, i)| {
            (
                InstructionRef {
                    direction: Direction::Down,
                    index,
                    procedure: i.procedure().clone(),
                },
                i,
            )
        });
        up.chain(down)
    }

    pub(crate) fn instructions_mut(&mut self) -> impl Iterator<Item = &mut Instruction> {
        self.up.iter_mut().chain(self.down.iter_mut())
    }

    /// Strictest lock class taken by any instruction
    pub fn strictest_lock(&self, registry: &ProcedureRegistry) -> Option<LockClass> {
        self.instructions()
            .filter_map(|(_, i)| i.lock_class(registry))
            .min()
    }

    /// Lock class the author's timeout overrides are aimed at: the strictest
    /// class of the `up` direction. `down` instructions of another class
    /// keep their class defaults.
    pub fn override_class(&self, registry: &ProcedureRegistry) -> Option<LockClass> {
        self.up
            .iter()
            .filter_map(|i| i.lock_class(registry))
            .min()
            .or_else(|| self.strictest_lock(registry))
    }

    /// Returns `true` once every instruction carries resolved timeouts
    pub fn is_resolved(&self) -> bool {
        self.instructions().all(|(_, i)| i.timeouts().is_some())
    }
}

/// Convert a snake-case slug into a CamelCase class name.
pub fn class_name(slug: &str) -> String {
    slug.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
