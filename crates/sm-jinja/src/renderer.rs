//! ActiveRecord migration renderer.
//!
//! Emits one migration class per resolved migration. When `up` and `down`
//! resolve to the same timeouts they are declared once at class level with
//! `set_lock_timeout`/`set_statement_timeout`; otherwise each method sets
//! its own with `SET [LOCAL]` statements.

use minijinja::{context, Value};
use sm_core::pipeline::{CollaboratorError, Renderer};
use sm_core::{Direction, Instruction, InstructionRef, Migration, ProcedureRegistry, ResolvedTimeouts};

use crate::environment::JinjaEnvironment;
use crate::error::{JinjaError, JinjaResult};
use crate::templates::{procedure_template_name, GENERIC_TEMPLATE_NAME, MIGRATION_TEMPLATE_NAME};

/// Renders migrations as ActiveRecord classes
pub struct ActiveRecordRenderer {
    env: JinjaEnvironment,
    version: String,
}

impl ActiveRecordRenderer {
    /// Create a renderer for the given framework version, picking up the
    /// templates of any custom procedures in the registry.
    pub fn new(registry: &ProcedureRegistry, version: impl Into<String>) -> JinjaResult<Self> {
        let mut env = JinjaEnvironment::new()?;
        for name in registry.names() {
            if let Some(template) = registry.template(name) {
                env.add_procedure_template(name, template)?;
            }
        }
        Ok(Self {
            env,
            version: version.into(),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Render one instruction through its procedure template
    pub fn render_instruction(
        &self,
        position: &InstructionRef,
        instruction: &Instruction,
    ) -> JinjaResult<String> {
        let procedure = instruction.procedure().as_str();
        let template = if self.env.has_procedure_template(procedure) {
            procedure_template_name(procedure)
        } else {
            GENERIC_TEMPLATE_NAME.to_string()
        };

        let ctx = context! {
            procedure => procedure,
            table => instruction.table(),
            args => Value::from_serialize(instruction.positional_args()),
            options => Value::from_serialize(instruction.extra_args()),
            lock_timeout => instruction.lock_timeout(),
            statement_timeout => instruction.statement_timeout(),
        };
        self.env
            .render_template(&template, ctx)
            .map_err(|e| JinjaError::RenderError(format!("{}: {}", position, e)))
    }

    /// Render a complete migration class
    pub fn render_migration(&self, migration: &Migration) -> JinjaResult<String> {
        let up_timeouts = direction_timeouts(migration, Direction::Up)?;
        let down_timeouts = direction_timeouts(migration, Direction::Down)?;

        let header_timeouts = match (up_timeouts, down_timeouts) {
            (Some(up), Some(down)) if up != down => None,
            (Some(up), _) => Some(up),
            (None, down) => down,
        };

        let mut up = Vec::new();
        let mut down = Vec::new();
        if header_timeouts.is_none() {
            let scope = if migration.disable_ddl_transaction() {
                ""
            } else {
                " LOCAL"
            };
            up.extend(set_statements(up_timeouts, scope));
            down.extend(set_statements(down_timeouts, scope));
        }

        for (position, instruction) in migration.instructions() {
            let body = self.render_instruction(&position, instruction)?;
            match position.direction {
                Direction::Up => up.push(body),
                Direction::Down => down.push(body),
            }
        }

        let ctx = context! {
            name => migration.name(),
            version => &self.version,
            disable_ddl_transaction => migration.disable_ddl_transaction(),
            header_timeouts => header_timeouts,
            up => up,
            down => down,
        };
        let mut rendered = self.env.render_template(MIGRATION_TEMPLATE_NAME, ctx)?;
        rendered.push('\n');

        log::debug!(
            "Rendered {} ({} up, {} down)",
            migration.name(),
            migration.up().len(),
            migration.down().len()
        );
        Ok(rendered)
    }
}

impl Renderer for ActiveRecordRenderer {
    fn render(&self, migration: &Migration) -> Result<String, CollaboratorError> {
        Ok(self.render_migration(migration)?)
    }
}

/// Timeouts shared by every instruction of one direction
fn direction_timeouts(
    migration: &Migration,
    direction: Direction,
) -> JinjaResult<Option<ResolvedTimeouts>> {
    let mut shared: Option<ResolvedTimeouts> = None;
    for (position, instruction) in migration.instructions() {
        if position.direction != direction {
            continue;
        }
        let timeouts = instruction
            .timeouts()
            .ok_or_else(|| JinjaError::UnresolvedInstruction {
                instruction: position.to_string(),
            })?;
        match shared {
            Some(existing) if existing != timeouts => {
                return Err(JinjaError::MixedTimeouts {
                    direction: direction.to_string(),
                })
            }
            _ => shared = Some(timeouts),
        }
    }
    Ok(shared)
}

fn set_statements(timeouts: Option<ResolvedTimeouts>, scope: &str) -> Vec<String> {
    match timeouts {
        Some(t) => vec![
            format!("execute \"SET{} lock_timeout = {}\"", scope, t.lock_timeout),
            format!(
                "execute \"SET{} statement_timeout = {}\"",
                scope, t.statement_timeout
            ),
        ],
        None => Vec::new(),
    }
}

#[cfg(test)]
#[path = "renderer_test.rs"]
mod tests;
