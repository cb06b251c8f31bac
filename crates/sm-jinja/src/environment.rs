//! Jinja environment setup for safemig

use crate::error::{JinjaError, JinjaResult};
use crate::filters::{kwargs, ruby, sym};
use crate::templates::{
    procedure_template_name, BUILTIN_TEMPLATES, GENERIC_TEMPLATE, GENERIC_TEMPLATE_NAME,
    MIGRATION_TEMPLATE, MIGRATION_TEMPLATE_NAME,
};
use minijinja::{AutoEscape, Environment};
use serde::Serialize;

/// Jinja templating environment holding the migration and procedure templates
pub struct JinjaEnvironment {
    env: Environment<'static>,
}

impl JinjaEnvironment {
    /// Create an environment with the Ruby filters and built-in templates
    pub fn new() -> JinjaResult<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        env.add_filter("sym", sym);
        env.add_filter("ruby", ruby);
        env.add_filter("kwargs", kwargs);

        env.add_template(MIGRATION_TEMPLATE_NAME, MIGRATION_TEMPLATE)?;
        env.add_template(GENERIC_TEMPLATE_NAME, GENERIC_TEMPLATE)?;

        let mut jinja = Self { env };
        for (procedure, source) in BUILTIN_TEMPLATES {
            jinja.add_procedure_template(procedure, source)?;
        }
        Ok(jinja)
    }

    /// Register (or replace) the template of one procedure
    pub fn add_procedure_template(&mut self, procedure: &str, source: &str) -> JinjaResult<()> {
        self.env
            .add_template_owned(procedure_template_name(procedure), source.to_string())
            .map_err(|e| JinjaError::InvalidTemplate {
                procedure: procedure.to_string(),
                message: e.to_string(),
            })
    }

    /// Returns `true` if the procedure has a template of its own
    pub fn has_procedure_template(&self, procedure: &str) -> bool {
        self.env
            .get_template(&procedure_template_name(procedure))
            .is_ok()
    }

    /// Render a registered template with the given context
    pub fn render_template<S: Serialize>(&self, name: &str, ctx: S) -> JinjaResult<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(ctx)?)
    }

    /// Render an ad-hoc template string
    pub fn render_str<S: Serialize>(&self, source: &str, ctx: S) -> JinjaResult<String> {
        Ok(self.env.render_str(source, ctx)?)
    }
}
