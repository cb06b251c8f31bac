//! Built-in ActiveRecord templates.
//!
//! Each procedure template renders one instruction. Variables available:
//! `procedure`, `table`, `args`, `options`, `lock_timeout`,
//! `statement_timeout`.

/// Name the migration class template is registered under
pub const MIGRATION_TEMPLATE_NAME: &str = "migration.rb";

/// Name the fallback instruction template is registered under
pub const GENERIC_TEMPLATE_NAME: &str = "procedures/_generic";

pub(crate) const MIGRATION_TEMPLATE: &str = r#"class {{ name }} < ActiveRecord::Migration[{{ version }}]
{% if disable_ddl_transaction %}
  disable_ddl_transaction!
{% endif %}
{% if header_timeouts %}
  set_lock_timeout({{ header_timeouts.lock_timeout }})
  set_statement_timeout({{ header_timeouts.statement_timeout }})
{% endif %}

  def up
{% for body in up %}
    {{ body | indent(4) }}
{% endfor %}
  end

  def down
{% for body in down %}
    {{ body | indent(4) }}
{% else %}
    raise ActiveRecord::IrreversibleMigration
{% endfor %}
  end
end
"#;

/// Used for procedures that bring no template of their own
pub(crate) const GENERIC_TEMPLATE: &str =
    r#"{{ procedure }} {{ args | map("sym") | join(", ") }}{{ options | kwargs }}"#;

const CREATE_TABLE: &str = r#"create_table {{ args[0] | sym }}{{ options | kwargs("columns", "timestamps") }} do |t|
{% for column in options.columns %}
  t.column {{ column.name | sym }}, {{ column.type | sym }}{{ column | kwargs("name", "type") }}
{% endfor %}
{% if options.timestamps %}
  t.timestamps
{% endif %}
end"#;

const DROP_TABLE: &str = r#"drop_table {{ args[0] | sym }}{{ options | kwargs }}"#;

const ADD_COLUMN: &str =
    r#"add_column {{ args[0] | sym }}, {{ args[1] | sym }}, {{ args[2] | sym }}{{ options | kwargs }}"#;

const REMOVE_COLUMN: &str = r#"remove_column {{ args[0] | sym }}, {{ args[1] | sym }}{% if args[2] %}, {{ args[2] | sym }}{% endif %}{{ options | kwargs }}"#;

const CHANGE_COLUMN_DEFAULT: &str =
    r#"change_column_default {{ args[0] | sym }}, {{ args[1] | sym }}{{ options | kwargs }}"#;

const DROP_INDEX: &str = r#"remove_index {{ args[0] | sym }}{{ options | kwargs }}"#;

const ADD_INDEX: &str = r#"add_index {{ args[0] | sym }}, {{ args[1] | sym }}{{ options | kwargs("algorithm") }}, algorithm: :concurrently"#;

const ADD_FOREIGN_KEY: &str = r#"add_foreign_key {{ args[0] | sym }}, {{ args[1] | sym }}{{ options | kwargs("validate") }}, validate: false"#;

const ADD_CHECK_CONSTRAINT: &str = r#"execute <<~'SQL'
  ALTER TABLE {{ args[0] }} ADD CONSTRAINT {{ args[1] }} CHECK ({{ args[2] }}) NOT VALID
SQL"#;

const DROP_CONSTRAINT: &str = r#"execute <<~'SQL'
  ALTER TABLE {{ args[0] }} DROP CONSTRAINT {{ args[1] }}
SQL"#;

const VALIDATE_CONSTRAINT: &str = r#"execute <<~'SQL'
  ALTER TABLE {{ args[0] }} VALIDATE CONSTRAINT {{ args[1] }}
SQL"#;

/// Templates for every built-in procedure, keyed by procedure name
pub(crate) const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("create_table", CREATE_TABLE),
    ("drop_table", DROP_TABLE),
    ("add_column", ADD_COLUMN),
    ("remove_column", REMOVE_COLUMN),
    ("change_column_default", CHANGE_COLUMN_DEFAULT),
    ("drop_index", DROP_INDEX),
    ("add_index", ADD_INDEX),
    ("add_foreign_key", ADD_FOREIGN_KEY),
    ("add_check_constraint", ADD_CHECK_CONSTRAINT),
    ("drop_constraint", DROP_CONSTRAINT),
    ("validate_constraint", VALIDATE_CONSTRAINT),
];

/// Template name a procedure's template is registered under
pub fn procedure_template_name(procedure: &str) -> String {
    format!("procedures/{}", procedure)
}
