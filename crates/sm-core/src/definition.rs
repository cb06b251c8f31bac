//! Migration definition files.
//!
//! A definition is a YAML document authored by the engineer:
//!
//! ```yaml
//! lock_timeout: 750
//! up:
//!   - procedure: drop_index
//!     args: [payments]
//!     options: { column: payer }
//! down:
//!   - procedure: add_index
//!     args: [payments, [payer]]
//! ```

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

use crate::error::CompileError;

/// Parsed migration definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationDefinition {
    /// Class name override; derived from the file name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Author-declared lock timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_timeout: Option<u64>,

    /// Author-declared statement timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_timeout: Option<u64>,

    /// Run outside of a DDL transaction
    #[serde(default)]
    pub disable_ddl_transaction: bool,

    /// Forward instructions
    #[serde(default)]
    pub up: Vec<InstructionDefinition>,

    /// Rollback instructions
    #[serde(default)]
    pub down: Vec<InstructionDefinition>,
}

/// One step inside `up` or `down`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstructionDefinition {
    pub procedure: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

impl MigrationDefinition {
    /// Parse a definition from YAML source
    pub fn parse(source: &str) -> Result<Self, CompileError> {
        let definition: MigrationDefinition =
            serde_yaml::from_str(source).map_err(|e| CompileError::DefinitionError {
                message: e.to_string(),
            })?;
        if definition.up.is_empty() {
            return Err(CompileError::DefinitionError {
                message: "'up' must contain at least one instruction".to_string(),
            });
        }
        Ok(definition)
    }

    /// Starter definition written by `safemig generate`
    pub fn scaffold(procedure: &str) -> Result<String, serde_yaml::Error> {
        let definition = MigrationDefinition {
            up: vec![InstructionDefinition {
                procedure: procedure.to_string(),
                args: vec![Value::from("table_name")],
                options: BTreeMap::new(),
            }],
            ..Default::default()
        };
        serde_yaml::to_string(&definition)
    }
}

#[cfg(test)]
#[path = "definition_test.rs"]
mod tests;
