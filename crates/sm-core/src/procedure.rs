//! Procedure registry: the table of known DDL operation kinds.
//!
//! Each entry carries the lock class the operation takes, an optional
//! validator, an optional template for the renderer and the
//! `non_transactional` mixin. Built-in and custom procedures live in the
//! same table and are looked up identically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::procedure_name::ProcedureName;
use crate::validation::Validator;

/// Lock behaviour of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockClass {
    /// Blocks reads and writes on the target for its whole duration
    Exclusive,
    /// Runs alongside traffic, typically much slower
    Concurrent,
}

impl fmt::Display for LockClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockClass::Exclusive => write!(f, "exclusive"),
            LockClass::Concurrent => write!(f, "concurrent"),
        }
    }
}

/// One registered procedure
#[derive(Debug, Clone)]
pub struct ProcedureDef {
    /// Procedure identifier used in migration definitions
    pub name: ProcedureName,

    /// Lock class derived for every instruction of this procedure
    pub lock_class: LockClass,

    /// Argument-shape check, `None` means always valid
    pub validator: Option<Validator>,

    /// Renderer template; built-ins leave this to the renderer's own table
    pub template: Option<String>,

    /// Migrations using this procedure must run outside a DDL transaction
    pub non_transactional: bool,
}

impl ProcedureDef {
    /// Create a procedure with no validator, template or mixins
    pub fn new(name: impl Into<String>, lock_class: LockClass) -> Self {
        Self {
            name: ProcedureName::new(name),
            lock_class,
            validator: None,
            template: None,
            non_transactional: false,
        }
    }

    /// Attach a validator
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Attach a renderer template
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Mark the procedure as requiring a non-transactional migration
    pub fn non_transactional(mut self) -> Self {
        self.non_transactional = true;
        self
    }
}

/// Built-in procedures and their lock classes.
pub const BUILTIN_PROCEDURES: &[(&str, LockClass)] = &[
    ("create_table", LockClass::Exclusive),
    ("drop_table", LockClass::Exclusive),
    ("add_column", LockClass::Exclusive),
    ("remove_column", LockClass::Exclusive),
    ("change_column_default", LockClass::Exclusive),
    ("drop_index", LockClass::Exclusive),
    ("add_foreign_key", LockClass::Exclusive),
    ("add_check_constraint", LockClass::Exclusive),
    ("drop_constraint", LockClass::Exclusive),
    ("add_index", LockClass::Concurrent),
    ("validate_constraint", LockClass::Concurrent),
];

/// Mapping from procedure name to its definition
#[derive(Debug, Clone, Default)]
pub struct ProcedureRegistry {
    procedures: BTreeMap<ProcedureName, ProcedureDef>,
}

impl ProcedureRegistry {
    /// Create a registry without any procedures
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in procedures
    pub fn builtin() -> Self {
        let mut procedures = BTreeMap::new();
        for (name, lock_class) in BUILTIN_PROCEDURES {
            let mut def = ProcedureDef::new(*name, *lock_class);
            def.validator = Validator::builtin_for(name);
            if *lock_class == LockClass::Concurrent {
                def = def.non_transactional();
            }
            procedures.insert(def.name.clone(), def);
        }
        Self { procedures }
    }

    /// Returns `true` if `name` is one of the built-in procedures
    pub fn is_builtin(name: &str) -> bool {
        BUILTIN_PROCEDURES.iter().any(|(n, _)| *n == name)
    }

    /// Register an additional procedure.
    ///
    /// Fails if the name is already taken; registration adds entries, it
    /// never replaces them.
    pub fn register(&mut self, def: ProcedureDef) -> CoreResult<()> {
        if self.procedures.contains_key(def.name.as_str()) {
            return Err(CoreError::DuplicateProcedure {
                name: def.name.to_string(),
            });
        }
        log::debug!(
            "Registered procedure '{}' ({} lock)",
            def.name,
            def.lock_class
        );
        self.procedures.insert(def.name.clone(), def);
        Ok(())
    }

    /// Look up a procedure by name
    pub fn get(&self, name: &str) -> Option<&ProcedureDef> {
        self.procedures.get(name)
    }

    /// Returns `true` if the procedure is registered
    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// Lock class of a registered procedure
    pub fn lock_class(&self, name: &str) -> Option<LockClass> {
        self.get(name).map(|p| p.lock_class)
    }

    /// Validator of a registered procedure, if it has one
    pub fn validator(&self, name: &str) -> Option<&Validator> {
        self.get(name).and_then(|p| p.validator.as_ref())
    }

    /// Custom template of a registered procedure, if it has one
    pub fn template(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|p| p.template.as_deref())
    }

    /// Iterate procedure names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &ProcedureName> {
        self.procedures.keys()
    }

    /// Number of registered procedures
    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    /// Returns `true` if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

#[cfg(test)]
#[path = "procedure_test.rs"]
mod tests;
