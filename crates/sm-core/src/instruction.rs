//! The atomic unit of a migration: one DDL operation and its arguments.

use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

use crate::procedure::{LockClass, ProcedureRegistry};
use crate::procedure_name::ProcedureName;
use crate::timeout::ResolvedTimeouts;

/// A single DDL operation with structured arguments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    procedure: ProcedureName,
    positional_args: Vec<Value>,
    extra_args: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lock_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    statement_timeout: Option<u64>,
}

impl Instruction {
    /// Create an instruction. No validation or timeout resolution happens here.
    pub fn new(
        procedure: ProcedureName,
        positional_args: Vec<Value>,
        extra_args: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            procedure,
            positional_args,
            extra_args,
            lock_timeout: None,
            statement_timeout: None,
        }
    }

    pub fn procedure(&self) -> &ProcedureName {
        &self.procedure
    }

    pub fn positional_args(&self) -> &[Value] {
        &self.positional_args
    }

    pub fn extra_args(&self) -> &BTreeMap<String, Value> {
        &self.extra_args
    }

    /// Named option lookup
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.extra_args.get(key)
    }

    /// Returns `true` if the named option is present, whatever its value
    pub fn has_option(&self, key: &str) -> bool {
        self.extra_args.contains_key(key)
    }

    /// The table this instruction operates on (first positional argument)
    pub fn table(&self) -> Option<&str> {
        self.positional_args.first().and_then(Value::as_str)
    }

    /// Lock class derived from the procedure, `None` if it is unregistered
    pub fn lock_class(&self, registry: &ProcedureRegistry) -> Option<LockClass> {
        registry.lock_class(&self.procedure)
    }

    pub fn lock_timeout(&self) -> Option<u64> {
        self.lock_timeout
    }

    pub fn statement_timeout(&self) -> Option<u64> {
        self.statement_timeout
    }

    /// Resolved timeouts, `None` until the policy resolver has run
    pub fn timeouts(&self) -> Option<ResolvedTimeouts> {
        match (self.lock_timeout, self.statement_timeout) {
            (Some(lock_timeout), Some(statement_timeout)) => Some(ResolvedTimeouts {
                lock_timeout,
                statement_timeout,
            }),
            _ => None,
        }
    }

    pub(crate) fn apply_timeouts(&mut self, timeouts: ResolvedTimeouts) {
        self.lock_timeout = Some(timeouts.lock_timeout);
        self.statement_timeout = Some(timeouts.statement_timeout);
    }
}
