//! Timeout policy: default, floor and ceiling per lock class.
//!
//! Exclusive-lock DDL gets tight timeouts so a stalled migration fails fast
//! instead of queueing production traffic behind it. Concurrent operations
//! get timeouts measured in hours so legitimate long builds are not aborted.
//!
//! Author overrides are checked against the bounds of the instruction's
//! class and never clamped.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CompileError;
use crate::migration::{Migration, TimeoutOverrides};
use crate::procedure::{LockClass, ProcedureRegistry};

pub const DEFAULT_ACCESS_EXCLUSIVE_LOCK_TIMEOUT: u64 = 5_000;
pub const DEFAULT_ACCESS_EXCLUSIVE_STATEMENT_TIMEOUT: u64 = 1_500;
pub const DEFAULT_ACCESS_EXCLUSIVE_LOCK_TIMEOUT_LIMIT: u64 = DEFAULT_ACCESS_EXCLUSIVE_LOCK_TIMEOUT;
pub const DEFAULT_ACCESS_EXCLUSIVE_STATEMENT_TIMEOUT_LIMIT: u64 =
    DEFAULT_ACCESS_EXCLUSIVE_STATEMENT_TIMEOUT;
/// One hour.
pub const DEFAULT_CONCURRENT_TIMEOUT_LIMIT: u64 = 3_600_000;

/// A zero timeout disables the limit in the database, so 1ms is the floor.
pub const MINIMUM_TIMEOUT: u64 = 1;

/// Which timeout a value applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutKind {
    Lock,
    Statement,
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutKind::Lock => write!(f, "lock_timeout"),
            TimeoutKind::Statement => write!(f, "statement_timeout"),
        }
    }
}

/// The side of a range a value fell outside of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Minimum,
    Maximum,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Minimum => write!(f, "below the minimum of"),
            Bound::Maximum => write!(f, "above the maximum of"),
        }
    }
}

/// Default and allowed range for one timeout of one lock class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBounds {
    pub default: u64,
    pub minimum: u64,
    /// `None` means unbounded above
    pub maximum: Option<u64>,
}

impl TimeoutBounds {
    /// Check a value, returning the violated bound and its limit
    pub fn check(&self, value: u64) -> Result<(), (Bound, u64)> {
        if value < self.minimum {
            return Err((Bound::Minimum, self.minimum));
        }
        match self.maximum {
            Some(max) if value > max => Err((Bound::Maximum, max)),
            _ => Ok(()),
        }
    }

    /// Returns `true` if the default itself lies within the bounds
    pub fn is_consistent(&self) -> bool {
        self.check(self.default).is_ok()
    }
}

/// Lock and statement bounds of one lock class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassPolicy {
    pub lock: TimeoutBounds,
    pub statement: TimeoutBounds,
}

impl ClassPolicy {
    fn bounds(&self, kind: TimeoutKind) -> &TimeoutBounds {
        match kind {
            TimeoutKind::Lock => &self.lock,
            TimeoutKind::Statement => &self.statement,
        }
    }
}

/// Timeouts assigned to an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedTimeouts {
    pub lock_timeout: u64,
    pub statement_timeout: u64,
}

/// A single override that fell outside its class bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    pub kind: TimeoutKind,
    pub lock_class: LockClass,
    pub bound: Bound,
    pub limit: u64,
    pub value: u64,
}

impl OutOfBounds {
    /// Distance between the value and the violated limit
    pub fn delta(&self) -> u64 {
        self.value.abs_diff(self.limit)
    }
}

/// Per-class timeout policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub exclusive: ClassPolicy,
    pub concurrent: ClassPolicy,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            exclusive: ClassPolicy {
                lock: TimeoutBounds {
                    default: DEFAULT_ACCESS_EXCLUSIVE_LOCK_TIMEOUT,
                    minimum: MINIMUM_TIMEOUT,
                    maximum: Some(DEFAULT_ACCESS_EXCLUSIVE_LOCK_TIMEOUT_LIMIT),
                },
                statement: TimeoutBounds {
                    default: DEFAULT_ACCESS_EXCLUSIVE_STATEMENT_TIMEOUT,
                    minimum: MINIMUM_TIMEOUT,
                    maximum: Some(DEFAULT_ACCESS_EXCLUSIVE_STATEMENT_TIMEOUT_LIMIT),
                },
            },
            concurrent: ClassPolicy {
                lock: TimeoutBounds {
                    default: DEFAULT_CONCURRENT_TIMEOUT_LIMIT,
                    minimum: DEFAULT_CONCURRENT_TIMEOUT_LIMIT,
                    maximum: None,
                },
                statement: TimeoutBounds {
                    default: DEFAULT_CONCURRENT_TIMEOUT_LIMIT,
                    minimum: DEFAULT_CONCURRENT_TIMEOUT_LIMIT,
                    maximum: None,
                },
            },
        }
    }
}

impl TimeoutPolicy {
    /// Policy for one lock class
    pub fn class(&self, lock_class: LockClass) -> &ClassPolicy {
        match lock_class {
            LockClass::Exclusive => &self.exclusive,
            LockClass::Concurrent => &self.concurrent,
        }
    }

    /// Resolve the timeouts of one instruction of the given class.
    ///
    /// Pure: the same inputs always give the same result. Both overrides
    /// are checked so every violation is reported at once.
    pub fn resolve(
        &self,
        lock_class: LockClass,
        overrides: &TimeoutOverrides,
    ) -> Result<ResolvedTimeouts, Vec<OutOfBounds>> {
        let policy = self.class(lock_class);
        let mut violations = Vec::new();
        let mut pick = |kind: TimeoutKind, declared: Option<u64>| -> u64 {
            let bounds = policy.bounds(kind);
            match declared {
                Some(value) => {
                    if let Err((bound, limit)) = bounds.check(value) {
                        violations.push(OutOfBounds {
                            kind,
                            lock_class,
                            bound,
                            limit,
                            value,
                        });
                    }
                    value
                }
                None => bounds.default,
            }
        };

        let lock_timeout = pick(TimeoutKind::Lock, overrides.lock_timeout);
        let statement_timeout = pick(TimeoutKind::Statement, overrides.statement_timeout);

        if violations.is_empty() {
            Ok(ResolvedTimeouts {
                lock_timeout,
                statement_timeout,
            })
        } else {
            Err(violations)
        }
    }

    /// Resolve every instruction of a migration.
    ///
    /// Overrides apply to instructions of [`Migration::override_class`];
    /// every other instruction gets its class defaults.
    ///
    /// All-or-nothing: on any violation no instruction is touched and every
    /// violation is returned as a [`CompileError::TimeoutOutOfBounds`].
    pub fn resolve_migration(
        &self,
        migration: &mut Migration,
        registry: &ProcedureRegistry,
    ) -> Result<(), Vec<CompileError>> {
        let overrides = *migration.overrides();
        let override_class = migration.override_class(registry);
        let class_defaults = TimeoutOverrides::default();
        let mut resolved = Vec::new();
        let mut errors = Vec::new();

        for (position, instruction) in migration.instructions() {
            let Some(lock_class) = instruction.lock_class(registry) else {
                errors.push(CompileError::DefinitionError {
                    message: format!("{}: procedure is not registered", position),
                });
                continue;
            };
            let declared = if Some(lock_class) == override_class {
                &overrides
            } else {
                &class_defaults
            };
            match self.resolve(lock_class, declared) {
                Ok(timeouts) => resolved.push(timeouts),
                Err(violations) => {
                    errors.extend(violations.into_iter().map(|v| {
                        CompileError::TimeoutOutOfBounds {
                            instruction: position.to_string(),
                            kind: v.kind,
                            lock_class: v.lock_class,
                            bound: v.bound,
                            limit: v.limit,
                            value: v.value,
                            delta: v.delta(),
                        }
                    }));
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        for (instruction, timeouts) in migration.instructions_mut().zip(resolved) {
            instruction.apply_timeouts(timeouts);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "timeout_test.rs"]
mod tests;
