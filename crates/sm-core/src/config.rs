//! Configuration types and parsing for safemig.yml

use crate::error::{CoreError, CoreResult};
use crate::lockfile::Lockfile;
use crate::procedure::{LockClass, ProcedureDef, ProcedureRegistry};
use crate::selector::FileSelection;
use crate::timeout::{
    ClassPolicy, TimeoutBounds, TimeoutPolicy, DEFAULT_ACCESS_EXCLUSIVE_LOCK_TIMEOUT,
    DEFAULT_ACCESS_EXCLUSIVE_LOCK_TIMEOUT_LIMIT, DEFAULT_ACCESS_EXCLUSIVE_STATEMENT_TIMEOUT,
    DEFAULT_ACCESS_EXCLUSIVE_STATEMENT_TIMEOUT_LIMIT, DEFAULT_CONCURRENT_TIMEOUT_LIMIT,
    MINIMUM_TIMEOUT,
};
use crate::validation::Validator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Config file names searched in a project directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["safemig.yml", "safemig.yaml"];

/// Project configuration from safemig.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding migration definitions
    #[serde(default = "default_migration_directory")]
    pub migration_directory: String,

    /// Directory compiled migrations are written to
    #[serde(default = "default_output_directory")]
    pub output_directory: String,

    /// Directory holding `.safemiglock.yml`
    #[serde(default = "default_lockfile_directory")]
    pub lockfile_directory: String,

    /// Default selector when `--files` is not given
    #[serde(default = "default_compile_files")]
    pub compile_files: String,

    /// Output renderer
    #[serde(default)]
    pub renderer: RendererKind,

    /// Framework version written into the migration superclass
    #[serde(default = "default_active_record_version")]
    pub active_record_version: String,

    #[serde(default = "default_exclusive_lock_timeout")]
    pub access_exclusive_lock_timeout: u64,

    #[serde(default = "default_exclusive_statement_timeout")]
    pub access_exclusive_statement_timeout: u64,

    /// Ceiling for author lock_timeout overrides on exclusive operations
    #[serde(default = "default_exclusive_lock_timeout_limit")]
    pub access_exclusive_lock_timeout_limit: u64,

    /// Ceiling for author statement_timeout overrides on exclusive operations
    #[serde(default = "default_exclusive_statement_timeout_limit")]
    pub access_exclusive_statement_timeout_limit: u64,

    /// Floor and default lock_timeout for concurrent operations
    #[serde(default = "default_concurrent_limit")]
    pub concurrent_lock_timeout_limit: u64,

    /// Floor and default statement_timeout for concurrent operations
    #[serde(default = "default_concurrent_limit")]
    pub concurrent_statement_timeout_limit: u64,

    /// Additional procedures, keyed by name
    #[serde(default)]
    pub custom_procedures: BTreeMap<String, CustomProcedureConfig>,

    /// Command the rendered output is piped through before it is written
    #[serde(default)]
    pub post_process: Option<PostProcessConfig>,
}

/// Available output renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    #[default]
    ActiveRecord,
}

impl RendererKind {
    /// Extension of compiled files
    pub fn file_extension(&self) -> &'static str {
        match self {
            RendererKind::ActiveRecord => "rb",
        }
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererKind::ActiveRecord => write!(f, "active_record"),
        }
    }
}

/// A procedure declared in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomProcedureConfig {
    pub lock_class: LockClass,

    /// Template body for the renderer; defaults to a generic method call
    #[serde(default)]
    pub template: Option<String>,

    /// The instruction must carry at least one of these options
    #[serde(default)]
    pub required_options: Vec<String>,

    /// Force the migration out of a DDL transaction
    #[serde(default)]
    pub non_transactional: bool,
}

/// Post-process hook command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostProcessConfig {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migration_directory: default_migration_directory(),
            output_directory: default_output_directory(),
            lockfile_directory: default_lockfile_directory(),
            compile_files: default_compile_files(),
            renderer: RendererKind::default(),
            active_record_version: default_active_record_version(),
            access_exclusive_lock_timeout: default_exclusive_lock_timeout(),
            access_exclusive_statement_timeout: default_exclusive_statement_timeout(),
            access_exclusive_lock_timeout_limit: default_exclusive_lock_timeout_limit(),
            access_exclusive_statement_timeout_limit: default_exclusive_statement_timeout_limit(),
            concurrent_lock_timeout_limit: default_concurrent_limit(),
            concurrent_statement_timeout_limit: default_concurrent_limit(),
            custom_procedures: BTreeMap::new(),
            post_process: None,
        }
    }
}

fn default_migration_directory() -> String {
    "db/safe_migrations".to_string()
}

fn default_output_directory() -> String {
    "db/migrate".to_string()
}

fn default_lockfile_directory() -> String {
    "db".to_string()
}

fn default_compile_files() -> String {
    "all".to_string()
}

fn default_active_record_version() -> String {
    "5.2".to_string()
}

fn default_exclusive_lock_timeout() -> u64 {
    DEFAULT_ACCESS_EXCLUSIVE_LOCK_TIMEOUT
}

fn default_exclusive_statement_timeout() -> u64 {
    DEFAULT_ACCESS_EXCLUSIVE_STATEMENT_TIMEOUT
}

fn default_exclusive_lock_timeout_limit() -> u64 {
    DEFAULT_ACCESS_EXCLUSIVE_LOCK_TIMEOUT_LIMIT
}

fn default_exclusive_statement_timeout_limit() -> u64 {
    DEFAULT_ACCESS_EXCLUSIVE_STATEMENT_TIMEOUT_LIMIT
}

fn default_concurrent_limit() -> u64 {
    DEFAULT_CONCURRENT_TIMEOUT_LIMIT
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory.
    /// Looks for safemig.yml or safemig.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Load from the directory, or fall back to defaults when no config
    /// file exists
    pub fn load_or_default(dir: &Path) -> CoreResult<Self> {
        match Self::load_from_dir(dir) {
            Err(CoreError::ConfigNotFound { path }) => {
                log::debug!("No config at {}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        for (field, value) in [
            ("migration_directory", &self.migration_directory),
            ("output_directory", &self.output_directory),
            ("lockfile_directory", &self.lockfile_directory),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{} cannot be empty", field),
                });
            }
        }

        FileSelection::parse(&self.compile_files)?;

        for (field, value) in [
            ("access_exclusive_lock_timeout_limit", self.access_exclusive_lock_timeout_limit),
            (
                "access_exclusive_statement_timeout_limit",
                self.access_exclusive_statement_timeout_limit,
            ),
            ("concurrent_lock_timeout_limit", self.concurrent_lock_timeout_limit),
            ("concurrent_statement_timeout_limit", self.concurrent_statement_timeout_limit),
        ] {
            if value < MINIMUM_TIMEOUT {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{} must be at least {}ms", field, MINIMUM_TIMEOUT),
                });
            }
        }

        for (field, value, limit) in [
            (
                "access_exclusive_lock_timeout",
                self.access_exclusive_lock_timeout,
                self.access_exclusive_lock_timeout_limit,
            ),
            (
                "access_exclusive_statement_timeout",
                self.access_exclusive_statement_timeout,
                self.access_exclusive_statement_timeout_limit,
            ),
        ] {
            if value < MINIMUM_TIMEOUT || value > limit {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "{} of {}ms must lie between {}ms and its limit of {}ms",
                        field, value, MINIMUM_TIMEOUT, limit
                    ),
                });
            }
        }

        for (name, procedure) in &self.custom_procedures {
            if name.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: "custom procedure names cannot be empty".to_string(),
                });
            }
            if ProcedureRegistry::is_builtin(name) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "custom procedure '{}' would shadow the built-in procedure",
                        name
                    ),
                });
            }
            if procedure.required_options.iter().any(|o| o.trim().is_empty()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("custom procedure '{}' lists an empty required option", name),
                });
            }
        }

        if let Some(hook) = &self.post_process {
            if hook.command.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: "post_process.command cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Timeout policy built from the configured values
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy {
            exclusive: ClassPolicy {
                lock: TimeoutBounds {
                    default: self.access_exclusive_lock_timeout,
                    minimum: MINIMUM_TIMEOUT,
                    maximum: Some(self.access_exclusive_lock_timeout_limit),
                },
                statement: TimeoutBounds {
                    default: self.access_exclusive_statement_timeout,
                    minimum: MINIMUM_TIMEOUT,
                    maximum: Some(self.access_exclusive_statement_timeout_limit),
                },
            },
            concurrent: ClassPolicy {
                lock: TimeoutBounds {
                    default: self.concurrent_lock_timeout_limit,
                    minimum: self.concurrent_lock_timeout_limit,
                    maximum: None,
                },
                statement: TimeoutBounds {
                    default: self.concurrent_statement_timeout_limit,
                    minimum: self.concurrent_statement_timeout_limit,
                    maximum: None,
                },
            },
        }
    }

    /// Built-in procedures plus every configured custom procedure
    pub fn procedure_registry(&self) -> CoreResult<ProcedureRegistry> {
        let mut registry = ProcedureRegistry::builtin();
        for (name, procedure) in &self.custom_procedures {
            registry.register(procedure.to_def(name))?;
        }
        Ok(registry)
    }

    /// Selection to use: the command-line selector if given, else `compile_files`
    pub fn file_selection(&self, cli_selector: Option<&str>) -> CoreResult<FileSelection> {
        FileSelection::parse(cli_selector.unwrap_or(&self.compile_files))
    }

    /// Get absolute migration directory
    pub fn migration_directory_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migration_directory)
    }

    /// Get absolute output directory
    pub fn output_directory_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.output_directory)
    }

    /// Full path of the lockfile
    pub fn lockfile_path(&self, root: &Path) -> PathBuf {
        Lockfile::path_in(&root.join(&self.lockfile_directory))
    }
}

impl CustomProcedureConfig {
    /// Turn the config entry into a registrable procedure
    pub fn to_def(&self, name: &str) -> ProcedureDef {
        let mut def = ProcedureDef::new(name, self.lock_class);
        if !self.required_options.is_empty() {
            def = def.with_validator(Validator::RequireAnyOption(self.required_options.clone()));
        }
        if let Some(template) = &self.template {
            def = def.with_template(template.clone());
        }
        if self.non_transactional || self.lock_class == LockClass::Concurrent {
            def = def.non_transactional();
        }
        def
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
