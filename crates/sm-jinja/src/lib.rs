//! sm-jinja - Templating layer for safemig
//!
//! Renders resolved migrations as ActiveRecord classes through a minijinja
//! environment. Every built-in procedure has a template; custom procedures
//! bring their own or fall back to a generic method call. Templates get the
//! `sym`, `ruby` and `kwargs` filters for emitting Ruby literals.

pub mod environment;
pub mod error;
pub(crate) mod filters;
pub mod renderer;
pub mod templates;

pub use environment::JinjaEnvironment;
pub use error::{JinjaError, JinjaResult};
pub use renderer::ActiveRecordRenderer;
