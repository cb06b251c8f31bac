//! Error types for sm-jinja

use thiserror::Error;

/// Templating errors
#[derive(Error, Debug)]
pub enum JinjaError {
    /// Template render error (J001)
    #[error("[J001] Jinja render error: {0}")]
    RenderError(String),

    /// A procedure template failed to compile (J002)
    #[error("[J002] Invalid template for procedure '{procedure}': {message}")]
    InvalidTemplate { procedure: String, message: String },

    /// Instruction reached the renderer without resolved timeouts (J003)
    #[error("[J003] {instruction} has no resolved timeouts")]
    UnresolvedInstruction { instruction: String },

    /// Instructions of one direction disagree on their timeouts (J004)
    #[error("[J004] Instructions in '{direction}' resolve to different timeouts")]
    MixedTimeouts { direction: String },
}

/// Result type alias for JinjaError
pub type JinjaResult<T> = Result<T, JinjaError>;

impl From<minijinja::Error> for JinjaError {
    fn from(err: minijinja::Error) -> Self {
        JinjaError::RenderError(err.to_string())
    }
}
