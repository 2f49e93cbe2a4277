//! Error types for the `prompt` CLI.
//!
//! Uses thiserror for derive macros and provides operator-actionable messages.
//! Injector failures (context tool or `read` errors) never surface here: they
//! degrade to placeholder text inside the rendered prompt.

use crate::exit_codes;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for prompt-relay operations.
///
/// Each variant maps to an exit code via [`RelayError::exit_code`].
#[derive(Error, Debug)]
pub enum RelayError {
    /// No search directory contained the requested template.
    #[error("prompt file '{name}' not found in any of the search directories:{}", list_paths(.searched))]
    TemplateNotFound { name: String, searched: Vec<PathBuf> },

    /// The requested module exists under none of the module roots.
    #[error("module '{name}' not found in any of the module roots:{}", list_paths(.roots))]
    ModuleNotFound { name: String, roots: Vec<PathBuf> },

    /// The template itself is malformed.
    #[error("failed to render template '{}': {source}", .path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },

    /// The backend executable could not be started.
    #[error("failed to spawn backend for model '{backend}': {reason}")]
    Spawn { backend: String, reason: String },

    /// A backend exited non-zero without a rate-limit signature.
    #[error("backend for model '{backend}' failed with exit code {code}")]
    BackendFailed { backend: String, code: i32 },

    /// Every backend in the rotation reported capacity exhaustion.
    #[error("all attempts failed: every model was rate limited ({})", .attempted.join(", "))]
    Exhausted { attempted: Vec<String> },

    /// Invalid arguments, configuration, or an unreadable template file.
    #[error("{0}")]
    UserError(String),

    /// Operator input or the working directory could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RelayError::TemplateNotFound { .. } => exit_codes::FAILURE,
            RelayError::ModuleNotFound { .. } => exit_codes::FAILURE,
            RelayError::Render { .. } => exit_codes::FAILURE,
            RelayError::Spawn { .. } => exit_codes::SPAWN_FAILURE,
            RelayError::BackendFailed { code, .. } => *code,
            RelayError::Exhausted { .. } => exit_codes::FAILURE,
            RelayError::UserError(_) => exit_codes::FAILURE,
            RelayError::Io(_) => exit_codes::FAILURE,
        }
    }
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("\n  - {}", p.display()))
        .collect()
}

/// Result type alias for prompt-relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
