//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for prompt rendering and model rotation.
///
/// This struct represents the contents of `.prompt-relay.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
/// Relative paths are resolved against the project root, see [`super::Settings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Templates
    // =========================================================================
    /// Directories probed in order for `<name>.<template_extension>`.
    #[serde(default = "default_search_dirs")]
    pub search_dirs: Vec<PathBuf>,

    /// Extension appended to template names that lack it (default: "md").
    #[serde(default = "default_template_extension")]
    pub template_extension: String,

    /// Module roots probed in order by `--module`.
    #[serde(default = "default_module_roots")]
    pub module_roots: Vec<ModuleRoot>,

    /// Command producing a codebase summary; `{path}` is the target directory.
    #[serde(default = "default_context_command")]
    pub context_command: String,

    // =========================================================================
    // Backends
    // =========================================================================
    /// Default rotation order when `--models` is not given.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Backend command; `{model}` is replaced with the model identifier.
    /// The prompt is written to the process's stdin.
    #[serde(default = "default_backend_command")]
    pub backend_command: String,

    // =========================================================================
    // Runtime
    // =========================================================================
    /// Directory for the active prompt buffer (default: the system temp dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_dirs: default_search_dirs(),
            template_extension: default_template_extension(),
            module_roots: default_module_roots(),
            context_command: default_context_command(),
            models: default_models(),
            backend_command: default_backend_command(),
            temp_dir: None,
        }
    }
}
