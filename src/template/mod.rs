//! Prompt templates: lookup, module context, injectors and rendering.
//!
//! # Template Syntax
//!
//! Templates are Jinja-style documents:
//!
//! ```text
//! # Review {{ module_name }}
//!
//! {% if module_root %}
//! {{ context(module_root) }}
//! {% endif %}
//!
//! {{ read("docs/conventions.md") }}
//! ```
//!
//! Every CLI flag that the orchestrator does not consume is available as a
//! variable, alongside `module_root`, `module_name`, `module_type` and
//! `root_path` when a module is targeted.

mod injectors;
mod locator;
mod module;
mod render;

pub use injectors::{Injectors, ShellInjectors};
#[cfg(test)]
pub use injectors::{context_error_marker, wrap_context};
pub use locator::locate;
pub use module::{resolve_module, with_trailing_slash};
pub use render::Renderer;

use std::collections::BTreeMap;

/// Variables available to a template.
pub type Variables = BTreeMap<String, serde_json::Value>;
