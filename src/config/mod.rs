//! Configuration for prompt-relay.
//!
//! This module defines the Config struct that represents `.prompt-relay.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and validation of config values.
//! [`Settings`] is the resolved form handed to the orchestrator.

mod model;
mod operations;
mod settings;
pub mod types;


// Re-export public API
pub use model::Config;
pub use settings::Settings;
pub use types::{ModuleKind, ModuleRoot};
