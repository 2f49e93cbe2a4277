//! Config loading and validation.

use super::model::Config;
use super::settings::CONFIG_FILE_NAME;
use crate::error::{RelayError, Result};
use std::path::Path;

impl Config {
    /// Find the config for a run.
    ///
    /// An explicit `--config` path must exist. Otherwise
    /// `<project_root>/.prompt-relay.yaml` is used when present, and the
    /// built-in defaults when it is not.
    pub fn discover(explicit: Option<&Path>, project_root: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path)?.ok_or_else(|| {
                RelayError::UserError(format!("config file '{}' does not exist", path.display()))
            });
        }

        Ok(Self::load(project_root.join(CONFIG_FILE_NAME))?.unwrap_or_default())
    }

    /// Load config from a YAML file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    /// Returns `Err` if the file exists but cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content).map(Some)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| RelayError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `backend_command` must be non-empty and contain a `{model}` placeholder
    /// - `search_dirs` must not be empty
    /// - `template_extension` must not have a leading dot
    pub fn validate(&self) -> Result<()> {
        if self.backend_command.trim().is_empty() {
            return Err(RelayError::UserError(
                "config validation failed: backend_command must be non-empty".to_string(),
            ));
        }

        if !self.backend_command.contains("{model}") {
            return Err(RelayError::UserError(format!(
                "config validation failed: backend_command must contain a {{model}} placeholder (found '{}')",
                self.backend_command
            )));
        }

        if self.search_dirs.is_empty() {
            return Err(RelayError::UserError(
                "config validation failed: search_dirs must list at least one directory"
                    .to_string(),
            ));
        }

        if self.template_extension.starts_with('.') {
            return Err(RelayError::UserError(format!(
                "config validation failed: template_extension must not have a leading dot (found '{}'). Use '{}' instead.",
                self.template_extension,
                self.template_extension.trim_start_matches('.')
            )));
        }

        Ok(())
    }
}
