//! Resolved runtime settings.
//!
//! `Settings` is what the orchestrator consumes. It is built once from a
//! [`Config`] plus an explicit working directory and temp directory, so no
//! code below `main` looks at the process environment.

use super::model::Config;
use super::types::{FALLBACK_MODEL, ModuleRoot};
use std::path::{Path, PathBuf};

/// Name of the optional config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = ".prompt-relay.yaml";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Working directory: base for relative config paths and `read()` paths.
    pub project_root: PathBuf,
    pub search_dirs: Vec<PathBuf>,
    pub template_extension: String,
    pub module_roots: Vec<ModuleRoot>,
    pub models: Vec<String>,
    pub backend_command: String,
    pub context_command: String,
    pub temp_dir: PathBuf,
}

impl Settings {
    /// Resolve `config` against `project_root`.
    ///
    /// `system_temp` is used when the config does not name a temp directory.
    pub fn resolve(config: Config, project_root: PathBuf, system_temp: PathBuf) -> Self {
        let absolute = |p: &Path| -> PathBuf {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                project_root.join(p)
            }
        };

        let search_dirs = config.search_dirs.iter().map(|d| absolute(d.as_path())).collect();
        let module_roots = config
            .module_roots
            .iter()
            .map(|r| ModuleRoot {
                kind: r.kind,
                path: absolute(r.path.as_path()),
            })
            .collect();
        let temp_dir = config
            .temp_dir
            .as_deref()
            .map(|d| absolute(d))
            .unwrap_or(system_temp);

        Self {
            search_dirs,
            module_roots,
            temp_dir,
            template_extension: config.template_extension,
            models: config.models,
            backend_command: config.backend_command,
            context_command: config.context_command,
            project_root,
        }
    }

    /// Pick the rotation order: CLI override, else configured defaults,
    /// else the single fallback model. A CLI list that parses empty goes
    /// straight to the fallback. Never returns an empty list.
    pub fn model_queue(&self, cli_models: Option<&str>) -> Vec<String> {
        if let Some(raw) = cli_models {
            let parsed = parse_model_list(raw);
            if parsed.is_empty() {
                return vec![FALLBACK_MODEL.to_string()];
            }
            return parsed;
        }

        let configured: Vec<String> = self
            .models
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if !configured.is_empty() {
            return configured;
        }

        vec![FALLBACK_MODEL.to_string()]
    }
}

/// Split a comma-separated model list, trimming entries and dropping empties.
pub fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
