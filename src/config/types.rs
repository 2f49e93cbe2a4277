//! Config value types and their defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which deployment target a module belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Frontend,
    Backend,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Frontend => "frontend",
            ModuleKind::Backend => "backend",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directory that holds modules of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRoot {
    pub kind: ModuleKind,
    pub path: PathBuf,
}

/// Model used when neither the CLI nor the config yields any model.
pub const FALLBACK_MODEL: &str = "gemini-3-flash-preview";

pub(super) fn default_search_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("prompts"),
        PathBuf::from("packages/generator/prompts/agents"),
    ]
}

/// Front-end modules are probed before back-end modules.
pub(super) fn default_module_roots() -> Vec<ModuleRoot> {
    vec![
        ModuleRoot {
            kind: ModuleKind::Frontend,
            path: PathBuf::from("apps/frontend/modules"),
        },
        ModuleRoot {
            kind: ModuleKind::Backend,
            path: PathBuf::from("apps/backend/modules"),
        },
    ]
}

/// Fast tier first, heavier tier second.
pub(super) fn default_models() -> Vec<String> {
    vec![
        FALLBACK_MODEL.to_string(),
        "gemini-3-pro-preview".to_string(),
    ]
}

pub(super) fn default_backend_command() -> String {
    "gemini --yolo --model {model}".to_string()
}

pub(super) fn default_context_command() -> String {
    r#"npx -y repomix --stdout --quiet --style xml --include "{path}/**/*" --ignore "**/node_modules,**/dist""#
        .to_string()
}

pub(super) fn default_template_extension() -> String {
    "md".to_string()
}
