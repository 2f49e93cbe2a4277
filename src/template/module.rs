//! Module resolution.
//!
//! `--module billing` targets a module directory under one of the configured
//! module roots. Roots are probed in order (front-end before back-end by
//! default) and the first hit supplies the render variables `module_root`,
//! `module_name`, `module_type` and `root_path`.

use super::Variables;
use crate::config::{ModuleKind, ModuleRoot};
use crate::error::{RelayError, Result};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// A module found under one of the module roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleContext {
    pub name: String,
    pub root: PathBuf,
    pub kind: ModuleKind,
    /// `root` followed by a single `/`.
    pub root_with_slash: String,
}

impl ModuleContext {
    /// Merge the module variables into `vars`, replacing any existing values.
    pub fn apply(&self, vars: &mut Variables) {
        vars.insert(
            "module_root".to_string(),
            Value::String(self.root.display().to_string()),
        );
        vars.insert("module_name".to_string(), Value::String(self.name.clone()));
        vars.insert(
            "module_type".to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        vars.insert(
            "root_path".to_string(),
            Value::String(self.root_with_slash.clone()),
        );
    }
}

/// Find the directory named `name` under the first root that contains it.
pub fn resolve_module(name: &str, roots: &[ModuleRoot]) -> Result<ModuleContext> {
    let not_found = || RelayError::ModuleNotFound {
        name: name.to_string(),
        roots: roots.iter().map(|r| r.path.clone()).collect(),
    };

    // An empty or `..` name would resolve to a root itself or escape it.
    if !is_plain_relative(name) {
        return Err(not_found());
    }

    let (root, kind) = roots
        .iter()
        .map(|r| (r.path.join(name), r.kind))
        .find(|(candidate, _)| candidate.is_dir())
        .ok_or_else(not_found)?;

    Ok(ModuleContext {
        name: name.to_string(),
        root_with_slash: with_trailing_slash(&root),
        root,
        kind,
    })
}

/// Render `path` as a string ending in exactly one `/`.
pub fn with_trailing_slash(path: &Path) -> String {
    let text = path.display().to_string();
    format!("{}/", text.trim_end_matches('/'))
}

fn is_plain_relative(name: &str) -> bool {
    let path = Path::new(name);
    !name.trim().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().any(|c| matches!(c, Component::Normal(_)))
}
