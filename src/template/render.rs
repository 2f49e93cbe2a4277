//! Template rendering with minijinja.
//!
//! The environment mirrors what prompt authors expect from a Jinja-style
//! engine: no HTML escaping, `trim_blocks` and `lstrip_blocks` so block tags
//! do not leave blank lines behind, and lenient handling of undefined
//! variables. `{% include %}` and `{% extends %}` resolve against the same
//! search directories as the top-level template.

use super::Variables;
use super::injectors::Injectors;
use super::locator::ResolvedTemplate;
use crate::error::{RelayError, Result};
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Build a renderer whose `context()` / `read()` functions call `injectors`.
    pub fn new(injectors: Arc<dyn Injectors>, search_dirs: Vec<PathBuf>) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        env.set_loader(move |name| load_from_dirs(&search_dirs, name));

        // A missing argument reaches the injector as an empty path, which it
        // degrades like any other bad path.
        let context_source = Arc::clone(&injectors);
        env.add_function("context", move |path: Option<String>| {
            context_source.fetch_context(path.as_deref().unwrap_or_default())
        });
        env.add_function("read", move |path: Option<String>| {
            injectors.read_file(path.as_deref().unwrap_or_default())
        });

        Self { env }
    }

    /// Render `template` with `vars`.
    ///
    /// Syntax errors are reported with the template's resolved path.
    pub fn render(&self, template: &ResolvedTemplate, vars: &Variables) -> Result<String> {
        self.env
            .render_str(&template.raw_text, vars)
            .map_err(|source| RelayError::Render {
                path: template.path.clone(),
                source,
            })
    }
}

fn load_from_dirs(
    search_dirs: &[PathBuf],
    name: &str,
) -> std::result::Result<Option<String>, minijinja::Error> {
    let relative = Path::new(name);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Ok(None);
    }

    for dir in search_dirs {
        let candidate = dir.join(relative);
        if candidate.is_file() {
            return std::fs::read_to_string(&candidate).map(Some).map_err(|e| {
                minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    format!("could not read template '{}'", candidate.display()),
                )
                .with_source(e)
            });
        }
    }

    Ok(None)
}
