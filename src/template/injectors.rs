//! Context injectors exposed to templates.
//!
//! Templates call `context(path)` to embed a codebase summary and `read(path)`
//! to embed a file. Both run synchronously during rendering and never fail:
//! a failing tool yields an inline error marker, an unreadable file yields an
//! empty string, and each failure is logged as a warning.

use crate::command::CommandLine;
use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Capability interface for the side-effecting template functions.
pub trait Injectors: Send + Sync {
    /// Summarize the codebase under `path`.
    fn fetch_context(&self, path: &str) -> String;

    /// Read the file at `path`, or return an empty string.
    fn read_file(&self, path: &str) -> String;
}

/// Wrap a codebase summary in the delimiting tag.
pub fn wrap_context(path: &str, output: &str) -> String {
    format!(
        "<CODEBASE_CONTEXT path=\"{}\">\n{}\n</CODEBASE_CONTEXT>",
        path, output
    )
}

/// Placeholder substituted when the context tool fails.
pub fn context_error_marker(path: &str) -> String {
    format!("[Error generating context for {}]", path)
}

/// Production injectors: an external summarization command and the local disk.
#[derive(Debug, Clone)]
pub struct ShellInjectors {
    working_dir: PathBuf,
    context_command: String,
}

impl ShellInjectors {
    /// `context_command` is a command template with a `{path}` placeholder.
    pub fn new(working_dir: PathBuf, context_command: String) -> Self {
        Self {
            working_dir,
            context_command,
        }
    }

    fn run_context_tool(&self, path: &str) -> Result<String, String> {
        let vars = HashMap::from([("path", path)]);
        let command_line = CommandLine::from_template(&self.context_command, &vars)
            .map_err(|e| e.to_string())?;

        let output = command_line
            .to_command()
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| format!("failed to run '{}': {}", command_line.program, e))?;

        if !output.status.success() {
            return Err(format!(
                "'{}' exited with {}",
                command_line.display(),
                output.status
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

impl Injectors for ShellInjectors {
    fn fetch_context(&self, path: &str) -> String {
        if path.trim().is_empty() {
            warn!("[Context] Error generating context: no path given");
            return context_error_marker(path);
        }

        info!("[Context] Analyzing codebase at: {}", path);
        match self.run_context_tool(path) {
            Ok(output) => wrap_context(path, &output),
            Err(reason) => {
                warn!("[Context] Error generating context for {}: {}", path, reason);
                context_error_marker(path)
            }
        }
    }

    fn read_file(&self, path: &str) -> String {
        if path.trim().is_empty() {
            warn!("[Read] Warning: Could not read file: no path given");
            return String::new();
        }

        let resolved = self.resolve(path);
        match std::fs::read_to_string(&resolved) {
            Ok(content) => content,
            Err(e) => {
                warn!("[Read] Warning: Could not read file: {} ({})", path, e);
                String::new()
            }
        }
    }
}
