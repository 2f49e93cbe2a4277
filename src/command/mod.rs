//! Configured command lines for external tools.
//!
//! Both the model backend and the codebase-context tool are configured as
//! command templates. A template is filled with `{placeholder}` values and
//! then split into a program and its arguments with shell-words, so no shell
//! is involved when the process is spawned.

mod template;

use template::fill_placeholders;

use crate::error::{RelayError, Result};
use std::collections::HashMap;
use std::process::Command;

/// A parsed command ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Render `template` with `variables` and split it into program + args.
    pub fn from_template(template: &str, variables: &HashMap<&str, &str>) -> Result<Self> {
        let rendered = fill_placeholders(template, variables).map_err(|e| {
            RelayError::UserError(format!("invalid command template '{}': {}", template, e))
        })?;

        let mut words = shell_words::split(&rendered).map_err(|e| {
            RelayError::UserError(format!(
                "failed to parse command '{}': {}\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                rendered, e
            ))
        })?;

        if words.is_empty() {
            return Err(RelayError::UserError(format!(
                "command is empty after parsing: '{}'",
                rendered
            )));
        }

        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
        })
    }

    /// Build a `std::process::Command` with no stdio configuration applied.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    /// Quote the command back into a single display string.
    pub fn display(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }
}
