//! CLI argument parsing for prompt.
//!
//! Uses clap derive macros for the flags the orchestrator understands. Any
//! other flag is a template variable, so the raw argument list is split
//! before clap sees it: known flags (and their values) go to clap, the rest
//! are collected into [`Variables`].

use crate::template::Variables;
use clap::Parser;
use serde_json::{Number, Value};
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Any other flag becomes a template variable:
  --key=value, --key value   string, number or boolean
  --flag                     true
  --no-flag                  false

Examples:
  prompt review --target=src/foo.ts
  prompt spec-writer --module=user-profile
  prompt review --models=flash,gemini-3-pro-preview --interactive";

/// Flags handled by clap that take a value.
const KNOWN_WITH_VALUE: [&str; 4] = ["--module", "-m", "--models", "--config"];

/// Flags handled by clap that take no value.
const KNOWN_SWITCHES: [&str; 5] = ["--interactive", "--help", "-h", "--version", "-V"];

/// Prompt: render a prompt template and run it against rotating model backends.
#[derive(Parser, Debug)]
#[command(name = "prompt")]
#[command(author, version, about, long_about = None)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Template name, with or without its extension.
    pub template: Option<String>,

    /// Extra words, available to templates as `args`.
    #[arg(allow_negative_numbers = true)]
    pub args: Vec<String>,

    /// Target a module under the configured module roots.
    #[arg(short, long)]
    pub module: Option<String>,

    /// Comma-separated model rotation order.
    #[arg(long)]
    pub models: Option<String>,

    /// Keep the conversation going after the first answer.
    #[arg(long)]
    pub interactive: bool,

    /// Config file (default: .prompt-relay.yaml in the working directory).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Variables collected from unknown flags.
    #[arg(skip)]
    pub variables: Variables,
}

impl Cli {
    /// Parse command line arguments, exiting with usage on error.
    pub fn parse_args() -> Self {
        let raw = std::env::args_os().map(|a| a.to_string_lossy().into_owned());
        Self::try_parse_raw(raw).unwrap_or_else(|e| e.exit())
    }

    /// Parse an explicit argument list, program name first.
    pub fn try_parse_raw<I>(raw: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let (known, variables) = split_args(raw.into_iter().map(Into::into));
        Ok(Cli::try_parse_from(known)?.with_variables(variables))
    }

    fn with_variables(mut self, mut variables: Variables) -> Self {
        if !self.args.is_empty() {
            variables.entry("args".to_string()).or_insert_with(|| {
                Value::Array(self.args.iter().cloned().map(Value::String).collect())
            });
        }
        self.variables = variables;
        self
    }
}

/// Split raw arguments into clap's share and template variables.
///
/// The program name passes through. After `--` every token goes to clap as a
/// positional.
pub fn split_args<I>(raw: I) -> (Vec<String>, Variables)
where
    I: IntoIterator<Item = String>,
{
    let mut known = Vec::new();
    let mut variables = Variables::new();
    let mut tokens = raw.into_iter().peekable();

    if let Some(program) = tokens.next() {
        known.push(program);
    }

    while let Some(token) = tokens.next() {
        if token == "--" {
            known.push(token);
            known.extend(tokens.by_ref());
            break;
        }

        if !token.starts_with('-') || token == "-" || looks_numeric(&token) {
            known.push(token);
            continue;
        }

        let (flag, inline) = match token.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (token.clone(), None),
        };

        if KNOWN_WITH_VALUE.contains(&flag.as_str()) {
            known.push(token);
            if inline.is_none()
                && let Some(value) = tokens.next_if(|next| is_value(next))
            {
                known.push(value);
            }
            continue;
        }

        if KNOWN_SWITCHES.contains(&flag.as_str()) {
            // `--interactive=true` sets the switch, `=false` leaves it off.
            match inline.as_deref() {
                Some("true") => known.push(flag),
                Some("false") => {}
                _ => known.push(token),
            }
            continue;
        }

        if let Some(name) = flag.strip_prefix("--") {
            if let Some(value) = inline {
                insert(&mut variables, name, parse_value(&value));
            } else if let Some(negated) = name.strip_prefix("no-") {
                insert(&mut variables, negated, Value::Bool(false));
            } else if let Some(value) = tokens.next_if(|next| is_value(next)) {
                insert(&mut variables, name, parse_value(&value));
            } else {
                insert(&mut variables, name, Value::Bool(true));
            }
            continue;
        }

        // Short flags: `-k value`, `-k=value`, or `-abc` (each letter true).
        let letters = &flag[1..];
        if let Some(value) = inline {
            insert(&mut variables, letters, parse_value(&value));
        } else if letters.chars().count() > 1 {
            for letter in letters.chars() {
                insert(&mut variables, &letter.to_string(), Value::Bool(true));
            }
        } else if let Some(value) = tokens.next_if(|next| is_value(next)) {
            insert(&mut variables, letters, parse_value(&value));
        } else {
            insert(&mut variables, letters, Value::Bool(true));
        }
    }

    (known, variables)
}

/// Interpret a flag value: booleans, then integers, then floats, else text.
pub fn parse_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }

    if let Ok(f) = raw.parse::<f64>()
        && let Some(n) = Number::from_f64(f)
        && looks_numeric(raw)
    {
        return Value::Number(n);
    }

    Value::String(raw.to_string())
}

fn is_value(token: &str) -> bool {
    !token.starts_with('-') || looks_numeric(token)
}

/// Plain decimal notation only, so `inf`, `NaN` or `1e5x` stay text.
fn looks_numeric(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
        && digits.parse::<f64>().is_ok()
}

/// Set `name`; a repeated name collects its values into an array. Dashed
/// names are also reachable with underscores, since templates cannot spell
/// `dry-run` as an identifier.
fn insert(variables: &mut Variables, name: &str, value: Value) {
    if name.is_empty() {
        return;
    }

    if name.contains('-') {
        push_value(variables, name.replace('-', "_"), value.clone());
    }
    push_value(variables, name.to_string(), value);
}

fn push_value(variables: &mut Variables, key: String, value: Value) {
    match variables.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            variables.insert(key, value);
        }
    }
}
