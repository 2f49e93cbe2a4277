//! `{placeholder}` substitution for configured command lines.
//!
//! Backend and context-tool commands are configured as strings such as
//! `gemini --yolo --model {model}`. This engine fills in the placeholders
//! before the string is split into arguments.
//!
//! # Syntax
//!
//! - `{name}` - Substitutes the value of variable `name`
//! - `{{` - Renders as literal `{`
//! - `}}` - Renders as literal `}`
//!
//! Undefined variables are an error, never an empty substitution.

use std::collections::HashMap;
use thiserror::Error;

/// Why a command template could not be filled. Positions are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    #[error("undefined placeholder '{name}' at position {position}")]
    UndefinedVariable { name: String, position: usize },

    #[error("unmatched '{{' at position {position}")]
    UnmatchedBrace { position: usize },

    #[error("empty placeholder '{{}}' at position {position}")]
    EmptyVariableName { position: usize },
}

/// Substitute `{name}` placeholders in `template` with values from `variables`.
pub fn fill_placeholders(
    template: &str,
    variables: &HashMap<&str, &str>,
) -> Result<String, PlaceholderError> {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(brace) = rest.find(['{', '}']) {
        let position = template.len() - rest.len() + brace;
        filled.push_str(&rest[..brace]);
        let tail = &rest[brace..];

        // `{{` and `}}` collapse to one brace; a lone `}` is literal.
        if tail.starts_with("{{") || tail.starts_with("}}") || tail.starts_with('}') {
            let width = if tail[1..].starts_with(&tail[..1]) { 2 } else { 1 };
            filled.push_str(&tail[..1]);
            rest = &tail[width..];
            continue;
        }

        let body = &tail[1..];
        let close = body
            .find('}')
            .ok_or(PlaceholderError::UnmatchedBrace { position })?;
        let name = body[..close].trim();
        if name.is_empty() {
            return Err(PlaceholderError::EmptyVariableName { position });
        }

        let value = variables
            .get(name)
            .ok_or_else(|| PlaceholderError::UndefinedVariable {
                name: name.to_string(),
                position,
            })?;
        filled.push_str(value);
        rest = &body[close + 1..];
    }

    filled.push_str(rest);
    Ok(filled)
}
