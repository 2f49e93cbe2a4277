//! Interactive follow-up sessions.
//!
//! After a successful first round, `--interactive` keeps the conversation
//! going: the backend's output and each operator reply are appended to the
//! working prompt, and the whole prompt is sent through the rotation engine
//! again. The session has two states:
//!
//! - `Running`: waiting for the operator's next line
//! - `Terminated`: the operator typed `exit`/`quit` (any case, surrounding
//!   whitespace ignored), closed their input, or a round failed
//!
//! Blank lines are not special: they are sent as an empty turn.

use crate::backend::{Backend, rotate};
use crate::buffer::PromptBuffer;
use crate::error::{RelayError, Result};
use log::{info, warn};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io;

/// Source of operator replies.
pub trait Operator {
    /// Read one line. `Ok(None)` means the input is closed.
    fn ask(&mut self) -> io::Result<Option<String>>;
}

/// Reads replies from the terminal with line editing.
#[derive(Default)]
pub struct ConsoleOperator {
    editor: Option<DefaultEditor>,
}

impl ConsoleOperator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Operator for ConsoleOperator {
    fn ask(&mut self) -> io::Result<Option<String>> {
        let editor = match self.editor.take() {
            Some(editor) => editor,
            None => DefaultEditor::new().map_err(readline_to_io)?,
        };
        let editor = self.editor.insert(editor);

        println!("\n(Type \"exit\" or \"quit\" to end the session)");
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(err) => Err(readline_to_io(err)),
        }
    }
}

fn readline_to_io(err: ReadlineError) -> io::Error {
    match err {
        ReadlineError::Io(e) => e,
        other => io::Error::other(other.to_string()),
    }
}

/// Whether `line` ends the session.
pub fn is_termination(line: &str) -> bool {
    let line = line.trim().to_lowercase();
    line == "exit" || line == "quit"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Terminated,
}

/// One unit of appended conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    Assistant(String),
    User(String),
}

impl Turn {
    pub fn text(&self) -> &str {
        match self {
            Turn::Assistant(text) | Turn::User(text) => text,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    prompt: String,
    turns: Vec<Turn>,
    state: SessionState,
}

impl Session {
    /// Enter `Running` with the first round's output appended to `prompt`.
    pub fn start(prompt: String, first_output: String) -> Self {
        let mut session = Self {
            prompt,
            turns: Vec::new(),
            state: SessionState::Running,
        };
        session.push_assistant(first_output);
        session
    }

    #[cfg(test)]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[cfg(test)]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn push_assistant(&mut self, output: String) {
        self.prompt.push('\n');
        self.prompt.push_str(&output);
        self.turns.push(Turn::Assistant(output));
    }

    fn push_user(&mut self, line: String) {
        self.prompt.push_str("\nUser: ");
        self.prompt.push_str(&line);
        self.prompt.push('\n');
        self.turns.push(Turn::User(line));
    }

    /// Run follow-up rounds until the session terminates.
    ///
    /// Returns `Ok(())` when the operator ends the session and the failing
    /// round's error otherwise. `buffer` mirrors the working prompt after
    /// every change.
    pub fn run<B, O>(
        &mut self,
        backend: &mut B,
        operator: &mut O,
        models: &[String],
        buffer: &PromptBuffer,
    ) -> Result<()>
    where
        B: Backend + ?Sized,
        O: Operator + ?Sized,
    {
        self.mirror(buffer);

        while self.state == SessionState::Running {
            let line = match operator.ask() {
                Ok(Some(line)) if !is_termination(&line) => line,
                Ok(_) => {
                    self.state = SessionState::Terminated;
                    self.log_summary();
                    break;
                }
                Err(e) => {
                    self.state = SessionState::Terminated;
                    return Err(RelayError::Io(e));
                }
            };

            self.push_user(line);
            self.mirror(buffer);

            match rotate(backend, &self.prompt, models).into_output() {
                Ok(output) => {
                    self.push_assistant(output);
                    self.mirror(buffer);
                }
                Err(e) => {
                    self.state = SessionState::Terminated;
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    fn log_summary(&self) {
        let user_turns = self
            .turns
            .iter()
            .filter(|t| matches!(t, Turn::User(_)))
            .count();
        let transcript: usize = self.turns.iter().map(|t| t.text().len()).sum();
        info!(
            "[Agent] Session ended after {} follow-ups ({} bytes of conversation)",
            user_turns, transcript
        );
    }

    fn mirror(&self, buffer: &PromptBuffer) {
        if let Err(e) = buffer.update(&self.prompt) {
            warn!("[Buffer] Could not update active prompt file: {}", e);
        }
    }
}
