//! Backend subprocess executor.
//!
//! Spawns the configured backend command for one model, feeds the prompt on
//! stdin, and streams stdout and stderr. Every chunk read from the child is
//! written to the operator's stream and appended to a capture buffer in the
//! same step, so operators see output live while the run keeps a full copy
//! for classification and for the interactive transcript.
//!
//! The stdin writer and the stderr pump run on scoped threads that are joined
//! before the attempt returns. Without them a backend that fills one pipe
//! while the executor blocks on another would deadlock.

use super::{Attempt, Backend};
use crate::command::CommandLine;
use crate::exit_codes;
use log::debug;
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{ChildStdin, Stdio};
use std::thread;
use std::time::Instant;

/// Writer that forwards every chunk to `sink` and keeps a copy.
///
/// If the sink fails (for example a closed terminal pipe), echoing stops but
/// capturing continues.
struct Tee<'a, W: Write + ?Sized> {
    sink: &'a mut W,
    capture: Vec<u8>,
    echo: bool,
}

impl<W: Write + ?Sized> Write for Tee<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.echo && self.sink.write_all(buf).and_then(|()| self.sink.flush()).is_err() {
            self.echo = false;
        }
        self.capture.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Copy `reader` to `sink` chunk by chunk until EOF and return everything read.
pub fn pump<R: Read, W: Write + ?Sized>(mut reader: R, sink: &mut W) -> Vec<u8> {
    let mut tee = Tee {
        sink,
        capture: Vec::new(),
        echo: true,
    };
    if let Err(e) = io::copy(&mut reader, &mut tee) {
        debug!("stream ended with error: {}", e);
    }
    tee.capture
}

/// Runs the backend as `backend_command` with `{model}` filled in.
pub struct CommandBackend {
    command_template: String,
    working_dir: PathBuf,
    stdout_sink: Box<dyn Write + Send>,
    stderr_sink: Box<dyn Write + Send>,
}

impl CommandBackend {
    /// Echo backend output to this process's stdout and stderr.
    pub fn new(command_template: String, working_dir: PathBuf) -> Self {
        Self {
            command_template,
            working_dir,
            stdout_sink: Box::new(io::stdout()),
            stderr_sink: Box::new(io::stderr()),
        }
    }

    /// Replace the operator-facing streams.
    #[cfg(test)]
    pub fn with_sinks(
        mut self,
        stdout_sink: Box<dyn Write + Send>,
        stderr_sink: Box<dyn Write + Send>,
    ) -> Self {
        self.stdout_sink = stdout_sink;
        self.stderr_sink = stderr_sink;
        self
    }
}

impl Backend for CommandBackend {
    fn attempt(&mut self, model: &str, prompt: &str) -> Attempt {
        let start = Instant::now();

        let vars = HashMap::from([("model", model)]);
        let command_line = match CommandLine::from_template(&self.command_template, &vars) {
            Ok(command_line) => command_line,
            Err(e) => return Attempt::spawn_failed(model, e.to_string(), start.elapsed()),
        };

        let spawned = command_line
            .to_command()
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let reason = format!(
                    "failed to execute '{}': {}\n\
                     Fix: ensure the command is installed and in PATH.",
                    command_line.program, e
                );
                return Attempt::spawn_failed(model, reason, start.elapsed());
            }
        };

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let Self {
            stdout_sink,
            stderr_sink,
            ..
        } = self;

        let (out, err) = thread::scope(|scope| {
            scope.spawn(move || feed_stdin(stdin, prompt));
            let err_pump = scope.spawn(move || match stderr {
                Some(pipe) => pump(pipe, &mut **stderr_sink),
                None => Vec::new(),
            });
            let out = match stdout {
                Some(pipe) => pump(pipe, &mut **stdout_sink),
                None => Vec::new(),
            };
            (out, err_pump.join().unwrap_or_default())
        });

        let mut stderr_text = String::from_utf8_lossy(&err).into_owned();
        let exit_code = match child.wait() {
            // Terminated by a signal: no code, report a plain failure.
            Ok(status) => status.code().unwrap_or(exit_codes::FAILURE),
            Err(e) => {
                stderr_text.push_str(&format!("\nfailed to wait for backend: {}", e));
                exit_codes::FAILURE
            }
        };

        Attempt::finished(
            model,
            exit_code,
            String::from_utf8_lossy(&out).into_owned(),
            stderr_text,
            start.elapsed(),
        )
    }
}

/// Write the whole prompt, then close stdin so the backend sees EOF.
fn feed_stdin(stdin: Option<ChildStdin>, prompt: &str) {
    if let Some(mut stdin) = stdin
        && let Err(e) = stdin.write_all(prompt.as_bytes())
    {
        // The backend may exit without reading its input.
        debug!("could not deliver prompt to backend stdin: {}", e);
    }
}
