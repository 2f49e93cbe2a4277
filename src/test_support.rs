use crate::backend::{Attempt, Backend};
use crate::session::Operator;
use crate::template::{Injectors, context_error_marker, wrap_context};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) fn models(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// In-memory writer whose clones share one buffer.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Deterministic injectors: `context(p)` wraps `stub context for p`,
/// `read(p)` returns `stub file p` unless `p` is listed as missing.
#[derive(Default)]
pub(crate) struct StubInjectors {
    pub(crate) missing_files: Vec<String>,
    pub(crate) failing_contexts: Vec<String>,
}

impl Injectors for StubInjectors {
    fn fetch_context(&self, path: &str) -> String {
        if self.failing_contexts.iter().any(|p| p == path) {
            return context_error_marker(path);
        }
        wrap_context(path, &format!("stub context for {}", path))
    }

    fn read_file(&self, path: &str) -> String {
        if self.missing_files.iter().any(|p| p == path) {
            return String::new();
        }
        format!("stub file {}", path)
    }
}

/// Backend that replays scripted attempts per model, in order.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    script: Vec<(String, Attempt)>,
    calls: Vec<(String, String)>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(mut self, attempt: Attempt) -> Self {
        self.script.push((attempt.backend_id.clone(), attempt));
        self
    }

    pub(crate) fn succeed(self, model: &str, stdout: &str) -> Self {
        self.push(Attempt::finished(
            model,
            0,
            stdout.to_string(),
            String::new(),
            Duration::from_millis(5),
        ))
    }

    pub(crate) fn rate_limit(self, model: &str) -> Self {
        self.push(Attempt::finished(
            model,
            1,
            String::new(),
            "Error: 429 You have exhausted your capacity".to_string(),
            Duration::from_millis(5),
        ))
    }

    pub(crate) fn fail(self, model: &str, code: i32, stderr: &str) -> Self {
        self.push(Attempt::finished(
            model,
            code,
            String::new(),
            stderr.to_string(),
            Duration::from_millis(5),
        ))
    }

    pub(crate) fn spawn_error(self, model: &str) -> Self {
        self.push(Attempt::spawn_failed(
            model,
            "No such file or directory (os error 2)".to_string(),
            Duration::ZERO,
        ))
    }

    /// Models invoked so far, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Prompts delivered so far, in order.
    pub(crate) fn prompts(&self) -> Vec<String> {
        self.calls.iter().map(|(_, p)| p.clone()).collect()
    }
}

impl Backend for ScriptedBackend {
    fn attempt(&mut self, model: &str, prompt: &str) -> Attempt {
        self.calls.push((model.to_string(), prompt.to_string()));
        match self.script.iter().position(|(m, _)| m == model) {
            Some(index) => self.script.remove(index).1,
            None => Attempt::finished(
                model,
                99,
                String::new(),
                format!("unscripted call to {}", model),
                Duration::ZERO,
            ),
        }
    }
}

/// Operator that replays fixed lines, then reports closed input.
pub(crate) struct ScriptedOperator {
    lines: VecDeque<String>,
    fail: bool,
}

impl ScriptedOperator {
    pub(crate) fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            lines: VecDeque::new(),
            fail: true,
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl Operator for ScriptedOperator {
    fn ask(&mut self) -> io::Result<Option<String>> {
        if self.fail {
            return Err(io::Error::other("terminal went away"));
        }
        Ok(self.lines.pop_front())
    }
}
