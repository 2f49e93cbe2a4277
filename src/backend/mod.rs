//! Model backends and the rotation engine.
//!
//! A backend is an external command-line model runner invoked once per
//! attempt with the prompt on stdin. Each attempt is classified from its exit
//! code and captured stderr:
//!
//! - exit 0: **Success**, rotation stops
//! - non-zero with a rate-limit signature in stderr: **RetryableExhaustion**,
//!   rotation moves on to the next model
//! - any other non-zero exit, or a failure to start: **FatalFailure**,
//!   rotation stops and the failure propagates
//!
//! Rate limiting is the only condition that triggers rotation.

mod executor;
mod rotation;

pub use executor::CommandBackend;
pub use rotation::rotate;

use std::time::Duration;

/// Substrings of stderr that mark a failure as capacity exhaustion.
pub const RATE_LIMIT_SIGNATURES: [&str; 3] =
    ["429", "exhausted your capacity", "ResourceExhausted"];

/// How an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    RetryableExhaustion,
    FatalFailure,
}

/// Classify an exited backend process.
pub fn classify(exit_code: i32, stderr: &str) -> Classification {
    if exit_code == 0 {
        Classification::Success
    } else if is_rate_limited(stderr) {
        Classification::RetryableExhaustion
    } else {
        Classification::FatalFailure
    }
}

/// Whether `stderr` contains any rate-limit signature.
pub fn is_rate_limited(stderr: &str) -> bool {
    RATE_LIMIT_SIGNATURES.iter().any(|sig| stderr.contains(sig))
}

/// Result of running one backend once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub backend_id: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub classification: Classification,
    pub elapsed: Duration,
    /// Set when the process could not be started.
    pub spawn_error: Option<String>,
}

impl Attempt {
    /// Build an attempt for a process that ran to completion.
    pub fn finished(
        backend_id: &str,
        exit_code: i32,
        stdout: String,
        stderr: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            backend_id: backend_id.to_string(),
            classification: classify(exit_code, &stderr),
            exit_code,
            stdout,
            stderr,
            elapsed,
            spawn_error: None,
        }
    }

    /// Build an attempt for a process that never started.
    pub fn spawn_failed(backend_id: &str, reason: String, elapsed: Duration) -> Self {
        Self {
            backend_id: backend_id.to_string(),
            exit_code: crate::exit_codes::SPAWN_FAILURE,
            stdout: String::new(),
            stderr: String::new(),
            classification: Classification::FatalFailure,
            elapsed,
            spawn_error: Some(reason),
        }
    }
}

/// Something that can run a prompt against a named model.
pub trait Backend {
    fn attempt(&mut self, model: &str, prompt: &str) -> Attempt;
}
