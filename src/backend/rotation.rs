//! The model rotation engine.
//!
//! One round walks the model queue in order and runs each backend until one
//! succeeds. Rate-limited attempts move on to the next model; any other
//! failure ends the round immediately. Attempts are strictly sequential.

use super::{Attempt, Backend, Classification};
use crate::error::{RelayError, Result};
use colored::Colorize;
use log::{error, info, warn};

/// How a round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// A backend exited 0; `output` is its captured stdout.
    Success { output: String },
    /// A backend failed without a rate-limit signature, or could not start.
    Fatal {
        backend: String,
        exit_code: i32,
        spawn_error: Option<String>,
    },
    /// Every model was rate limited.
    Exhausted,
}

/// Every attempt made in one round, in order, and the round's outcome.
#[derive(Debug, Clone)]
pub struct Round {
    pub attempts: Vec<Attempt>,
    pub outcome: RoundOutcome,
}

impl Round {
    #[cfg(test)]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RoundOutcome::Success { .. })
    }

    /// Exit code this round would give the process.
    #[cfg(test)]
    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            RoundOutcome::Success { .. } => crate::exit_codes::SUCCESS,
            RoundOutcome::Fatal { exit_code, .. } => *exit_code,
            RoundOutcome::Exhausted => crate::exit_codes::FAILURE,
        }
    }

    /// The successful output, or the error describing why the round failed.
    pub fn into_output(self) -> Result<String> {
        match self.outcome {
            RoundOutcome::Success { output } => Ok(output),
            RoundOutcome::Fatal {
                backend,
                spawn_error: Some(reason),
                ..
            } => Err(RelayError::Spawn { backend, reason }),
            RoundOutcome::Fatal {
                backend, exit_code, ..
            } => Err(RelayError::BackendFailed {
                backend,
                code: exit_code,
            }),
            RoundOutcome::Exhausted => Err(RelayError::Exhausted {
                attempted: self.attempts.into_iter().map(|a| a.backend_id).collect(),
            }),
        }
    }
}

/// Run `prompt` against `models` in order until one succeeds.
///
/// An empty queue yields `Exhausted` with no attempts; callers guarantee a
/// non-empty queue via `Settings::model_queue`.
pub fn rotate<B: Backend + ?Sized>(backend: &mut B, prompt: &str, models: &[String]) -> Round {
    let mut attempts = Vec::with_capacity(models.len());

    for (index, model) in models.iter().enumerate() {
        info!("[Agent] Attempting with model: {}...", model.cyan());
        let attempt = backend.attempt(model, prompt);

        match attempt.classification {
            Classification::Success => {
                let output = attempt.stdout.clone();
                attempts.push(attempt);
                return Round {
                    attempts,
                    outcome: RoundOutcome::Success { output },
                };
            }
            Classification::RetryableExhaustion => {
                warn!(
                    "[Agent] Model {} exhausted (429). Duration: {}ms",
                    model,
                    attempt.elapsed.as_millis()
                );
                attempts.push(attempt);
                if index + 1 < models.len() {
                    info!("[Agent] Switching to next model...");
                }
            }
            Classification::FatalFailure => {
                match &attempt.spawn_error {
                    Some(reason) => error!("[Agent] Failed to spawn backend ({}): {}", model, reason),
                    None => error!(
                        "[Agent] Model {} failed with exit code {}",
                        model, attempt.exit_code
                    ),
                }
                error!("[Agent] All attempts failed.");
                let outcome = RoundOutcome::Fatal {
                    backend: model.clone(),
                    exit_code: attempt.exit_code,
                    spawn_error: attempt.spawn_error.clone(),
                };
                attempts.push(attempt);
                return Round { attempts, outcome };
            }
        }
    }

    error!("[Agent] All attempts failed.");
    Round {
        attempts,
        outcome: RoundOutcome::Exhausted,
    }
}
