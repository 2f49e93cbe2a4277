//! Exit code constants for the `prompt` CLI.
//!
//! - 0: Success (including a normal end of an interactive session)
//! - 1: Template or module not found, render failure, every backend exhausted
//! - 127: The backend executable could not be started
//!
//! Any other non-zero code is the exit code of the backend that failed.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Generic failure: lookup errors, render errors, exhausted rotation.
pub const FAILURE: i32 = 1;

/// The backend process could not be spawned at all.
pub const SPAWN_FAILURE: i32 = 127;

/// Convert an exit code into the byte handed to the operating system.
///
/// Codes that do not fit in `1..=255` become `FAILURE` so a failing backend
/// can never be reported as success.
pub fn to_process_exit(code: i32) -> u8 {
    match code {
        SUCCESS => 0,
        1..=255 => code as u8,
        _ => FAILURE as u8,
    }
}
