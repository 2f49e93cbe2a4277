//! Filesystem utilities.
//!
//! Atomic writes keep the active prompt buffer readable at every instant,
//! even while it is being overwritten between interactive turns.

pub mod atomic;

pub use atomic::atomic_write_file;
