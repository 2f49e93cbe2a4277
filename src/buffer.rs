//! The active prompt buffer.
//!
//! The rendered prompt is mirrored to a process-scoped file so operators can
//! inspect what a long-running backend is working on. The file is created
//! before the first backend runs, overwritten whenever the prompt grows, and
//! removed exactly once when the run ends on any path. [`PromptBuffer::close`]
//! removes it explicitly; dropping an unclosed buffer removes it as well, which
//! covers early returns through `?`.

use crate::error::Result;
use crate::fs::atomic_write_file;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// File name of the buffer for a given process id.
pub fn buffer_file_name(pid: u32) -> String {
    format!(".prompt_active_{}.md", pid)
}

#[derive(Debug)]
pub struct PromptBuffer {
    path: PathBuf,
    removed: bool,
}

impl PromptBuffer {
    /// Write `prompt` to `<dir>/.prompt_active_<pid>.md` for the current process.
    pub fn create(dir: &Path, prompt: &str) -> Result<Self> {
        Self::create_at(dir.join(buffer_file_name(std::process::id())), prompt)
    }

    /// Write `prompt` to an explicit path.
    pub fn create_at(path: PathBuf, prompt: &str) -> Result<Self> {
        atomic_write_file(&path, prompt)?;
        info!("[Buffer] Wrote active prompt to {}", path.display());
        Ok(Self {
            path,
            removed: false,
        })
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the buffer contents with `prompt`.
    pub fn update(&self, prompt: &str) -> Result<()> {
        atomic_write_file(&self.path, prompt)
    }

    /// Remove the buffer file. Failures are logged, never returned.
    pub fn close(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("[Cleanup] Removed active prompt file"),
            Err(e) => warn!(
                "[Cleanup] Could not remove active prompt file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for PromptBuffer {
    fn drop(&mut self) {
        self.remove();
    }
}
