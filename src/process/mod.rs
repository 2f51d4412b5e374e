//! Scanner process lifecycle.
//!
//! The controller locates `cfst` in the working directory, spawns it detached
//! from this terminal, tracks at most one running instance and reports its exit
//! through non-blocking polls.

mod controller;
mod launcher;

pub(crate) use controller::{PollStatus, ProcessController, RunPhase};
pub(crate) use launcher::OutputMode;

#[cfg(test)]
pub(crate) use controller::tests as test_support;

use std::path::PathBuf;
use thiserror::Error;

#[cfg(windows)]
pub const EXECUTABLE_NAME: &str = "cfst.exe";
#[cfg(not(windows))]
pub const EXECUTABLE_NAME: &str = "cfst";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{} not found in the current directory", path.display())]
    ExecutableNotFound { path: PathBuf },
    #[error("scanner is already running (pid {pid})")]
    AlreadyRunning { pid: u32 },
    #[error("failed to start {}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
