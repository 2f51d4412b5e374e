use super::launcher::{ChildProcess, OutputMode, ProcessLauncher, SpawnRequest, SystemLauncher};
use super::{LaunchError, EXECUTABLE_NAME};
use crate::context::AppContext;
use std::path::{Path, PathBuf};

/// Lifecycle phase of the controller.
///
/// `Launching` and `Stopping` only exist for the duration of `launch`/`stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Launching,
    Running { pid: u32 },
    Stopping,
}

/// Result of a non-blocking `poll`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// No process is tracked.
    Idle,
    Running { pid: u32 },
    /// The tracked process has exited; reported once, after which the handle is gone.
    Exited { pid: u32 },
}

/// Owns at most one scanner process at a time.
pub struct ProcessController {
    working_dir: PathBuf,
    launcher: Box<dyn ProcessLauncher>,
    output: OutputMode,
    phase: RunPhase,
    child: Option<Box<dyn ChildProcess>>,
}

impl ProcessController {
    pub fn new(ctx: &AppContext) -> Self {
        Self::with_launcher(ctx, Box::new(SystemLauncher))
    }

    pub fn with_launcher(ctx: &AppContext, launcher: Box<dyn ProcessLauncher>) -> Self {
        Self {
            working_dir: ctx.working_dir.clone(),
            launcher,
            output: OutputMode::Detached,
            phase: RunPhase::Idle,
            child: None,
        }
    }

    pub fn output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Path the scanner is expected at, whether or not it exists.
    pub fn executable_path(&self) -> PathBuf {
        self.working_dir.join(EXECUTABLE_NAME)
    }

    /// Find the scanner in the working directory. `PATH` is not searched.
    pub fn locate_executable(&self) -> Result<PathBuf, LaunchError> {
        let path = self.executable_path();
        if path.is_file() {
            Ok(path)
        } else {
            Err(LaunchError::ExecutableNotFound { path })
        }
    }

    /// Spawn the scanner with `args` and start tracking it.
    pub fn launch(&mut self, args: &[String]) -> Result<u32, LaunchError> {
        if let Some(pid) = self.live_pid() {
            return Err(LaunchError::AlreadyRunning { pid });
        }
        self.phase = RunPhase::Launching;

        let program = match self.locate_executable() {
            Ok(p) => p,
            Err(e) => {
                self.phase = RunPhase::Idle;
                return Err(e);
            }
        };
        let cwd = program
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.working_dir.clone());

        let request = SpawnRequest {
            program: &program,
            args,
            cwd: &cwd,
            output: self.output,
        };
        match self.launcher.spawn(&request) {
            Ok(child) => {
                let pid = child.id();
                tracing::info!(pid, program = %program.display(), ?args, "launched scanner");
                self.child = Some(child);
                self.phase = RunPhase::Running { pid };
                Ok(pid)
            }
            Err(source) => {
                self.phase = RunPhase::Idle;
                Err(LaunchError::Spawn {
                    path: program,
                    source,
                })
            }
        }
    }

    /// Check the tracked process without blocking.
    pub fn poll(&mut self) -> PollStatus {
        let Some(child) = self.child.as_mut() else {
            return PollStatus::Idle;
        };
        let pid = child.id();
        match child.is_running() {
            Ok(true) => PollStatus::Running { pid },
            Ok(false) => {
                tracing::info!(pid, "scanner exited");
                self.release();
                PollStatus::Exited { pid }
            }
            Err(e) => {
                tracing::warn!(pid, error = %e, "lost track of scanner, treating as exited");
                self.release();
                PollStatus::Exited { pid }
            }
        }
    }

    /// Terminate the tracked process if it is still running and release it.
    ///
    /// Termination errors are logged and swallowed. Returns whether a running
    /// process was asked to stop.
    pub fn stop(&mut self) -> bool {
        let Some(mut child) = self.child.take() else {
            return false;
        };
        self.phase = RunPhase::Stopping;
        let pid = child.id();
        let stopped = match child.is_running() {
            Ok(true) => {
                match child.terminate() {
                    Ok(()) => tracing::info!(pid, "stopped scanner"),
                    Err(e) => tracing::warn!(pid, error = %e, "failed to terminate scanner"),
                }
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::warn!(pid, error = %e, "failed to query scanner before stop");
                false
            }
        };
        self.phase = RunPhase::Idle;
        stopped
    }

    /// Pid of a tracked process that is still alive; drops a handle whose
    /// process has already exited.
    fn live_pid(&mut self) -> Option<u32> {
        match self.poll() {
            PollStatus::Running { pid } => Some(pid),
            PollStatus::Idle | PollStatus::Exited { .. } => None,
        }
    }

    fn release(&mut self) {
        self.child = None;
        self.phase = RunPhase::Idle;
    }
}
