//! OS process creation behind a small trait seam.

use std::io;
use std::path::Path;
use std::process::{Child, Command};

/// How the scanner's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Own console on Windows, null streams elsewhere.
    #[default]
    Detached,
    /// Share this terminal's output so the user can watch the scan.
    Attached,
}

pub struct SpawnRequest<'a> {
    pub program: &'a Path,
    pub args: &'a [String],
    pub cwd: &'a Path,
    pub output: OutputMode,
}

/// A spawned process as seen by the controller: liveness and termination only.
pub trait ChildProcess: Send {
    fn id(&self) -> u32;

    /// Non-blocking liveness check.
    fn is_running(&mut self) -> io::Result<bool>;

    /// Request termination (SIGTERM to the process group on Unix). The handle
    /// is consumed either way.
    fn terminate(self: Box<Self>) -> io::Result<()>;
}

pub trait ProcessLauncher: Send {
    fn spawn(&self, request: &SpawnRequest<'_>) -> io::Result<Box<dyn ChildProcess>>;
}

/// Launches real processes through `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemLauncher;

#[cfg(windows)]
const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

impl ProcessLauncher for SystemLauncher {
    fn spawn(&self, request: &SpawnRequest<'_>) -> io::Result<Box<dyn ChildProcess>> {
        let mut cmd = Command::new(request.program);
        cmd.args(request.args).current_dir(request.cwd);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            // The new console provides the child's standard streams.
            cmd.creation_flags(CREATE_NEW_CONSOLE);
        }

        #[cfg(not(windows))]
        {
            #[cfg(unix)]
            {
                use std::os::unix::process::CommandExt;
                // Own process group: terminal signals aimed at us don't reach the scanner.
                cmd.process_group(0);
            }
            use std::process::Stdio;
            cmd.stdin(Stdio::null());
            if request.output == OutputMode::Detached {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        let child = cmd.spawn()?;
        Ok(Box::new(SystemChild { child }))
    }
}

struct SystemChild {
    child: Child,
}

impl ChildProcess for SystemChild {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn is_running(&mut self) -> io::Result<bool> {
        Ok(self.child.try_wait()?.is_none())
    }

    fn terminate(mut self: Box<Self>) -> io::Result<()> {
        request_exit(&mut self.child)?;
        // Reap off-thread so stop() never blocks on the child.
        std::thread::spawn(move || {
            let _ = self.child.wait();
        });
        Ok(())
    }
}

/// Ask the scanner to exit so it can still flush its result file.
#[cfg(unix)]
fn request_exit(child: &mut Child) -> io::Result<()> {
    // The child leads its own group, so the negative pid reaches its helpers too.
    let pgid = child.id() as libc::pid_t;
    if unsafe { libc::kill(-pgid, libc::SIGTERM) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn request_exit(child: &mut Child) -> io::Result<()> {
    child.kill()
}
