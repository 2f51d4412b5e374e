use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Append to the launcher's log file; used while the TUI owns the terminal.
    File,
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
pub fn init(target: LogTarget, verbose: bool) {
    let default_level = match (target, verbose) {
        (_, true) => "debug",
        (LogTarget::File, false) => "info",
        (LogTarget::Stderr, false) => "warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init()
                .ok();
        }
        LogTarget::File => {
            // Without a writable log file the TUI simply runs unlogged.
            let Some(path) = log_file_path() else {
                return;
            };
            if let Some(parent) = path.parent() {
                if std::fs::create_dir_all(parent).is_err() {
                    return;
                }
            }
            let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
                return;
            };
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .ok();
        }
    }
}

pub fn log_file_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("cfst-launcher").join("launcher.log"))
}
