/// Events emitted by the run orchestrator and consumed by UI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Started { pid: u32 },
    /// The scanner finished on its own.
    Exited { pid: u32 },
    /// The scanner was terminated on request.
    Stopped,
    LaunchFailed(String),
    Info(String),
}

impl RunEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            RunEvent::Started { pid } => format!("Scanner running (pid {pid})"),
            RunEvent::Exited { pid } => format!("Scanner finished (pid {pid})"),
            RunEvent::Stopped => "Scanner stopped".to_string(),
            RunEvent::LaunchFailed(msg) => format!("Launch failed: {msg}"),
            RunEvent::Info(msg) => msg.clone(),
        }
    }
}
