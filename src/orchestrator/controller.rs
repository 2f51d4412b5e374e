//! Run lifecycle loop.
//!
//! Owns the process controller, applies launch/stop commands from the UI and
//! polls the running scanner on a fixed tick, emitting events back.

use crate::model::RunEvent;
use crate::process::{PollStatus, ProcessController};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{Duration, MissedTickBehavior};

/// Interval between liveness checks of the running scanner.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Commands emitted by UI layers to control the scanner.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    /// Launch with an already validated and compiled argument vector.
    Launch(Vec<String>),
    Stop,
    Quit,
}

/// Drive `controller` from UI commands until `Quit` (or the command channel
/// closes). A scanner still running at that point is stopped.
pub(crate) async fn run_controller(
    mut controller: ProcessController,
    event_tx: UnboundedSender<RunEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Launch(argv)) => {
                        tracing::debug!(?argv, "launch requested");
                        let ev = match controller.launch(&argv) {
                            Ok(pid) => RunEvent::Started { pid },
                            Err(e) => RunEvent::LaunchFailed(format!("{:#}", anyhow::Error::from(e))),
                        };
                        let _ = event_tx.send(ev);
                    }
                    Some(UiCommand::Stop) => {
                        let ev = if controller.stop() {
                            RunEvent::Stopped
                        } else {
                            RunEvent::Info("No scanner running".into())
                        };
                        let _ = event_tx.send(ev);
                    }
                    Some(UiCommand::Quit) | None => {
                        tracing::debug!(phase = ?controller.phase(), "controller shutting down");
                        if controller.stop() {
                            let _ = event_tx.send(RunEvent::Stopped);
                        }
                        break Ok(());
                    }
                }
            }
            _ = ticker.tick() => {
                if let PollStatus::Exited { pid } = controller.poll() {
                    let _ = event_tx.send(RunEvent::Exited { pid });
                }
            }
        }
    }
}
