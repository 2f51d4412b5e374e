//! Application-level orchestration.
//!
//! This module owns the scanner run lifecycle (launch/stop/poll) on behalf of
//! the interactive UI and `run --wait`. Callers validate and compile options
//! themselves and only send ready argument vectors here.

mod controller;

pub(crate) use controller::{run_controller, UiCommand};
