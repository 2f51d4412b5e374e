use crate::args;
use crate::context::AppContext;
use crate::logging::{self, LogTarget};
use crate::model::RunEvent;
use crate::options::{by_flag, OptionState};
use crate::orchestrator::{run_controller, UiCommand};
use crate::presets::PresetStore;
use crate::process::{OutputMode, ProcessController};
use crate::summary;
use crate::validate::validate;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::Path;
use tokio::sync::mpsc;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "cfst-launcher",
    version,
    about = "Configure and launch the CloudflareSpeedTest (cfst) scanner"
)]
pub struct Cli {
    /// Log debug details (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Validate the options and launch cfst from the current directory
    Run {
        #[command(flatten)]
        options: OptionArgs,
        /// Wait for the scanner to finish; Ctrl-C stops it
        #[arg(long)]
        wait: bool,
        /// Show the scanner's output in this terminal instead of detaching it
        #[arg(long)]
        attach: bool,
    },
    /// Print the argument vector cfst would be launched with
    Args {
        #[command(flatten)]
        options: OptionArgs,
        /// Print program, arguments and command line as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage saved presets
    #[command(subcommand)]
    Preset(PresetCommand),
    /// List every scanner option with its flag, default and range
    Options,
}

#[derive(Debug, Subcommand, Clone)]
pub enum PresetCommand {
    /// List preset names
    List,
    /// Show the options stored in a preset
    Show { name: String },
    /// Save options under a name, replacing any preset with that name
    Save {
        name: String,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Delete a preset
    Delete { name: String },
}

/// Option selection shared by the commands that build a configuration.
#[derive(Debug, clap::Args, Clone, Default)]
pub struct OptionArgs {
    /// Start from a saved preset instead of the defaults
    #[arg(long)]
    pub preset: Option<String>,

    /// Enable an option, optionally setting its value (e.g. `--set n=500`, `--set httping`)
    #[arg(long = "set", value_name = "FLAG[=VALUE]")]
    pub set: Vec<String>,

    /// Disable an option (e.g. `--unset dd`)
    #[arg(long = "unset", value_name = "FLAG")]
    pub unset: Vec<String>,
}

impl OptionArgs {
    /// Build the option state: preset (or defaults), then `--set`, then `--unset`.
    pub fn resolve(&self, store: &PresetStore) -> Result<OptionState> {
        let mut state = match self.preset.as_deref() {
            Some(name) => store.get(name)?,
            None => OptionState::default(),
        };
        for setting in &self.set {
            state
                .apply_setting(setting)
                .with_context(|| format!("invalid --set {setting}"))?;
        }
        for flag in &self.unset {
            let desc = by_flag(flag).with_context(|| format!("invalid --unset {flag}"))?;
            state.set_enabled(desc.id, false);
        }
        Ok(state)
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let ctx = AppContext::from_current_dir()?;
    let command = args.command.unwrap_or(Command::Tui);

    if matches!(command, Command::Tui) {
        #[cfg(feature = "tui")]
        {
            logging::init(LogTarget::File, args.verbose);
            return crate::tui::run(ctx).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            return Err(anyhow::anyhow!(
                "built without TUI support; use `run`, `args` or `preset`"
            ));
        }
    }

    logging::init(LogTarget::Stderr, args.verbose);
    let mut store = PresetStore::open(&ctx);

    match command {
        Command::Tui => Ok(()),
        Command::Run {
            options,
            wait,
            attach,
        } => {
            let state = options.resolve(&store)?;
            let mode = if attach {
                OutputMode::Attached
            } else {
                OutputMode::Detached
            };
            run_scanner(&ctx, &state, wait, mode).await
        }
        Command::Args { options, json } => {
            let state = options.resolve(&store)?;
            let argv = args::compile(&state);
            let program = ProcessController::new(&ctx).executable_path();
            let report = ArgsReport::new(&program, &argv);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.command_line);
            }
            Ok(())
        }
        Command::Preset(cmd) => {
            let program = ProcessController::new(&ctx).executable_path();
            run_preset_command(&mut store, &program, cmd)
        }
        Command::Options => {
            for line in summary::build_registry_table().lines {
                println!("{line}");
            }
            Ok(())
        }
    }
}

/// Output of `args --json`.
#[derive(Debug, Serialize)]
struct ArgsReport<'a> {
    program: &'a Path,
    args: &'a [String],
    command_line: String,
}

impl<'a> ArgsReport<'a> {
    fn new(program: &'a Path, args: &'a [String]) -> Self {
        Self {
            program,
            args,
            command_line: args::command_line(program, args),
        }
    }
}

/// Option table followed by the command line the preset would launch.
fn preset_details(state: &OptionState, program: &Path) -> Vec<String> {
    let mut lines = summary::build_state_summary(state).lines;
    lines.push(String::new());
    lines.push(format!(
        "command: {}",
        args::command_line(program, &args::compile(state))
    ));
    lines
}

fn run_preset_command(
    store: &mut PresetStore,
    program: &Path,
    cmd: PresetCommand,
) -> Result<()> {
    match cmd {
        PresetCommand::List => {
            if store.is_empty() {
                eprintln!("No presets in {}", store.path().display());
            }
            for name in store.names() {
                println!("{name}");
            }
        }
        PresetCommand::Show { name } => {
            let state = store.get(&name)?;
            for line in preset_details(&state, program) {
                println!("{line}");
            }
        }
        PresetCommand::Save { name, options } => {
            let state = options.resolve(store)?;
            store
                .save(&name, &state)
                .with_context(|| format!("failed to save preset {}", name.trim()))?;
            eprintln!("Saved preset {} to {}", name.trim(), store.path().display());
        }
        PresetCommand::Delete { name } => {
            store.delete(&name)?;
            eprintln!("Deleted preset {name}");
        }
    }
    Ok(())
}

/// Validate, compile and launch. With `wait`, drive the run through the
/// orchestrator until the scanner exits, stopping it on Ctrl-C.
async fn run_scanner(
    ctx: &AppContext,
    state: &OptionState,
    wait: bool,
    mode: OutputMode,
) -> Result<()> {
    validate(state).context("invalid configuration")?;
    let argv = args::compile(state);
    let mut controller = ProcessController::new(ctx).output(mode);

    if !wait {
        let pid = controller.launch(&argv)?;
        eprintln!("Launched cfst (pid {pid}): {}", argv.join(" "));
        return Ok(());
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RunEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let handle = tokio::spawn(run_controller(controller, event_tx, cmd_rx));
    let _ = cmd_tx.send(UiCommand::Launch(argv));

    let outcome = loop {
        tokio::select! {
            ev = event_rx.recv() => match ev {
                Some(RunEvent::LaunchFailed(msg)) => break Err(anyhow::anyhow!(msg)),
                Some(ev @ (RunEvent::Exited { .. } | RunEvent::Stopped)) => {
                    eprintln!("{}", ev.to_message());
                    break Ok(());
                }
                Some(ev) => eprintln!("{}", ev.to_message()),
                None => break Ok(()),
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Stopping scanner…");
                let _ = cmd_tx.send(UiCommand::Stop);
            }
        }
    };

    let _ = cmd_tx.send(UiCommand::Quit);
    handle.await.context("run controller task failed")??;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionId;

    #[test]
    fn cli_parses_repeated_settings() {
        let cli = Cli::try_parse_from([
            "cfst-launcher",
            "args",
            "--preset",
            "home",
            "--set",
            "n=500",
            "--set",
            "httping",
            "--unset",
            "dd",
            "--json",
        ])
        .unwrap();
        let Some(Command::Args { options, json }) = cli.command else {
            panic!("expected args command");
        };
        assert!(json);
        assert_eq!(options.preset.as_deref(), Some("home"));
        assert_eq!(options.set, ["n=500", "httping"]);
        assert_eq!(options.unset, ["dd"]);
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["cfst-launcher"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn resolve_layers_preset_then_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PresetStore::load(dir.path().join("p.json"));
        let mut saved = OptionState::default();
        saved.apply_setting("n=300").unwrap();
        saved.apply_setting("dd").unwrap();
        store.save("home", &saved).unwrap();

        let options = OptionArgs {
            preset: Some("home".into()),
            set: vec!["tp=8443".into()],
            unset: vec!["-dd".into()],
        };
        let state = options.resolve(&store).unwrap();
        assert_eq!(state.int(OptionId::ThreadCount), Some(300));
        assert!(state.is_enabled(OptionId::TargetPort));
        assert!(!state.is_enabled(OptionId::DisableDownloadTest));
        assert_eq!(args::compile(&state), ["-n", "300", "-tp", "8443"]);
    }

    #[test]
    fn resolve_reports_unknown_preset_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let store = PresetStore::load(dir.path().join("p.json"));

        let missing = OptionArgs {
            preset: Some("nope".into()),
            ..Default::default()
        };
        assert!(missing.resolve(&store).unwrap_err().to_string().contains("nope"));

        let bad = OptionArgs {
            set: vec!["speed=1".into()],
            ..Default::default()
        };
        let err = format!("{:#}", bad.resolve(&store).unwrap_err());
        assert!(err.contains("unknown option"), "{err}");
    }

    #[test]
    fn args_report_serializes_vector_and_command_line() {
        let argv = vec!["-n".to_string(), "500".to_string(), "-o".to_string(), String::new()];
        let report = ArgsReport::new(Path::new("/opt/cf/cfst"), &argv);
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["program"], "/opt/cf/cfst");
        assert_eq!(json["args"], serde_json::json!(["-n", "500", "-o", ""]));
        assert_eq!(json["command_line"], "/opt/cf/cfst -n 500 -o \"\"");
    }

    #[test]
    fn resolve_rejects_out_of_range_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = PresetStore::load(dir.path().join("p.json"));
        let options = OptionArgs {
            set: vec!["tp=70000".into()],
            ..Default::default()
        };
        let err = format!("{:#}", options.resolve(&store).unwrap_err());
        assert!(err.contains("--set tp=70000") && err.contains("1-65535"), "{err}");
    }

    #[test]
    fn preset_details_show_empty_output_path() {
        let mut state = OptionState::default();
        state.apply_setting("n=300").unwrap();
        state.apply_setting("o=").unwrap();
        let lines = preset_details(&state, Path::new("/opt/cf/cfst"));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("command: /opt/cf/cfst -n 300 -o \"\"")
        );
    }

    #[tokio::test]
    async fn run_refuses_invalid_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::new(dir.path());
        let mut state = OptionState::default();
        state.apply_setting("httping").unwrap();

        let err = run_scanner(&ctx, &state, false, OutputMode::Detached)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("-url"), "{err:#}");
    }
}
