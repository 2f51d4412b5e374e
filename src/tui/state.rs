use crate::args;
use crate::model::RunEvent;
use crate::options::{OptionId, OptionKind, OptionState, OptionValue};
use crate::presets::PresetStore;
use crate::validate::validate;
use std::path::PathBuf;
use std::time::Instant;

pub const TAB_OPTIONS: usize = 0;
pub const TAB_PRESETS: usize = 1;
pub const TAB_HELP: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Editing the value of the selected option.
    EditValue { buffer: String },
    /// Typing the name to save the current options under.
    PresetName { buffer: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    /// Launch sent, waiting for the controller to confirm.
    Launching,
    Running { pid: u32, since: Instant },
    Stopping,
}

pub struct UiState {
    pub tab: usize,
    pub options: OptionState,
    pub selected: usize,
    pub mode: InputMode,
    pub presets: PresetStore,
    pub preset_names: Vec<String>,
    pub preset_selected: usize,
    pub status: RunStatus,
    pub info: String,
    pub executable: PathBuf,
}

impl UiState {
    pub fn new(presets: PresetStore, executable: PathBuf) -> Self {
        let preset_names = presets.names();
        Self {
            tab: TAB_OPTIONS,
            options: OptionState::default(),
            selected: 0,
            mode: InputMode::Normal,
            presets,
            preset_names,
            preset_selected: 0,
            status: RunStatus::Idle,
            info: String::new(),
            executable,
        }
    }

    pub fn selected_id(&self) -> OptionId {
        OptionId::ALL[self.selected.min(OptionId::ALL.len() - 1)]
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self.status, RunStatus::Idle)
    }

    pub fn select_next(&mut self) {
        match self.tab {
            TAB_OPTIONS => self.selected = (self.selected + 1).min(OptionId::ALL.len() - 1),
            TAB_PRESETS => {
                self.preset_selected =
                    (self.preset_selected + 1).min(self.preset_names.len().saturating_sub(1))
            }
            _ => {}
        }
    }

    pub fn select_prev(&mut self) {
        match self.tab {
            TAB_OPTIONS => self.selected = self.selected.saturating_sub(1),
            TAB_PRESETS => self.preset_selected = self.preset_selected.saturating_sub(1),
            _ => {}
        }
    }

    pub fn toggle_selected(&mut self) {
        let id = self.selected_id();
        let on = self.options.toggle(id);
        self.info = format!(
            "{} {}",
            id.descriptor().flag,
            if on { "enabled" } else { "disabled" }
        );
    }

    /// Nudge the selected numeric value within its range.
    pub fn step_selected(&mut self, up: bool) {
        let id = self.selected_id();
        let desc = id.descriptor();
        let next = desc.step(self.options.value(id), up);
        if self.options.set_value(id, next).is_ok() {
            self.options.set_enabled(id, true);
        }
    }

    /// Start editing the selected option; switches are toggled instead.
    pub fn begin_edit(&mut self) {
        let id = self.selected_id();
        if id.descriptor().kind == OptionKind::Switch {
            self.toggle_selected();
            return;
        }
        let buffer = match self.options.value(id) {
            OptionValue::Text(s) => s.clone(),
            other => other.display(),
        };
        self.mode = InputMode::EditValue { buffer };
    }

    pub fn input_push(&mut self, c: char) {
        if let InputMode::EditValue { buffer } | InputMode::PresetName { buffer } = &mut self.mode {
            buffer.push(c);
        }
    }

    pub fn input_backspace(&mut self) {
        if let InputMode::EditValue { buffer } | InputMode::PresetName { buffer } = &mut self.mode {
            buffer.pop();
        }
    }

    pub fn cancel_input(&mut self) {
        self.mode = InputMode::Normal;
    }

    /// Parse the edit buffer into the selected option and enable it. On a parse
    /// error the editor stays open with the error in the status line.
    pub fn commit_edit(&mut self) {
        let InputMode::EditValue { buffer } = &self.mode else {
            return;
        };
        let id = self.selected_id();
        let desc = id.descriptor();
        match desc.parse_value(buffer) {
            Ok(value) => {
                let display = value.display();
                match self.options.enable_with(id, value) {
                    Ok(()) => {
                        self.info = format!("{} = {display}", desc.flag);
                        self.mode = InputMode::Normal;
                    }
                    Err(e) => self.info = e.to_string(),
                }
            }
            Err(e) => self.info = e.to_string(),
        }
    }

    pub fn begin_preset_name(&mut self) {
        self.mode = InputMode::PresetName {
            buffer: String::new(),
        };
    }

    pub fn commit_preset_name(&mut self) {
        let InputMode::PresetName { buffer } = &self.mode else {
            return;
        };
        let name = buffer.trim().to_string();
        match self.presets.save(&name, &self.options) {
            Ok(()) => {
                self.refresh_presets();
                if let Some(i) = self.preset_names.iter().position(|n| *n == name) {
                    self.preset_selected = i;
                }
                self.info = format!("Saved preset {name}");
                self.mode = InputMode::Normal;
            }
            Err(e) => self.info = format!("Save failed: {e:#}"),
        }
    }

    pub fn selected_preset(&self) -> Option<&str> {
        self.preset_names.get(self.preset_selected).map(String::as_str)
    }

    pub fn load_selected_preset(&mut self) {
        let Some(name) = self.selected_preset().map(str::to_string) else {
            self.info = "No presets saved yet".into();
            return;
        };
        match self.presets.get(&name) {
            Ok(state) => {
                self.options = state;
                self.info = format!("Loaded preset {name}");
            }
            Err(e) => self.info = e.to_string(),
        }
    }

    pub fn delete_selected_preset(&mut self) {
        let Some(name) = self.selected_preset().map(str::to_string) else {
            return;
        };
        match self.presets.delete(&name) {
            Ok(()) => {
                self.refresh_presets();
                self.info = format!("Deleted preset {name}");
            }
            Err(e) => self.info = format!("Delete failed: {e:#}"),
        }
    }

    fn refresh_presets(&mut self) {
        self.preset_names = self.presets.names();
        self.preset_selected = self
            .preset_selected
            .min(self.preset_names.len().saturating_sub(1));
    }

    /// Validate and compile the current options for a launch. Returns `None`
    /// (with the reason in `info`) when the scanner must not be started.
    pub fn prepare_launch(&mut self) -> Option<Vec<String>> {
        if self.is_busy() {
            self.info = "Scanner is already running".into();
            return None;
        }
        if let Err(e) = validate(&self.options) {
            self.info = format!("Invalid options: {e}");
            return None;
        }
        self.status = RunStatus::Launching;
        self.info = "Launching…".into();
        Some(args::compile(&self.options))
    }

    /// Whether a stop request should be sent to the controller.
    pub fn request_stop(&mut self) -> bool {
        match self.status {
            RunStatus::Running { .. } | RunStatus::Launching => {
                self.status = RunStatus::Stopping;
                self.info = "Stopping…".into();
                true
            }
            RunStatus::Stopping => false,
            RunStatus::Idle => {
                self.info = "No scanner running".into();
                false
            }
        }
    }

    pub fn apply_event(&mut self, ev: RunEvent) {
        self.status = match ev {
            RunEvent::Started { pid } => RunStatus::Running {
                pid,
                since: Instant::now(),
            },
            RunEvent::Exited { .. } | RunEvent::Stopped | RunEvent::LaunchFailed(_) => {
                RunStatus::Idle
            }
            // The controller had nothing left to stop.
            RunEvent::Info(_) if self.status == RunStatus::Stopping => RunStatus::Idle,
            RunEvent::Info(_) => self.status,
        };
        self.info = ev.to_message();
    }

    pub fn command_preview(&self) -> String {
        args::command_line(&self.executable, &args::compile(&self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> (tempfile::TempDir, UiState) {
        let dir = tempfile::tempdir().unwrap();
        let store = PresetStore::load(dir.path().join("p.json"));
        let ui = UiState::new(store, dir.path().join("cfst"));
        (dir, ui)
    }

    fn select(ui: &mut UiState, id: OptionId) {
        ui.tab = TAB_OPTIONS;
        ui.selected = id.index();
    }

    #[test]
    fn edit_commits_parsed_value_and_enables() {
        let (_dir, mut ui) = state();
        select(&mut ui, OptionId::ThreadCount);
        ui.begin_edit();
        assert_eq!(
            ui.mode,
            InputMode::EditValue {
                buffer: "200".into()
            }
        );
        ui.input_backspace();
        ui.input_backspace();
        ui.input_backspace();
        for c in "450".chars() {
            ui.input_push(c);
        }
        ui.commit_edit();
        assert_eq!(ui.mode, InputMode::Normal);
        assert!(ui.options.is_enabled(OptionId::ThreadCount));
        assert_eq!(ui.options.int(OptionId::ThreadCount), Some(450));
    }

    #[test]
    fn bad_edit_keeps_editor_open() {
        let (_dir, mut ui) = state();
        select(&mut ui, OptionId::TargetPort);
        ui.mode = InputMode::EditValue {
            buffer: "https".into(),
        };
        ui.commit_edit();
        assert!(matches!(ui.mode, InputMode::EditValue { .. }));
        assert!(ui.info.contains("-tp"), "{}", ui.info);
        assert!(!ui.options.is_enabled(OptionId::TargetPort));
    }

    #[test]
    fn out_of_range_edit_is_refused() {
        let (_dir, mut ui) = state();
        select(&mut ui, OptionId::MaxLossRatio);
        ui.mode = InputMode::EditValue {
            buffer: "5".into(),
        };
        ui.commit_edit();
        assert!(matches!(ui.mode, InputMode::EditValue { .. }));
        assert!(ui.info.contains("0.00-1.00"), "{}", ui.info);
        assert!(!ui.options.is_enabled(OptionId::MaxLossRatio));
        assert_eq!(ui.options.float(OptionId::MaxLossRatio), Some(1.0));
    }

    #[test]
    fn editing_a_switch_toggles_it() {
        let (_dir, mut ui) = state();
        select(&mut ui, OptionId::ScanAllIps);
        ui.begin_edit();
        assert_eq!(ui.mode, InputMode::Normal);
        assert!(ui.options.is_enabled(OptionId::ScanAllIps));
    }

    #[test]
    fn step_enables_and_clamps() {
        let (_dir, mut ui) = state();
        select(&mut ui, OptionId::MaxLossRatio);
        ui.step_selected(true);
        assert!(ui.options.is_enabled(OptionId::MaxLossRatio));
        assert_eq!(ui.options.float(OptionId::MaxLossRatio), Some(1.0));
        ui.step_selected(false);
        assert_eq!(ui.options.float(OptionId::MaxLossRatio), Some(0.99));
    }

    #[test]
    fn launch_requires_valid_options_and_idle_controller() {
        let (_dir, mut ui) = state();
        ui.options.set_enabled(OptionId::HttpProbeMode, true);
        assert!(ui.prepare_launch().is_none());
        assert!(ui.info.contains("-url"), "{}", ui.info);
        assert_eq!(ui.status, RunStatus::Idle);

        ui.options.apply_setting("url=https://cf.test").unwrap();
        assert_eq!(
            ui.prepare_launch().unwrap(),
            ["-url", "https://cf.test", "-httping"]
        );
        assert_eq!(ui.status, RunStatus::Launching);
        assert!(ui.prepare_launch().is_none());

        ui.apply_event(RunEvent::Started { pid: 7 });
        assert!(matches!(ui.status, RunStatus::Running { pid: 7, .. }));
        ui.apply_event(RunEvent::Exited { pid: 7 });
        assert_eq!(ui.status, RunStatus::Idle);
    }

    #[test]
    fn stop_only_when_something_runs() {
        let (_dir, mut ui) = state();
        assert!(!ui.request_stop());
        ui.apply_event(RunEvent::Started { pid: 1 });
        assert!(ui.request_stop());
        assert_eq!(ui.status, RunStatus::Stopping);
        assert!(!ui.request_stop());
        ui.apply_event(RunEvent::Stopped);
        assert_eq!(ui.status, RunStatus::Idle);

        // The scanner exited on its own before the stop arrived.
        ui.apply_event(RunEvent::Started { pid: 2 });
        assert!(ui.request_stop());
        ui.apply_event(RunEvent::Info("No scanner running".into()));
        assert_eq!(ui.status, RunStatus::Idle);
    }

    #[test]
    fn presets_save_load_delete() {
        let (_dir, mut ui) = state();
        ui.options.apply_setting("n=123").unwrap();
        ui.begin_preset_name();
        for c in "fast".chars() {
            ui.input_push(c);
        }
        ui.commit_preset_name();
        assert_eq!(ui.preset_names, ["fast"]);
        assert_eq!(ui.mode, InputMode::Normal);

        ui.options = OptionState::default();
        ui.tab = TAB_PRESETS;
        ui.load_selected_preset();
        assert_eq!(ui.options.int(OptionId::ThreadCount), Some(123));
        assert!(ui.options.is_enabled(OptionId::ThreadCount));

        ui.delete_selected_preset();
        assert!(ui.preset_names.is_empty());
        assert_eq!(ui.selected_preset(), None);
    }

    #[test]
    fn empty_preset_name_is_refused() {
        let (_dir, mut ui) = state();
        ui.begin_preset_name();
        ui.commit_preset_name();
        assert!(matches!(ui.mode, InputMode::PresetName { .. }));
        assert!(ui.info.contains("empty"), "{}", ui.info);
    }
}
