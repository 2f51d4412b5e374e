mod help;
mod state;

use crate::context::AppContext;
use crate::model::RunEvent;
use crate::options::{OptionId, OptionValue};
use crate::orchestrator::{self, UiCommand};
use crate::presets::PresetStore;
use crate::process::ProcessController;
use crate::summary;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use help::draw_help;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::{InputMode, RunStatus, UiState, TAB_HELP, TAB_OPTIONS, TAB_PRESETS};
use std::path::PathBuf;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(ctx: AppContext) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<RunEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let controller = ProcessController::new(&ctx);
    let executable = controller.executable_path();
    let presets = PresetStore::open(&ctx);
    tracing::info!(
        dir = %ctx.working_dir().display(),
        presets = presets.len(),
        "starting launcher UI"
    );

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle =
        std::thread::spawn(move || run_threaded(presets, executable, event_rx, cmd_tx));

    let res = orchestrator::run_controller(controller, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    presets: PresetStore,
    executable: PathBuf,
    mut event_rx: UnboundedReceiver<RunEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend).context("create terminal") {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e);
        }
    };
    terminal.clear().ok();

    // UiState is owned by the UI thread only.
    let mut state = UiState::new(presets, executable);

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut dirty = true;

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            tracing::debug!(?ev, "run event");
            state.apply_event(ev);
        }

        if dirty || last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
            dirty = false;
        }

        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(&mut state, k, &cmd_tx) == Flow::Quit {
                    let _ = cmd_tx.send(UiCommand::Quit);
                    break Ok(());
                }
                dirty = true;
            }
        }
    };

    restore_terminal();
    res
}

fn restore_terminal() {
    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn handle_key(state: &mut UiState, k: KeyEvent, cmd_tx: &UnboundedSender<UiCommand>) -> Flow {
    if let (KeyModifiers::CONTROL, KeyCode::Char('c')) = (k.modifiers, k.code) {
        return Flow::Quit;
    }

    if state.mode != InputMode::Normal {
        match k.code {
            KeyCode::Esc => state.cancel_input(),
            KeyCode::Enter => {
                if matches!(state.mode, InputMode::PresetName { .. }) {
                    state.commit_preset_name();
                } else {
                    state.commit_edit();
                }
            }
            KeyCode::Backspace => state.input_backspace(),
            KeyCode::Char(c) => state.input_push(c),
            _ => {}
        }
        return Flow::Continue;
    }

    match (k.modifiers, k.code) {
        (_, KeyCode::Char('q')) => return Flow::Quit,
        (_, KeyCode::Tab) => state.tab = (state.tab + 1) % 3,
        (_, KeyCode::BackTab) => state.tab = (state.tab + 2) % 3,
        (_, KeyCode::Char('?')) => state.tab = TAB_HELP,
        (_, KeyCode::Char('r')) => {
            if let Some(argv) = state.prepare_launch() {
                tracing::info!(?argv, "launch requested from UI");
                let _ = cmd_tx.send(UiCommand::Launch(argv));
            }
        }
        (_, KeyCode::Char('x')) => {
            if state.request_stop() {
                let _ = cmd_tx.send(UiCommand::Stop);
            }
        }
        (_, KeyCode::Down | KeyCode::Char('j')) => state.select_next(),
        (_, KeyCode::Up | KeyCode::Char('k')) => state.select_prev(),
        (_, code) if state.tab == TAB_OPTIONS => match code {
            KeyCode::Char(' ') => state.toggle_selected(),
            KeyCode::Enter | KeyCode::Char('e') => state.begin_edit(),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => state.step_selected(true),
            KeyCode::Char('-') | KeyCode::Left => state.step_selected(false),
            _ => {}
        },
        (_, code) if state.tab == TAB_PRESETS => match code {
            KeyCode::Enter => state.load_selected_preset(),
            KeyCode::Char('n') => state.begin_preset_name(),
            KeyCode::Char('d') | KeyCode::Delete => state.delete_selected_preset(),
            _ => {}
        },
        _ => {}
    }
    Flow::Continue
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(6)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Options"),
        Line::from(format!("Presets ({})", state.preset_names.len())),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(Block::default().borders(Borders::ALL).title("cfst-launcher"))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_OPTIONS => draw_options(chunks[1], f, state),
        TAB_PRESETS => draw_presets(chunks[1], f, state),
        _ => draw_help(chunks[1], f),
    }
    draw_status(chunks[2], f, state);
}

/// First visible row so that `selected` stays inside a window of `height` rows.
fn scroll_offset(selected: usize, height: usize) -> usize {
    if height == 0 {
        return selected;
    }
    selected.saturating_sub(height - 1)
}

fn draw_options(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let max_items = area.height.saturating_sub(2) as usize;
    let offset = scroll_offset(state.selected, max_items);

    let lines: Vec<Line> = OptionId::ALL
        .iter()
        .enumerate()
        .skip(offset)
        .take(max_items)
        .map(|(idx, id)| option_line(state, *id, idx == state.selected))
        .collect();

    let title = match state.mode {
        InputMode::EditValue { .. } => "Options (enter to apply, esc to cancel)",
        _ => "Options",
    };
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn option_line(state: &UiState, id: OptionId, selected: bool) -> Line<'static> {
    let desc = id.descriptor();
    let entry = state.options.get(id);
    let mark = if entry.enabled { "[x]" } else { "[ ]" };

    let value = match (&state.mode, selected) {
        (InputMode::EditValue { buffer }, true) => format!("{buffer}▏"),
        _ => match &entry.value {
            OptionValue::Switch => String::new(),
            OptionValue::Text(s) if s.is_empty() => "\"\"".to_string(),
            other => other.display(),
        },
    };

    let base = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else if entry.enabled {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let hint = match desc.range_text() {
        Some(range) => format!("{} [{range}]", desc.hint),
        None => desc.hint.to_string(),
    };

    Line::from(vec![
        Span::styled(if selected { "> " } else { "  " }, base),
        Span::styled(format!("{mark} "), base),
        Span::styled(format!("{:<9}", desc.flag), Style::default().fg(Color::Magenta)),
        Span::styled(format!("{value:<18} "), base),
        Span::styled(format!("{:<28}", desc.label), base),
        Span::styled(hint, Style::default().fg(Color::Gray)),
    ])
}

fn draw_presets(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    if let InputMode::PresetName { buffer } = &state.mode {
        lines.push(Line::from(vec![
            Span::styled("Name: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{buffer}▏"), Style::default().fg(Color::Yellow)),
        ]));
        lines.push(Line::from(""));
    }

    if state.preset_names.is_empty() {
        lines.push(Line::from(Span::styled(
            "No presets yet. Press n to save the current options.",
            Style::default().fg(Color::Gray),
        )));
    } else {
        let max_items = (cols[0].height.saturating_sub(2) as usize).saturating_sub(lines.len());
        let offset = scroll_offset(state.preset_selected, max_items);
        for (idx, name) in state
            .preset_names
            .iter()
            .enumerate()
            .skip(offset)
            .take(max_items)
        {
            let selected = idx == state.preset_selected;
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(if selected { "> " } else { "  " }, style),
                Span::styled(name.clone(), style),
            ]));
        }
    }

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Presets"));
    f.render_widget(p, cols[0]);

    let detail: Vec<Line> = match state.selected_preset().map(|n| state.presets.get(n)) {
        Some(Ok(preset)) => summary::build_state_summary(&preset)
            .lines
            .into_iter()
            .map(|l| {
                let style = if l.starts_with("[x]") {
                    Style::default()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Line::from(Span::styled(l, style))
            })
            .collect(),
        Some(Err(e)) => vec![Line::from(e.to_string())],
        None => Vec::new(),
    };
    let title = state
        .selected_preset()
        .map(|n| format!("Preset: {n}"))
        .unwrap_or_else(|| "Preset".into());
    let p = Paragraph::new(detail).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, cols[1]);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let (label, color) = match state.status {
        RunStatus::Idle => ("idle".to_string(), Color::Gray),
        RunStatus::Launching => ("launching".to_string(), Color::Yellow),
        RunStatus::Running { pid, since } => {
            let secs = since.elapsed().as_secs();
            (
                format!("running (pid {pid}, {:02}:{:02})", secs / 60, secs % 60),
                Color::Green,
            )
        }
        RunStatus::Stopping => ("stopping".to_string(), Color::Yellow),
    };

    let mut lines = vec![Line::from(vec![
        Span::styled("Scanner:", Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(label, Style::default().fg(color)),
    ])];
    lines.extend(status_field("Command", &state.command_preview(), area.width));
    lines.extend(status_field("Info", &state.info, area.width));

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

/// `label: value` rows for the status box. The value wraps at spaces (long
/// tokens are split) and continuation rows are indented under the value.
fn status_field(label: &str, value: &str, width: u16) -> Vec<Line<'static>> {
    let value = value.trim();
    if value.is_empty() {
        return Vec::new();
    }
    let head = format!("{label}: ");
    let indent = head.chars().count();
    // Bordered block: one column lost on each side.
    let room = (width as usize).saturating_sub(2 + indent).max(8);

    let mut rows = Vec::new();
    let mut row = String::new();
    for word in value.split(' ') {
        let len = word.chars().count();
        if !row.is_empty() && row.chars().count() + 1 + len > room {
            rows.push(std::mem::take(&mut row));
        }
        if !row.is_empty() {
            row.push(' ');
        }
        row.push_str(word);
        while row.chars().count() > room {
            let rest: String = row.chars().skip(room).collect();
            rows.push(row.chars().take(room).collect::<String>());
            row = rest;
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }

    rows.into_iter()
        .enumerate()
        .map(|(i, text)| {
            let lead = if i == 0 {
                Span::styled(head.clone(), Style::default().fg(Color::Gray))
            } else {
                Span::raw(" ".repeat(indent))
            };
            Line::from(vec![lead, Span::raw(text)])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui() -> (tempfile::TempDir, UiState) {
        let dir = tempfile::tempdir().unwrap();
        let store = PresetStore::load(dir.path().join("p.json"));
        let state = UiState::new(store, dir.path().join("cfst"));
        (dir, state)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn run_key_sends_compiled_launch() {
        let (_dir, mut state) = ui();
        let (tx, mut rx) = mpsc::unbounded_channel();
        handle_key(&mut state, press(KeyCode::Char(' ')), &tx);
        assert_eq!(handle_key(&mut state, press(KeyCode::Char('r')), &tx), Flow::Continue);
        match rx.try_recv().unwrap() {
            UiCommand::Launch(argv) => assert_eq!(argv, ["-n", "200"]),
            other => panic!("unexpected command {other:?}"),
        }
        // A second run while launching is refused locally.
        handle_key(&mut state, press(KeyCode::Char('r')), &tx);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stop_key_only_sends_when_running() {
        let (_dir, mut state) = ui();
        let (tx, mut rx) = mpsc::unbounded_channel();
        handle_key(&mut state, press(KeyCode::Char('x')), &tx);
        assert!(rx.try_recv().is_err());

        state.apply_event(RunEvent::Started { pid: 9 });
        handle_key(&mut state, press(KeyCode::Char('x')), &tx);
        assert!(matches!(rx.try_recv().unwrap(), UiCommand::Stop));
    }

    #[test]
    fn typing_in_editor_does_not_trigger_shortcuts() {
        let (_dir, mut state) = ui();
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.selected = OptionId::TargetUrl.index();
        handle_key(&mut state, press(KeyCode::Enter), &tx);
        for c in "https://qr.test".chars() {
            assert_eq!(handle_key(&mut state, press(KeyCode::Char(c)), &tx), Flow::Continue);
        }
        handle_key(&mut state, press(KeyCode::Enter), &tx);
        assert!(rx.try_recv().is_err());
        assert_eq!(state.options.text(OptionId::TargetUrl), "https://qr.test");
        assert!(state.options.is_enabled(OptionId::TargetUrl));
    }

    #[test]
    fn quit_keys() {
        let (_dir, mut state) = ui();
        let (tx, _rx) = mpsc::unbounded_channel();
        assert_eq!(handle_key(&mut state, press(KeyCode::Char('q')), &tx), Flow::Quit);
        state.begin_preset_name();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut state, ctrl_c, &tx), Flow::Quit);
    }

    #[test]
    fn tab_cycles_through_views() {
        let (_dir, mut state) = ui();
        let (tx, _rx) = mpsc::unbounded_channel();
        handle_key(&mut state, press(KeyCode::Tab), &tx);
        assert_eq!(state.tab, TAB_PRESETS);
        handle_key(&mut state, press(KeyCode::BackTab), &tx);
        assert_eq!(state.tab, TAB_OPTIONS);
        handle_key(&mut state, press(KeyCode::Char('?')), &tx);
        assert_eq!(state.tab, TAB_HELP);
    }

    #[test]
    fn scroll_keeps_selection_visible() {
        assert_eq!(scroll_offset(3, 10), 0);
        assert_eq!(scroll_offset(12, 10), 3);
        assert_eq!(scroll_offset(5, 0), 5);
    }

    fn rendered(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn status_field_wraps_at_spaces() {
        let lines = status_field("Command", "cfst -n 200 -tp 443", 24);
        assert_eq!(rendered(&lines), ["Command: cfst -n 200", "         -tp 443"]);

        let lines = status_field("Command", "cfst -n 200 -tp 443", 80);
        assert_eq!(rendered(&lines), ["Command: cfst -n 200 -tp 443"]);
    }

    #[test]
    fn status_field_splits_long_tokens_and_skips_blanks() {
        let lines = status_field("Info", &"a".repeat(40), 24);
        // 24 columns less borders and "Info: " leaves 16 per row.
        assert_eq!(lines.len(), 3);
        assert!(rendered(&lines).iter().all(|l| l.chars().count() <= 22));

        assert!(status_field("Info", "   ", 24).is_empty());
    }
}
