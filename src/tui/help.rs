use crate::context::PRESETS_FILE;
use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const KEY_COLUMN: usize = 12;

fn key_line(keys: &[&'static str], action: &'static str) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    let mut width = 0;
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" / "));
            width += 3;
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Magenta)));
        width += key.chars().count();
    }
    spans.push(Span::raw(" ".repeat(KEY_COLUMN.saturating_sub(width).max(1))));
    spans.push(Span::raw(action));
    Line::from(spans)
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line(&["q", "Ctrl-C"], "Quit (stops a running scanner)"),
        key_line(&["r"], "Validate options and run cfst"),
        key_line(&["x"], "Stop the scanner"),
        key_line(&["tab"], "Switch tabs"),
        key_line(&["?"], "Show this help"),
        Line::from(""),
        Line::from("Options tab:"),
        key_line(&["↑/↓", "j/k"], "Navigate"),
        key_line(&["space"], "Enable/disable option"),
        key_line(&["enter", "e"], "Edit value (esc cancels)"),
        key_line(&["+", "-"], "Step numeric value"),
        Line::from(""),
        Line::from("Presets tab:"),
        key_line(&["↑/↓", "j/k"], "Navigate"),
        key_line(&["enter"], "Load selected preset"),
        key_line(&["n"], "Save current options as a preset"),
        key_line(&["d"], "Delete selected preset"),
        Line::from(""),
        Line::from(vec![
            Span::raw("Presets are stored in "),
            Span::styled(PRESETS_FILE, Style::default().fg(Color::Cyan)),
            Span::raw(" next to cfst."),
        ]),
    ])
    .wrap(Wrap { trim: false })
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
