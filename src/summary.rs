//! Text summary builders for CLI output.
//!
//! This module formats option states and the registry as human-readable lines.

use crate::options::{registry, OptionKind, OptionState, OptionValue};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// One line per option: checkbox, flag, value and label.
pub(crate) fn build_state_summary(state: &OptionState) -> TextSummary {
    let lines = state
        .iter()
        .map(|(desc, entry)| {
            let mark = if entry.enabled { "[x]" } else { "[ ]" };
            let value = match &entry.value {
                OptionValue::Switch => String::new(),
                OptionValue::Text(s) if s.is_empty() => "\"\"".to_string(),
                other => other.display(),
            };
            format!("{mark} {:<14} {:<24} {}", desc.flag, value, desc.label)
        })
        .collect();
    TextSummary { lines }
}

/// The registry as a table: flag, kind, default, range and hint.
pub(crate) fn build_registry_table() -> TextSummary {
    let mut lines = vec![format!(
        "{:<14} {:<6} {:<8} {:<14} {}",
        "FLAG", "KIND", "DEFAULT", "RANGE", "DESCRIPTION"
    )];
    for desc in registry() {
        let kind = match desc.kind {
            OptionKind::Switch => "switch",
            OptionKind::Int { .. } => "int",
            OptionKind::Float { .. } => "float",
            OptionKind::Text => "text",
        };
        lines.push(format!(
            "{:<14} {:<6} {:<8} {:<14} {} ({})",
            desc.flag,
            kind,
            desc.default_value().display(),
            desc.range_text().unwrap_or_default(),
            desc.label,
            desc.hint
        ));
    }
    TextSummary { lines }
}
