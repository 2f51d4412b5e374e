//! Argument compiler: turns an [`OptionState`] into the scanner's argv.

use crate::options::{OptionId, OptionState, OptionValue};
use std::path::Path;

/// Build the argument vector for the scanner, in registry order.
///
/// Disabled options never contribute tokens. Text options are trimmed and
/// skipped when blank, except `-o`: an exactly empty value is passed through as
/// `-o ""`, which tells the scanner not to write a result file.
pub fn compile(state: &OptionState) -> Vec<String> {
    let mut argv = Vec::new();
    for (desc, entry) in state.iter() {
        if !entry.enabled {
            continue;
        }
        let value = match &entry.value {
            OptionValue::Switch => {
                argv.push(desc.flag.to_string());
                continue;
            }
            OptionValue::Int(v) => v.to_string(),
            OptionValue::Float(v) => format_float(*v),
            OptionValue::Text(raw) => match text_argument(desc.id, raw) {
                Some(v) => v,
                None => continue,
            },
        };
        argv.push(desc.flag.to_string());
        argv.push(value);
    }
    argv
}

fn format_float(v: f64) -> String {
    // Avoid "-0.00" for negative zero.
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{v:.2}")
}

fn text_argument(id: OptionId, raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        return Some(trimmed.to_string());
    }
    if id == OptionId::ResultOutputPath && raw.is_empty() {
        return Some(String::new());
    }
    None
}

/// Render a copy-pasteable command line for display.
pub fn command_line(program: &Path, argv: &[String]) -> String {
    std::iter::once(program.display().to_string())
        .chain(argv.iter().cloned())
        .map(|token| quote(&token))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(token: &str) -> String {
    if token.is_empty() {
        return "\"\"".to_string();
    }
    if token.chars().any(|c| c.is_whitespace() || c == '"') {
        return format!("\"{}\"", token.replace('"', "\\\""));
    }
    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(settings: &[&str]) -> OptionState {
        let mut state = OptionState::default();
        for s in settings {
            state.apply_setting(s).unwrap();
        }
        state
    }

    #[test]
    fn default_state_compiles_to_nothing() {
        assert!(compile(&OptionState::default()).is_empty());
    }

    #[test]
    fn compile_is_deterministic() {
        let state = enabled(&["n=500", "url=https://x.test", "httping", "tlr=0.2", "allip"]);
        assert_eq!(compile(&state), compile(&state));
    }

    #[test]
    fn follows_registry_order() {
        let state = enabled(&["allip", "o=out.csv", "p=5", "tp=8443", "n=300", "dd"]);
        assert_eq!(
            compile(&state),
            ["-n", "300", "-tp", "8443", "-p", "5", "-o", "out.csv", "-dd", "-allip"]
        );
    }

    #[test]
    fn numbers_use_fixed_precision() {
        let state = enabled(&["tlr=0.5", "sl=12", "tl=99999", "dn=0"]);
        assert_eq!(
            compile(&state),
            ["-dn", "0", "-tl", "99999", "-tlr", "0.50", "-sl", "12.00"]
        );

        let mut rounded = OptionState::default();
        rounded
            .enable_with(OptionId::MinDownloadSpeed, OptionValue::Float(1.234))
            .unwrap();
        assert_eq!(compile(&rounded), ["-sl", "1.23"]);
    }

    #[test]
    fn disabled_options_are_omitted_whatever_their_value() {
        let mut state = enabled(&["n=999", "url=https://x.test", "httping"]);
        state.set_enabled(OptionId::ThreadCount, false);
        state.set_enabled(OptionId::HttpProbeMode, false);
        assert_eq!(compile(&state), ["-url", "https://x.test"]);
    }

    #[test]
    fn blank_text_is_skipped_and_values_trimmed() {
        let state = enabled(&["url=   ", "cfcolo= HKG,LAX ", "f="]);
        assert_eq!(compile(&state), ["-cfcolo", "HKG,LAX"]);
    }

    #[test]
    fn output_path_empty_means_no_file() {
        let mut state = OptionState::default();
        assert!(compile(&state).is_empty());

        state
            .enable_with(OptionId::ResultOutputPath, OptionValue::Text(String::new()))
            .unwrap();
        assert_eq!(compile(&state), ["-o", ""]);

        state.set_text(OptionId::ResultOutputPath, "  result.csv  ").unwrap();
        assert_eq!(compile(&state), ["-o", "result.csv"]);

        state.set_text(OptionId::ResultOutputPath, "   ").unwrap();
        assert!(compile(&state).is_empty());

        state.set_text(OptionId::ResultOutputPath, "result.csv").unwrap();
        state.set_enabled(OptionId::ResultOutputPath, false);
        assert!(compile(&state).is_empty());
    }

    #[test]
    fn command_line_quotes_empty_and_spaced_tokens() {
        let argv = vec!["-o".to_string(), String::new(), "-f".into(), "my ips.txt".into()];
        assert_eq!(
            command_line(Path::new("cfst"), &argv),
            r#"cfst -o "" -f "my ips.txt""#
        );
    }
}
