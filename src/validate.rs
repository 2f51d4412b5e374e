//! Pre-launch consistency checks.

use crate::options::{OptionId, OptionKind, OptionState};
use thiserror::Error;

/// A configuration the scanner should not be started with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{flag}: {message}")]
pub struct ValidationError {
    pub flag: &'static str,
    pub message: String,
}

type Rule = fn(&OptionState) -> Result<(), ValidationError>;

/// Checks run before every launch, in order; the first rejection wins.
const RULES: &[Rule] = &[thread_count_in_range, http_probe_needs_url];

pub fn validate(state: &OptionState) -> Result<(), ValidationError> {
    RULES.iter().try_for_each(|rule| rule(state))
}

fn thread_count_in_range(state: &OptionState) -> Result<(), ValidationError> {
    let desc = OptionId::ThreadCount.descriptor();
    let entry = state.get(desc.id);
    let OptionKind::Int { min, max, .. } = desc.kind else {
        return Ok(());
    };
    if entry.enabled && !desc.in_range(&entry.value) {
        return Err(ValidationError {
            flag: desc.flag,
            message: format!(
                "must be between {min} and {max} (got {})",
                entry.value.display()
            ),
        });
    }
    Ok(())
}

fn http_probe_needs_url(state: &OptionState) -> Result<(), ValidationError> {
    if !state.is_enabled(OptionId::HttpProbeMode) {
        return Ok(());
    }
    let url_set = state.is_enabled(OptionId::TargetUrl)
        && !state.text(OptionId::TargetUrl).trim().is_empty();
    if url_set {
        return Ok(());
    }
    Err(ValidationError {
        flag: OptionId::HttpProbeMode.descriptor().flag,
        message: "set -url when HTTP probe mode is enabled".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_threads(n: i64) -> OptionState {
        let mut state = OptionState::default();
        state.set_int(OptionId::ThreadCount, n).unwrap();
        state.set_enabled(OptionId::ThreadCount, true);
        state
    }

    #[test]
    fn thread_count_bounds() {
        for bad in [0, 1001] {
            let err = validate(&with_threads(bad)).unwrap_err();
            assert_eq!(err.flag, "-n");
            assert!(err.to_string().contains("1 and 1000"), "{err}");
        }
        for ok in [1, 1000] {
            assert_eq!(validate(&with_threads(ok)), Ok(()));
        }
    }

    #[test]
    fn out_of_range_thread_count_is_fine_when_disabled() {
        let mut state = with_threads(0);
        state.set_enabled(OptionId::ThreadCount, false);
        assert_eq!(validate(&state), Ok(()));
    }

    #[test]
    fn http_probe_requires_url() {
        let mut state = OptionState::default();
        state.set_enabled(OptionId::HttpProbeMode, true);
        state.set_text(OptionId::TargetUrl, "https://cf.test/file").unwrap();

        // URL disabled
        let err = validate(&state).unwrap_err();
        assert_eq!(err.flag, "-httping");
        assert!(err.message.contains("-url"));

        // URL enabled but blank
        state.set_enabled(OptionId::TargetUrl, true);
        state.set_text(OptionId::TargetUrl, "   ").unwrap();
        assert!(validate(&state).is_err());

        state.set_text(OptionId::TargetUrl, "https://cf.test/file").unwrap();
        assert_eq!(validate(&state), Ok(()));
    }

    #[test]
    fn validation_never_mutates() {
        let state = with_threads(5000);
        let before = state.clone();
        let _ = validate(&state);
        assert_eq!(state, before);
    }
}
