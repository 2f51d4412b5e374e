//! Named presets persisted as a single JSON document.
//!
//! Each preset is a flat object with one `*_enabled`/`*_value` pair per option
//! (a single key for switches). Presets are kept as raw JSON objects until they
//! are decoded, so presets the launcher never rewrites survive a save untouched.

use crate::context::AppContext;
use crate::options::{registry, OptionId, OptionKind, OptionState, OptionValue};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

type PresetRecord = Map<String, Value>;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset name must not be empty")]
    EmptyName,
    #[error("preset `{0}` not found")]
    NotFound(String),
    #[error("failed to serialize presets")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write presets to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub struct PresetStore {
    path: PathBuf,
    presets: BTreeMap<String, PresetRecord>,
}

impl PresetStore {
    pub fn open(ctx: &AppContext) -> Self {
        Self::load(&ctx.presets_path)
    }

    /// Read the preset file. A missing or unreadable file yields an empty store;
    /// the next save then replaces whatever was on disk.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let presets = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<BTreeMap<String, PresetRecord>>(&text) {
                Ok(presets) => presets,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable preset file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no preset file yet");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read preset file");
                BTreeMap::new()
            }
        };
        Self { path, presets }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Preset names in lexicographic order.
    pub fn names(&self) -> Vec<String> {
        self.presets.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Result<OptionState, PresetError> {
        self.presets
            .get(name)
            .map(decode_state)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }

    /// Store `state` under `name` (trimmed), replacing any preset of that name,
    /// and rewrite the file. On a write failure the in-memory store is left as
    /// it was before the call.
    pub fn save(&mut self, name: &str, state: &OptionState) -> Result<(), PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        let previous = self.presets.insert(name.to_string(), encode_state(state));
        if let Err(e) = self.persist() {
            match previous {
                Some(p) => self.presets.insert(name.to_string(), p),
                None => self.presets.remove(name),
            };
            return Err(e);
        }
        tracing::info!(preset = name, path = %self.path.display(), "saved preset");
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<(), PresetError> {
        let removed = self
            .presets
            .remove(name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))?;
        if let Err(e) = self.persist() {
            self.presets.insert(name.to_string(), removed);
            return Err(e);
        }
        tracing::info!(preset = name, "deleted preset");
        Ok(())
    }

    fn persist(&self) -> Result<(), PresetError> {
        // serde_json keeps object keys sorted and writes non-ASCII verbatim.
        let text = serde_json::to_string_pretty(&self.presets)?;
        std::fs::write(&self.path, text).map_err(|source| PresetError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn encode_state(state: &OptionState) -> PresetRecord {
    let mut record = PresetRecord::new();
    for (desc, entry) in state.iter() {
        record.insert(desc.enabled_key.to_string(), Value::Bool(entry.enabled));
        let Some(key) = desc.value_key else {
            continue;
        };
        let value = match &entry.value {
            OptionValue::Switch => continue,
            OptionValue::Int(v) => Value::from(*v),
            OptionValue::Float(v) => Value::from(*v),
            OptionValue::Text(s) => Value::String(s.clone()),
        };
        record.insert(key.to_string(), value);
    }
    record
}

/// Missing or mistyped keys fall back to the descriptor defaults. Numbers are
/// clamped into their range, except the thread count, which is left for the
/// validator to reject.
fn decode_state(record: &PresetRecord) -> OptionState {
    let mut state = OptionState::default();
    for desc in registry() {
        let enabled = record
            .get(desc.enabled_key)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        state.set_enabled(desc.id, enabled);

        let Some(raw) = desc.value_key.and_then(|k| record.get(k)) else {
            continue;
        };
        let value = match desc.kind {
            OptionKind::Switch => continue,
            OptionKind::Int { .. } => raw
                .as_i64()
                .or_else(|| raw.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(OptionValue::Int),
            OptionKind::Float { .. } => raw.as_f64().map(OptionValue::Float),
            OptionKind::Text => raw.as_str().map(|s| OptionValue::Text(s.to_string())),
        };
        let Some(value) = value else {
            tracing::debug!(flag = desc.flag, %raw, "mistyped preset value, using default");
            continue;
        };
        let value = if desc.id == OptionId::ThreadCount {
            value
        } else {
            desc.clamp(value)
        };
        if let Err(e) = state.set_value(desc.id, value) {
            tracing::warn!(flag = desc.flag, error = %e, "ignoring preset value");
        }
    }
    state
}
