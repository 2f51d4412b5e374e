use super::{by_flag, registry, OptionDescriptor, OptionError, OptionId, OptionValue};

/// Enabled flag and current value of one option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionEntry {
    pub enabled: bool,
    pub value: OptionValue,
}

/// Current configuration: one entry per registry descriptor, in registry order.
///
/// Front-ends mutate this through the setters only, so every stored value
/// always has the kind its descriptor declares.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionState {
    entries: Vec<OptionEntry>,
}

impl Default for OptionState {
    fn default() -> Self {
        Self {
            entries: registry()
                .iter()
                .map(|d| OptionEntry {
                    enabled: false,
                    value: d.default_value(),
                })
                .collect(),
        }
    }
}

impl OptionState {
    pub fn get(&self, id: OptionId) -> &OptionEntry {
        &self.entries[id.index()]
    }

    pub fn is_enabled(&self, id: OptionId) -> bool {
        self.get(id).enabled
    }

    pub fn value(&self, id: OptionId) -> &OptionValue {
        &self.get(id).value
    }

    /// Text value of a text option, `""` for any other kind.
    pub fn text(&self, id: OptionId) -> &str {
        match self.value(id) {
            OptionValue::Text(s) => s,
            _ => "",
        }
    }

    pub fn int(&self, id: OptionId) -> Option<i64> {
        match self.value(id) {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self, id: OptionId) -> Option<f64> {
        match self.value(id) {
            OptionValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Iterate descriptors with their entries in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static OptionDescriptor, &OptionEntry)> {
        registry().iter().zip(self.entries.iter())
    }

    pub fn set_enabled(&mut self, id: OptionId, enabled: bool) {
        self.entries[id.index()].enabled = enabled;
    }

    /// Flip the enabled flag and return the new state.
    pub fn toggle(&mut self, id: OptionId) -> bool {
        let entry = &mut self.entries[id.index()];
        entry.enabled = !entry.enabled;
        entry.enabled
    }

    pub fn set_value(&mut self, id: OptionId, value: OptionValue) -> Result<(), OptionError> {
        id.descriptor().check_kind(&value)?;
        self.entries[id.index()].value = value;
        Ok(())
    }

    /// Enable an option and give it a value in one step.
    pub fn enable_with(&mut self, id: OptionId, value: OptionValue) -> Result<(), OptionError> {
        self.set_value(id, value)?;
        self.set_enabled(id, true);
        Ok(())
    }

    /// Apply a `FLAG[=VALUE]` setting as typed on the command line.
    ///
    /// Without a value the option is enabled with its current value. Switches
    /// accept `true`/`false` (and `on`/`off`, `1`/`0`) as their value.
    pub fn apply_setting(&mut self, setting: &str) -> Result<OptionId, OptionError> {
        let (flag, value) = match setting.split_once('=') {
            Some((flag, value)) => (flag, Some(value)),
            None => (setting, None),
        };
        let desc = by_flag(flag)?;
        match (value, desc.value_key) {
            (None, _) => self.set_enabled(desc.id, true),
            (Some(raw), None) => {
                let enabled = parse_switch(raw).ok_or_else(|| OptionError::InvalidValue {
                    flag: desc.flag,
                    value: raw.to_string(),
                    reason: "expected true or false".into(),
                })?;
                self.set_enabled(desc.id, enabled);
            }
            (Some(raw), Some(_)) => {
                let value = desc.parse_value(raw)?;
                self.enable_with(desc.id, value)?;
            }
        }
        Ok(desc.id)
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
impl OptionState {
    pub(crate) fn set_int(&mut self, id: OptionId, value: i64) -> Result<(), OptionError> {
        self.set_value(id, OptionValue::Int(value))
    }

    pub(crate) fn set_text(
        &mut self,
        id: OptionId,
        value: impl Into<String>,
    ) -> Result<(), OptionError> {
        self.set_value(id, OptionValue::Text(value.into()))
    }
}
