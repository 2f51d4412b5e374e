//! Scanner option registry.
//!
//! Every command-line switch understood by `cfst` is described once here, in the
//! order the arguments are emitted. Front-ends and the preset store only ever
//! address options through [`OptionId`] and the descriptors below.

mod state;

pub(crate) use state::OptionState;

use thiserror::Error;

/// Stable identity of a scanner option. Declaration order is argument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionId {
    ThreadCount,
    LatencyTestCount,
    DownloadSampleCount,
    DownloadDuration,
    TargetPort,
    TargetUrl,
    HttpProbeMode,
    HttpProbeStatusCodes,
    RegionFilter,
    MaxAvgLatency,
    MinAvgLatency,
    MaxLossRatio,
    MinDownloadSpeed,
    ResultDisplayCount,
    IpRangeFile,
    IpRangeLiteral,
    ResultOutputPath,
    DisableDownloadTest,
    ScanAllIps,
}

impl OptionId {
    pub const ALL: [OptionId; 19] = [
        OptionId::ThreadCount,
        OptionId::LatencyTestCount,
        OptionId::DownloadSampleCount,
        OptionId::DownloadDuration,
        OptionId::TargetPort,
        OptionId::TargetUrl,
        OptionId::HttpProbeMode,
        OptionId::HttpProbeStatusCodes,
        OptionId::RegionFilter,
        OptionId::MaxAvgLatency,
        OptionId::MinAvgLatency,
        OptionId::MaxLossRatio,
        OptionId::MinDownloadSpeed,
        OptionId::ResultDisplayCount,
        OptionId::IpRangeFile,
        OptionId::IpRangeLiteral,
        OptionId::ResultOutputPath,
        OptionId::DisableDownloadTest,
        OptionId::ScanAllIps,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn descriptor(self) -> &'static OptionDescriptor {
        &REGISTRY[self.index()]
    }
}

/// Value domain of an option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionKind {
    /// Flag without a value; the enabled state is the value.
    Switch,
    Int { min: i64, max: i64, default: i64 },
    Float { min: f64, max: f64, default: f64, step: f64 },
    Text,
}

impl OptionKind {
    fn name(self) -> &'static str {
        match self {
            OptionKind::Switch => "a boolean",
            OptionKind::Int { .. } => "an integer",
            OptionKind::Float { .. } => "a decimal",
            OptionKind::Text => "a text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Switch,
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    fn matches(&self, kind: OptionKind) -> bool {
        matches!(
            (self, kind),
            (OptionValue::Switch, OptionKind::Switch)
                | (OptionValue::Int(_), OptionKind::Int { .. })
                | (OptionValue::Float(_), OptionKind::Float { .. })
                | (OptionValue::Text(_), OptionKind::Text)
        )
    }

    /// Human-readable rendering used by summaries and the TUI.
    pub fn display(&self) -> String {
        match self {
            OptionValue::Switch => String::new(),
            OptionValue::Int(v) => v.to_string(),
            OptionValue::Float(v) => format!("{v:.2}"),
            OptionValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OptionError {
    #[error("unknown option `{0}`")]
    UnknownFlag(String),
    #[error("{flag} expects {expected} value")]
    KindMismatch {
        flag: &'static str,
        expected: &'static str,
    },
    #[error("invalid value `{value}` for {flag}: {reason}")]
    InvalidValue {
        flag: &'static str,
        value: String,
        reason: String,
    },
}

/// Static description of one scanner option.
#[derive(Debug)]
pub struct OptionDescriptor {
    pub id: OptionId,
    /// Command-line token, including the leading dash.
    pub flag: &'static str,
    /// Preset key holding the enabled state (and the value, for switches).
    pub enabled_key: &'static str,
    /// Preset key holding the value; `None` for switches.
    pub value_key: Option<&'static str>,
    pub kind: OptionKind,
    pub label: &'static str,
    pub hint: &'static str,
}

impl OptionDescriptor {
    pub fn default_value(&self) -> OptionValue {
        match self.kind {
            OptionKind::Switch => OptionValue::Switch,
            OptionKind::Int { default, .. } => OptionValue::Int(default),
            OptionKind::Float { default, .. } => OptionValue::Float(default),
            OptionKind::Text => OptionValue::Text(String::new()),
        }
    }

    /// Flag without its leading dash, as accepted on the launcher's command line.
    pub fn name(&self) -> &'static str {
        self.flag.trim_start_matches('-')
    }

    /// Inclusive range rendered for messages, `None` for non-numeric options.
    pub fn range_text(&self) -> Option<String> {
        match self.kind {
            OptionKind::Int { min, max, .. } => Some(format!("{min}-{max}")),
            OptionKind::Float { min, max, .. } => Some(format!("{min:.2}-{max:.2}")),
            _ => None,
        }
    }

    pub fn in_range(&self, value: &OptionValue) -> bool {
        match (self.kind, value) {
            (OptionKind::Int { min, max, .. }, OptionValue::Int(v)) => (min..=max).contains(v),
            (OptionKind::Float { min, max, .. }, OptionValue::Float(v)) => {
                (min..=max).contains(v)
            }
            _ => true,
        }
    }

    pub(crate) fn check_kind(&self, value: &OptionValue) -> Result<(), OptionError> {
        if value.matches(self.kind) {
            Ok(())
        } else {
            Err(OptionError::KindMismatch {
                flag: self.flag,
                expected: self.kind.name(),
            })
        }
    }

    /// Parse user input into a value of this option's kind. Numbers outside
    /// the declared range are rejected.
    ///
    /// Text is kept verbatim (untrimmed) because `-o ""` and `-o "  "` differ.
    pub fn parse_value(&self, input: &str) -> Result<OptionValue, OptionError> {
        let invalid = |reason: String| OptionError::InvalidValue {
            flag: self.flag,
            value: input.to_string(),
            reason,
        };
        let value = match self.kind {
            OptionKind::Switch => return Err(invalid("switch takes no value".into())),
            OptionKind::Int { .. } => input
                .trim()
                .parse::<i64>()
                .map(OptionValue::Int)
                .map_err(|e| invalid(e.to_string()))?,
            OptionKind::Float { .. } => match input.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => OptionValue::Float(v),
                Ok(_) => return Err(invalid("must be a finite number".into())),
                Err(e) => return Err(invalid(e.to_string())),
            },
            OptionKind::Text => return Ok(OptionValue::Text(input.to_string())),
        };
        if !self.in_range(&value) {
            let range = self.range_text().unwrap_or_default();
            return Err(invalid(format!("must be within {range}")));
        }
        Ok(value)
    }

    /// Pull a numeric value back into the declared range; other values pass through.
    pub fn clamp(&self, value: OptionValue) -> OptionValue {
        match (self.kind, value) {
            (OptionKind::Int { min, max, .. }, OptionValue::Int(v)) => {
                OptionValue::Int(v.clamp(min, max))
            }
            (OptionKind::Float { min, max, .. }, OptionValue::Float(v)) => {
                OptionValue::Float(v.clamp(min, max))
            }
            (_, other) => other,
        }
    }

    /// Move a numeric value one step up or down, clamped to the declared range.
    pub fn step(&self, value: &OptionValue, up: bool) -> OptionValue {
        match (self.kind, value) {
            (OptionKind::Int { min, max, .. }, OptionValue::Int(v)) => {
                let next = if up { v.saturating_add(1) } else { v.saturating_sub(1) };
                OptionValue::Int(next.clamp(min, max))
            }
            (OptionKind::Float { min, max, step, .. }, OptionValue::Float(v)) => {
                let next = if up { v + step } else { v - step };
                let rounded = (next * 100.0).round() / 100.0;
                OptionValue::Float(rounded.clamp(min, max))
            }
            _ => value.clone(),
        }
    }
}

/// Look up an option by its flag, with or without the leading dash.
pub fn by_flag(flag: &str) -> Result<&'static OptionDescriptor, OptionError> {
    let name = flag.trim().trim_start_matches('-');
    REGISTRY
        .iter()
        .find(|d| d.name() == name)
        .ok_or_else(|| OptionError::UnknownFlag(flag.to_string()))
}

pub fn registry() -> &'static [OptionDescriptor] {
    &REGISTRY
}

const fn int(min: i64, max: i64, default: i64) -> OptionKind {
    OptionKind::Int { min, max, default }
}

static REGISTRY: [OptionDescriptor; 19] = [
    OptionDescriptor {
        id: OptionId::ThreadCount,
        flag: "-n",
        enabled_key: "n_enabled",
        value_key: Some("n_value"),
        kind: int(1, 1000, 200),
        label: "Latency test threads",
        hint: "default 200",
    },
    OptionDescriptor {
        id: OptionId::LatencyTestCount,
        flag: "-t",
        enabled_key: "t_enabled",
        value_key: Some("t_value"),
        kind: int(1, 100, 4),
        label: "Latency tests per IP",
        hint: "default 4",
    },
    OptionDescriptor {
        id: OptionId::DownloadSampleCount,
        flag: "-dn",
        enabled_key: "dn_enabled",
        value_key: Some("dn_value"),
        kind: int(0, 1000, 10),
        label: "IPs to download-test",
        hint: "default 10",
    },
    OptionDescriptor {
        id: OptionId::DownloadDuration,
        flag: "-dt",
        enabled_key: "dt_enabled",
        value_key: Some("dt_value"),
        kind: int(1, 3600, 10),
        label: "Download test seconds",
        hint: "default 10",
    },
    OptionDescriptor {
        id: OptionId::TargetPort,
        flag: "-tp",
        enabled_key: "tp_enabled",
        value_key: Some("tp_value"),
        kind: int(1, 65535, 443),
        label: "Test port",
        hint: "default 443",
    },
    OptionDescriptor {
        id: OptionId::TargetUrl,
        flag: "-url",
        enabled_key: "url_enabled",
        value_key: Some("url_value"),
        kind: OptionKind::Text,
        label: "Test URL",
        hint: "used by HTTPing/TCPing",
    },
    OptionDescriptor {
        id: OptionId::HttpProbeMode,
        flag: "-httping",
        enabled_key: "httping",
        value_key: None,
        kind: OptionKind::Switch,
        label: "HTTP probe mode",
        hint: "latency via HTTP instead of TCP",
    },
    OptionDescriptor {
        id: OptionId::HttpProbeStatusCodes,
        flag: "-httping-code",
        enabled_key: "httping_code_enabled",
        value_key: Some("httping_code"),
        kind: OptionKind::Text,
        label: "HTTPing status codes",
        hint: "default 200 301 302",
    },
    OptionDescriptor {
        id: OptionId::RegionFilter,
        flag: "-cfcolo",
        enabled_key: "cfcolo_enabled",
        value_key: Some("cfcolo"),
        kind: OptionKind::Text,
        label: "Colo filter",
        hint: "comma separated, e.g. HKG,LAX (HTTPing only)",
    },
    OptionDescriptor {
        id: OptionId::MaxAvgLatency,
        flag: "-tl",
        enabled_key: "tl_enabled",
        value_key: Some("tl_value"),
        kind: int(0, 99999, 9999),
        label: "Max average latency (ms)",
        hint: "default 9999",
    },
    OptionDescriptor {
        id: OptionId::MinAvgLatency,
        flag: "-tll",
        enabled_key: "tll_enabled",
        value_key: Some("tll_value"),
        kind: int(0, 99999, 0),
        label: "Min average latency (ms)",
        hint: "default 0",
    },
    OptionDescriptor {
        id: OptionId::MaxLossRatio,
        flag: "-tlr",
        enabled_key: "tlr_enabled",
        value_key: Some("tlr_value"),
        kind: OptionKind::Float {
            min: 0.0,
            max: 1.0,
            default: 1.0,
            step: 0.01,
        },
        label: "Max loss ratio",
        hint: "default 1.00",
    },
    OptionDescriptor {
        id: OptionId::MinDownloadSpeed,
        flag: "-sl",
        enabled_key: "sl_enabled",
        value_key: Some("sl_value"),
        kind: OptionKind::Float {
            min: 0.0,
            max: 10000.0,
            default: 0.0,
            step: 0.1,
        },
        label: "Min download speed (MB/s)",
        hint: "default 0.00",
    },
    OptionDescriptor {
        id: OptionId::ResultDisplayCount,
        flag: "-p",
        enabled_key: "p_enabled",
        value_key: Some("p_value"),
        kind: int(0, 10000, 10),
        label: "Results to display",
        hint: "default 10, 0 exits without printing",
    },
    OptionDescriptor {
        id: OptionId::IpRangeFile,
        flag: "-f",
        enabled_key: "f_enabled",
        value_key: Some("f_value"),
        kind: OptionKind::Text,
        label: "IP range file",
        hint: "e.g. ip.txt",
    },
    OptionDescriptor {
        id: OptionId::IpRangeLiteral,
        flag: "-ip",
        enabled_key: "ip_enabled",
        value_key: Some("ip_value"),
        kind: OptionKind::Text,
        label: "IP ranges",
        hint: "comma separated, e.g. 1.1.1.1/24",
    },
    OptionDescriptor {
        id: OptionId::ResultOutputPath,
        flag: "-o",
        enabled_key: "o_enabled",
        value_key: Some("o_value"),
        kind: OptionKind::Text,
        label: "Result file",
        hint: "empty writes no file",
    },
    OptionDescriptor {
        id: OptionId::DisableDownloadTest,
        flag: "-dd",
        enabled_key: "dd",
        value_key: None,
        kind: OptionKind::Switch,
        label: "Disable download test",
        hint: "results sorted by latency",
    },
    OptionDescriptor {
        id: OptionId::ScanAllIps,
        flag: "-allip",
        enabled_key: "allip",
        value_key: None,
        kind: OptionKind::Switch,
        label: "Test every IP",
        hint: "every IPv4 in each range",
    },
];
