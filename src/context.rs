use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Preset file name, kept compatible with existing preset files.
pub const PRESETS_FILE: &str = "cfst_gui_presets_ext.json";

/// Paths shared by the process controller and the preset store for one
/// running instance of the launcher.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub working_dir: PathBuf,
    pub presets_path: PathBuf,
}

impl AppContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        let presets_path = working_dir.join(PRESETS_FILE);
        Self {
            working_dir,
            presets_path,
        }
    }

    pub fn from_current_dir() -> Result<Self> {
        let dir = std::env::current_dir().context("get current directory")?;
        Ok(Self::new(dir))
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}
