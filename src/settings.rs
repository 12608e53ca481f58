// Settings - JSON file at <config_dir>/xpander/settings.json
// Missing file or fields fall back to defaults; saves are atomic.

use crate::output::OutputDelays;
use crate::phrase::Hotkey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR_NAME: &str = "xpander";
const SETTINGS_FILE_NAME: &str = "settings.json";
const PHRASES_DIR_NAME: &str = "phrases";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Could not determine the config directory")]
    NoConfigDir,
    #[error("Failed to load settings from {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("Failed to save settings to {path:?}: {source}")]
    Save { path: PathBuf, source: io::Error },
}

/// Engine-wide preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Re-emit the trigger character after an expansion
    pub keep_trigger: bool,
    /// Tab advances to the next caret stop
    pub use_tab: bool,
    pub pause_hotkey: Option<Hotkey>,
    pub editor_hotkey: Option<Hotkey>,
    /// Defaults to <config_dir>/xpander/phrases
    pub phrase_dir: Option<PathBuf>,
    pub typing_delay_ms: u64,
    pub key_delay_ms: u64,
    pub paste_settle_ms: u64,
    /// How long matching stays muted after the last injected key
    pub release_settle_ms: u64,
    pub command_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keep_trigger: false,
            use_tab: true,
            pause_hotkey: None,
            editor_hotkey: None,
            phrase_dir: None,
            typing_delay_ms: 5,
            key_delay_ms: 10,
            paste_settle_ms: 100,
            release_settle_ms: 20,
            command_timeout_ms: 1000,
        }
    }
}

/// Returns {config_dir}/xpander/
pub fn config_dir() -> Result<PathBuf, SettingsError> {
    let base = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
    Ok(base.join(APP_DIR_NAME))
}

/// Returns {config_dir}/xpander/settings.json
pub fn default_path() -> Result<PathBuf, SettingsError> {
    Ok(config_dir()?.join(SETTINGS_FILE_NAME))
}

impl Settings {
    /// Read settings from `path`, or defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                crate::debug!("No settings file at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SettingsError::Load {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_str(&content).map_err(|e| SettingsError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let save_err = |source| SettingsError::Save {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| save_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        crate::util::write_atomic(path, &json).map_err(save_err)?;
        crate::debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Phrase directory, falling back to {config_dir}/xpander/phrases
    pub fn phrase_dir(&self) -> Result<PathBuf, SettingsError> {
        match &self.phrase_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(config_dir()?.join(PHRASES_DIR_NAME)),
        }
    }

    pub fn output_delays(&self) -> OutputDelays {
        OutputDelays {
            key: Duration::from_millis(self.key_delay_ms),
            fragment: Duration::from_millis(self.key_delay_ms),
            paste_settle: Duration::from_millis(self.paste_settle_ms),
            release_settle: Duration::from_millis(self.release_settle_ms),
        }
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
