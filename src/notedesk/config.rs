use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";

/// Persisted application state, stored as config.json in the per-user
/// config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    /// The notes directory being watched. `None` until the user first picks
    /// one.
    pub base_dir: Option<PathBuf>,

    /// File name of the note that was open when the app last ran. Consumed
    /// (cleared) by the startup restore, re-written on every selection.
    pub last_open: Option<String>,

    /// UI layout blob owned by the view layer; round-tripped opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<serde_json::Value>,
}

impl AppConfig {
    /// Load config from the given directory, or return defaults if not found.
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the given directory, creating it if needed.
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }
}

/// The per-user config directory, when the platform provides one.
pub fn default_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "notedesk", "notedesk")
        .map(|dirs| dirs.config_dir().to_path_buf())
}
