use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PanelConfig {
    pub controller_url: String,
    pub initial_x_limit: f64,     // seconds on the time axis at startup
    pub extension_increment: f64, // seconds added per domain extension
    pub extension_threshold: f64, // drag past x_limit * threshold arms an extension
    pub extension_delay_ms: u64,
    pub playback_fps: u32,
    pub watchdog_interval_ms: u64,
    pub request_queue_len: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            controller_url: "http://192.168.10.1".to_string(),
            initial_x_limit: 30.0,
            extension_increment: 10.0,
            extension_threshold: 1.05,
            extension_delay_ms: 500,
            playback_fps: 30,
            watchdog_interval_ms: 100,
            request_queue_len: 64,
        }
    }
}

impl PanelConfig {
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        config.controller_url = config.controller_url.trim().trim_end_matches('/').to_string();
        config.initial_x_limit = config.initial_x_limit.clamp(1.0, 3600.0);
        config.extension_increment = config.extension_increment.clamp(1.0, 3600.0);
        config.extension_threshold = config.extension_threshold.clamp(1.0, 2.0);
        config.extension_delay_ms = config.extension_delay_ms.clamp(10, 10_000);
        config.playback_fps = config.playback_fps.clamp(1, 120);
        config.watchdog_interval_ms = config.watchdog_interval_ms.clamp(10, 10_000);
        config.request_queue_len = config.request_queue_len.clamp(1, 4096);
        config
    }
}

/// JSON-file backed settings store.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/ctrl-panel/config.json`, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("ctrl-panel"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn set_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, json)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", self.path.display(), e))
    }

    fn get_json<T: DeserializeOwned>(&self) -> Result<T> {
        let string = fs::read_to_string(&self.path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", self.path.display(), e))?;
        serde_json::from_str(&string)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", self.path.display(), e))
    }

    pub fn set_panel_config(&self, config: &PanelConfig) -> Result<()> {
        self.set_json(&config.sanitized())
    }

    pub fn get_panel_config(&self) -> Result<PanelConfig> {
        self.get_json::<PanelConfig>().map(|c| c.sanitized())
    }

    /// Stored config, or defaults if none has been saved yet.
    pub fn load_or_default(&self) -> Result<PanelConfig> {
        if !self.path.exists() {
            log::info!("No config at {}, using defaults", self.path.display());
            return Ok(PanelConfig::default());
        }
        self.get_panel_config()
    }
}
