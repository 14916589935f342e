// SPDX-License-Identifier: GPL-3.0-only

//! Persistent settings
//!
//! Stored as JSON in `<config dir>/smartcam/config.json`. Missing fields fall
//! back to their defaults so older files keep loading.

use crate::constants::{storage, timing};
use crate::errors::{AppError, AppResult};
use crate::filters::FilterMode;
use crate::session::{BindingConfig, Facing};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Directory name under the platform config directory
pub const CONFIG_DIR_NAME: &str = "smartcam";
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera used at startup
    pub facing: Facing,
    /// Whether text and barcode detection start enabled
    pub detection_enabled: bool,
    /// Preview filter at startup
    pub filter_mode: FilterMode,
    /// Torch state requested for the back camera
    pub torch_enabled: bool,
    /// Hold time before a press becomes a recording (milliseconds)
    pub long_press_ms: u64,
    /// Filter preview refresh interval (milliseconds)
    pub filter_tick_ms: u64,
    /// How long a detection result stays visible (milliseconds)
    pub result_display_ms: u64,
    /// How long the filter label stays visible (milliseconds)
    pub filter_label_ms: u64,
    /// How long a rebind waits for an in-flight frame (milliseconds)
    pub analyzer_drain_ms: u64,
    /// Where photos are saved; platform pictures directory when unset
    pub photo_dir: Option<PathBuf>,
    /// Where recordings are saved; platform videos directory when unset
    pub video_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            facing: Facing::Back,
            detection_enabled: false,
            filter_mode: FilterMode::Normal,
            torch_enabled: false,
            long_press_ms: timing::LONG_PRESS_THRESHOLD.as_millis() as u64,
            filter_tick_ms: timing::FILTER_TICK_INTERVAL.as_millis() as u64,
            result_display_ms: timing::RESULT_DISPLAY.as_millis() as u64,
            filter_label_ms: timing::FILTER_LABEL_DISPLAY.as_millis() as u64,
            analyzer_drain_ms: timing::ANALYZER_DRAIN_TIMEOUT.as_millis() as u64,
            photo_dir: None,
            video_dir: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing or invalid file yields the defaults
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Save to the default location
    pub fn save(&self) -> AppResult<()> {
        let path = Self::default_path()
            .ok_or_else(|| AppError::Config("No config directory available".to_string()))?;
        self.save_to(&path)
    }

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Binding configuration to start the session with
    pub fn binding_config(&self) -> BindingConfig {
        BindingConfig {
            facing: self.facing,
            detection_enabled: self.detection_enabled,
            filter_mode: self.filter_mode,
            recording_supported: true,
            torch_enabled: self.torch_enabled && self.facing == Facing::Back,
        }
    }

    /// Remember the toggles of `binding` for the next start
    pub fn remember(&mut self, binding: &BindingConfig) {
        self.facing = binding.facing;
        self.detection_enabled = binding.detection_enabled;
        self.filter_mode = binding.filter_mode;
        self.torch_enabled = binding.torch_enabled;
    }

    pub fn long_press_threshold(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn filter_tick_interval(&self) -> Duration {
        Duration::from_millis(self.filter_tick_ms.max(1))
    }

    pub fn result_display(&self) -> Duration {
        Duration::from_millis(self.result_display_ms)
    }

    pub fn filter_label_display(&self) -> Duration {
        Duration::from_millis(self.filter_label_ms)
    }

    pub fn analyzer_drain_timeout(&self) -> Duration {
        Duration::from_millis(self.analyzer_drain_ms)
    }

    /// Directory for photos
    pub fn photo_directory(&self) -> PathBuf {
        self.photo_dir.clone().unwrap_or_else(|| {
            dirs::picture_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(storage::APP_FOLDER)
        })
    }

    /// Directory for recordings
    pub fn video_directory(&self) -> PathBuf {
        self.video_dir.clone().unwrap_or_else(|| {
            dirs::video_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(storage::APP_FOLDER)
        })
    }
}
