use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::classifier::{GazeClassifier, DEFAULT_THRESHOLD};
use crate::monitor::MonitorSettings;
use crate::notify::{NotifyMode, NotifyPolicy};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub camera: CameraConfig,
    pub models: ModelsConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Max per-axis distance (px) of each eye from frame center.
    pub threshold: f32,
    pub frame_interval_ms: u64,
    pub notify_policy: NotifyPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub mirror: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub face_mesh: String,
    pub face_detector: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub mode: NotifyMode,
    pub bell: bool,
    pub message: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            frame_interval_ms: 16,
            notify_policy: NotifyPolicy::EveryFrame,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            face_mesh: "face_mesh.onnx".to_string(),
            face_detector: "face_detection.onnx".to_string(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            mode: NotifyMode::Console,
            bell: true,
            message: "Eye contact with the camera!".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigSource {
    Missing,
    Parsed,
    Invalid,
}

impl AppConfig {
    pub const PATH: &'static str = "config.json";

    /// Reads `path`. A missing file gives defaults; so does a file that fails
    /// to parse, with a warning.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::read(path).map(|(config, _)| config)
    }

    /// Like `load_from`, then writes the result back so the file lists every
    /// setting. A file that failed to parse is left untouched.
    pub fn load_and_refresh(path: &Path) -> Result<Self> {
        let (config, source) = Self::read(path)?;
        if source != ConfigSource::Invalid {
            config.save_to(path)?;
        }
        Ok(config)
    }

    fn read(path: &Path) -> Result<(Self, ConfigSource)> {
        if !path.exists() {
            info!(path = %path.display(), "no configuration file, using defaults");
            return Ok((Self::default(), ConfigSource::Missing));
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        // Missing fields fall back to Default via #[serde(default)]
        match serde_json::from_str::<AppConfig>(&content) {
            Ok(c) => {
                info!(path = %path.display(), "loaded configuration");
                Ok((c, ConfigSource::Parsed))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "error parsing config, using defaults");
                Ok((Self::default(), ConfigSource::Invalid))
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            classifier: GazeClassifier::new(self.detection.threshold),
            policy: self.detection.notify_policy,
            frame_interval: Duration::from_millis(self.detection.frame_interval_ms),
            ..MonitorSettings::default()
        }
    }
}
