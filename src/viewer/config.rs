//! Viewer configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::camera_rig::CameraRigConfig;
use crate::core::error::Error;
use crate::core::types::Result;

/// Default control server port
pub const DEFAULT_CONTROL_PORT: u16 = 9742;

/// Window parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "voxview".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Remote control server parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: DEFAULT_CONTROL_PORT,
        }
    }
}

/// Full viewer configuration
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraRigConfig,
    /// Clear colour as 0xRRGGBB
    pub background: u32,
    /// Tone-mapping exposure
    pub exposure: f32,
    /// Octree-to-JSON converter executable
    pub converter: PathBuf,
    /// Where exported PLY files are written
    pub export_dir: PathBuf,
    pub control: ControlConfig,
    /// Maximum gap between two clicks of a double click, in milliseconds
    pub double_click_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraRigConfig::default(),
            background: 0xF0F0F0,
            exposure: 1.7,
            converter: PathBuf::from("./bin/octomap2json"),
            export_dir: PathBuf::from("."),
            control: ControlConfig::default(),
            double_click_ms: 400,
        }
    }
}

impl ViewerConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ViewerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Reject values the renderer cannot work with
    pub fn validate(&self) -> Result<()> {
        let cam = &self.camera;
        if !(cam.fov_y_degrees > 0.0 && cam.fov_y_degrees < 180.0) {
            return Err(Error::Config(format!("fov_y_degrees out of range: {}", cam.fov_y_degrees)));
        }
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return Err(Error::Config(format!("invalid clip planes: near {} far {}", cam.near, cam.far)));
        }
        if cam.frustum_size <= 0.0 {
            return Err(Error::Config(format!("frustum_size must be positive: {}", cam.frustum_size)));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(Error::Config("window size must be non-zero".to_string()));
        }
        if self.exposure <= 0.0 {
            return Err(Error::Config(format!("exposure must be positive: {}", self.exposure)));
        }
        Ok(())
    }

    /// Background as sRGB in [0, 1]
    pub fn background_rgb(&self) -> [f32; 3] {
        crate::render::batch::hex_rgb(self.background)
    }

    pub fn double_click_interval(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}
