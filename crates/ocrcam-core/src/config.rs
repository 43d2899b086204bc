use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OcrCamError, Result};
use crate::types::{CameraSize, ReadableRegion};

/// Top-level configuration for ocrcam.
///
/// Loaded from `~/.ocrcam/config.toml` by default. The camera size and the
/// readable region are fixed for the lifetime of a run; every component gets
/// the values it needs at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrCamConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub region: ReadableRegion,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

impl OcrCamConfig {
    /// Load configuration from a TOML file and validate it.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: OcrCamConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist, cannot be parsed, or is invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let size = self.camera.size();
        if size.width == 0 || size.height == 0 {
            return Err(OcrCamError::Config(format!(
                "camera size must be non-zero, got {}x{}",
                size.width, size.height
            )));
        }
        if !self.region.fits_within(size) {
            return Err(OcrCamError::InvalidRegion {
                region: self.region.to_string(),
                width: size.width,
                height: size.height,
            });
        }
        if self.pool.size == 0 {
            return Err(OcrCamError::Config("pool.size must be at least 1".into()));
        }
        if self.pool.queue_capacity == 0 {
            return Err(OcrCamError::Config(
                "pool.queue_capacity must be at least 1".into(),
            ));
        }
        if self.pool.language.trim().is_empty() {
            return Err(OcrCamError::Config("pool.language must not be empty".into()));
        }
        if self.polling.interval_ms == 0 {
            return Err(OcrCamError::Config(
                "polling.interval_ms must be greater than 0".into(),
            ));
        }
        if self.camera.source == CameraSourceKind::Image && self.camera.image_path.is_none() {
            return Err(OcrCamError::Config(
                "camera.image_path is required when camera.source = \"image\"".into(),
            ));
        }
        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(OcrCamError::Config(
                "camera.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP port for the presentation surface.
    pub port: u16,
    /// Bind address for the presentation surface.
    pub bind: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 3040,
            bind: "127.0.0.1".to_string(),
        }
    }
}

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraSourceKind {
    /// Generated test pattern.
    Synthetic,
    /// A still image file, resized to the camera resolution.
    Image,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub source: CameraSourceKind,
    /// Image file used when `source = "image"`.
    pub image_path: Option<PathBuf>,
    /// Preferred camera: "user" (front) or "environment" (rear).
    pub facing_mode: String,
    /// JPEG quality (1-100) of the live feed snapshots.
    pub jpeg_quality: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let size = CameraSize::default();
        Self {
            width: size.width,
            height: size.height,
            source: CameraSourceKind::Synthetic,
            image_path: None,
            facing_mode: "user".to_string(),
            jpeg_quality: 80,
        }
    }
}

impl CameraConfig {
    pub fn size(&self) -> CameraSize {
        CameraSize {
            width: self.width,
            height: self.height,
        }
    }
}

/// OCR engine backing each worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// The `tesseract` command-line program.
    Tesseract,
    /// Deterministic engine that returns fixed text.
    Mock,
}

/// What to do with a new job when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backpressure {
    /// Fail the new job with `QueueFull`.
    #[default]
    Reject,
    /// Drop the oldest queued job and enqueue the new one.
    DropOldest,
}

/// How to treat workers that fail to initialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitPolicy {
    /// Any failure fails the whole pool.
    #[default]
    AllOrNothing,
    /// Continue with the workers that did initialize (at least one).
    Partial,
}

/// Recognition pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of workers.
    pub size: usize,
    /// Language model each worker loads (tesseract language code).
    pub language: String,
    pub engine: EngineKind,
    /// Resolution hint passed to tesseract.
    pub tesseract_dpi: i32,
    /// Maximum number of jobs waiting for a worker.
    pub queue_capacity: usize,
    pub backpressure: Backpressure,
    pub init_policy: InitPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 5,
            language: "eng".to_string(),
            engine: EngineKind::Tesseract,
            tesseract_dpi: 150,
            queue_capacity: 16,
            backpressure: Backpressure::Reject,
            init_policy: InitPolicy::AllOrNothing,
        }
    }
}

/// What a tick does when the previous tick's job is still unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Skip the tick.
    #[default]
    SkipIfBusy,
    /// Submit anyway; jobs may overlap.
    Allow,
}

/// Polling controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Tick period in milliseconds.
    pub interval_ms: u64,
    pub overlap: OverlapPolicy,
    /// Start polling as soon as the pool is ready.
    pub autostart: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            overlap: OverlapPolicy::SkipIfBusy,
            autostart: false,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
