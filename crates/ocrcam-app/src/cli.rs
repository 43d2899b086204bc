//! CLI argument definitions for the ocrcam binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::Parser;

use ocrcam_core::config::{CameraSourceKind, EngineKind, OcrCamConfig};

/// ocrcam - reads the text in front of the camera.
#[derive(Parser, Debug)]
#[command(name = "ocrcam", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Use this image file as the camera instead of the synthetic pattern.
    #[arg(long = "camera-image")]
    pub camera_image: Option<PathBuf>,

    /// OCR engine: tesseract or mock.
    #[arg(long = "engine", value_parser = parse_engine)]
    pub engine: Option<EngineKind>,

    /// Run without the HTTP surface. Polling starts once the pool is ready
    /// and every result is logged.
    #[arg(long = "headless")]
    pub headless: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > OCRCAM_CONFIG env var > ~/.ocrcam/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("OCRCAM_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > OCRCAM_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("OCRCAM_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    /// Fold the command-line overrides into `config`.
    pub fn apply(&self, config: &mut OcrCamConfig) {
        config.general.port = self.resolve_port(config.general.port);
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref path) = self.camera_image {
            config.camera.source = CameraSourceKind::Image;
            config.camera.image_path = Some(path.clone());
        }
        if let Some(engine) = self.engine {
            config.pool.engine = engine;
        }
        if self.headless {
            config.polling.autostart = true;
        }
    }
}

fn parse_engine(value: &str) -> Result<EngineKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "tesseract" => Ok(EngineKind::Tesseract),
        "mock" => Ok(EngineKind::Mock),
        other => Err(format!(
            "unknown engine '{}', expected 'tesseract' or 'mock'",
            other
        )),
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".ocrcam").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".ocrcam").join("config.toml");
    }
    PathBuf::from("config.toml")
}
