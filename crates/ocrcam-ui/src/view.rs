//! View model for the presentation surface.

use serde::{Deserialize, Serialize};
use tracing::warn;

use ocrcam_capture::CameraSource;
use ocrcam_core::error::Result;
use ocrcam_core::types::{PollingStatus, PoolStatus, RecognitionResult};
use ocrcam_poll::{PollingController, PollingStats};

use crate::overlay::OverlayMask;

/// The single START/STOP control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlButton {
    pub label: &'static str,
    pub enabled: bool,
}

impl ControlButton {
    /// `START` while stopped, `STOP` while running; disabled until the pool
    /// is ready.
    pub fn new(polling: PollingStatus, ready: bool) -> Self {
        let label = match polling {
            PollingStatus::Stopped => "START",
            PollingStatus::Running => "STOP",
        };
        Self {
            label,
            enabled: ready,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraStatus {
    pub width: u32,
    pub height: u32,
    pub attached: bool,
}

/// Everything the surface renders, as served on `/state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceView {
    pub pool: PoolStatus,
    pub ready: bool,
    pub polling: PollingStatus,
    pub button_label: String,
    pub button_enabled: bool,
    pub result: Option<RecognitionResult>,
    pub last_error: Option<String>,
    pub overlay: OverlayMask,
    pub camera: CameraStatus,
    pub stats: PollingStats,
}

impl SurfaceView {
    /// Snapshot the controller, its pool and its camera.
    pub fn snapshot(polling: &PollingController) -> Result<Self> {
        let pool = polling.pool().status();
        let ready = pool == PoolStatus::Ready;
        let status = polling.status();
        let button = ControlButton::new(status, ready);
        let latest = polling.latest();

        let camera = polling.camera();
        let size = camera.size();
        let overlay = OverlayMask::new(size, polling.options().region).inspect_err(|e| {
            warn!(error = %e, "Readable region does not fit the camera");
        })?;

        Ok(Self {
            pool,
            ready,
            polling: status,
            button_label: button.label.to_string(),
            button_enabled: button.enabled,
            result: latest.result,
            last_error: latest.last_error,
            overlay,
            camera: CameraStatus {
                width: size.width,
                height: size.height,
                attached: camera.is_ready(),
            },
            stats: polling.stats(),
        })
    }

    /// Text currently shown, empty before the first result.
    pub fn text(&self) -> &str {
        self.result.as_ref().map(|r| r.text.as_str()).unwrap_or("")
    }
}
