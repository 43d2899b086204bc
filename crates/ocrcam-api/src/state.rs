//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use ocrcam_capture::CameraSource;
use ocrcam_core::config::OcrCamConfig;
use ocrcam_core::events::SurfaceEvent;
use ocrcam_ocr::{PoolOptions, RecognitionPool};
use ocrcam_poll::{PollingController, PollingOptions};

/// Shared application state.
///
/// Cheap to clone: every field is an `Arc` or a handle around one.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<OcrCamConfig>,
    pub camera: Arc<dyn CameraSource>,
    /// Recognition pool. Starts unprovisioned; the caller provisions it.
    pub pool: RecognitionPool,
    pub polling: PollingController,
    /// Broadcast sender for SSE events.
    pub event_tx: broadcast::Sender<SurfaceEvent>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Wire the pool and the polling controller around `camera`.
    pub fn new(config: OcrCamConfig, camera: Arc<dyn CameraSource>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let pool = RecognitionPool::new(PoolOptions::from(&config.pool));
        let polling = PollingController::new(
            Arc::clone(&camera),
            pool.clone(),
            PollingOptions::from_config(&config),
            event_tx.clone(),
        );
        Self {
            config: Arc::new(config),
            camera,
            pool,
            polling,
            event_tx,
            start_time: Instant::now(),
        }
    }
}
