//! Mount and unmount of the recognition surface.
//!
//! Mount builds the camera and the OCR engine from configuration and starts
//! provisioning the pool in the background. Unmount stops polling and tears
//! the pool down exactly once.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use ocrcam_api::AppState;
use ocrcam_capture::{CameraSource, StillImageCamera, SyntheticCamera};
use ocrcam_core::config::{CameraConfig, CameraSourceKind, EngineKind, PoolConfig};
use ocrcam_core::events::SurfaceEvent;
use ocrcam_ocr::{MockOcrEngine, OcrEngine, RecognitionPool, TesseractEngine};

/// Build the configured camera.
///
/// An image camera that fails to decode stays unattached; ticks are then
/// skipped until it is attached.
pub async fn build_camera(config: &CameraConfig) -> Arc<dyn CameraSource> {
    let size = config.size();
    match (config.source, &config.image_path) {
        (CameraSourceKind::Image, Some(path)) => {
            let camera = StillImageCamera::new(path.clone(), size);
            if let Err(e) = camera.attach().await {
                warn!(path = %path.display(), error = %e, "Camera image could not be attached");
            }
            Arc::new(camera)
        }
        _ => {
            info!(width = size.width, height = size.height, "Using synthetic camera");
            Arc::new(SyntheticCamera::new(size))
        }
    }
}

/// Build the configured OCR engine.
pub fn build_engine(config: &PoolConfig) -> Arc<dyn OcrEngine> {
    match config.engine {
        EngineKind::Tesseract => Arc::new(TesseractEngine::new().dpi(Some(config.tesseract_dpi))),
        EngineKind::Mock => Arc::new(MockOcrEngine::new()),
    }
}

/// Provision the pool in the background.
pub fn spawn_provisioning(pool: RecognitionPool, engine: Arc<dyn OcrEngine>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = pool.provision(engine).await {
            error!(error = %e, "Recognition pool provisioning failed");
        }
    })
}

/// Start polling as soon as the pool is ready.
pub fn spawn_autostart(state: &AppState) -> JoinHandle<()> {
    let polling = state.polling.clone();
    tokio::spawn(async move {
        match polling.start_when_ready().await {
            Ok(true) => info!("Polling started automatically"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Polling not started"),
        }
    })
}

/// Log every surface event until the channel closes.
pub fn spawn_result_logger(mut rx: broadcast::Receiver<SurfaceEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(SurfaceEvent::ResultUpdated { result }) => {
                    info!(worker_id = result.worker_id, text = %result.text, "Recognized text");
                }
                Ok(SurfaceEvent::PoolStatusChanged { status }) => {
                    info!(%status, "Pool status");
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Result logger fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Stop polling and release the pool.
pub async fn unmount(state: &AppState, provisioning: JoinHandle<()>) {
    state.polling.stop();
    state.pool.teardown().await;
    if let Err(e) = provisioning.await {
        warn!(error = %e, "Provisioning task ended abnormally");
    }
    info!("Unmounted");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use image::RgbaImage;
    use ocrcam_core::config::OcrCamConfig;
    use ocrcam_core::types::PoolStatus;

    #[tokio::test]
    async fn test_build_synthetic_camera() {
        let camera = build_camera(&CameraConfig::default()).await;
        assert!(camera.is_ready());
        assert_eq!(camera.size().width, 640);
    }

    #[tokio::test]
    async fn test_build_image_camera() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        RgbaImage::new(100, 50).save(&path).unwrap();

        let config = CameraConfig {
            source: CameraSourceKind::Image,
            image_path: Some(path),
            ..CameraConfig::default()
        };
        let camera = build_camera(&config).await;
        assert!(camera.is_ready());
        let frame = camera.capture().await.unwrap();
        assert_eq!((frame.width(), frame.height()), (640, 480));
    }

    #[tokio::test]
    async fn test_build_image_camera_missing_file_stays_detached() {
        let config = CameraConfig {
            source: CameraSourceKind::Image,
            image_path: Some("/nonexistent/page.png".into()),
            ..CameraConfig::default()
        };
        let camera = build_camera(&config).await;
        assert!(!camera.is_ready());
    }

    #[test]
    fn test_build_engine() {
        let mut config = PoolConfig::default();
        assert_eq!(build_engine(&config).name(), "tesseract");
        config.engine = EngineKind::Mock;
        assert_eq!(build_engine(&config).name(), "mock");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_autostart_and_unmount() {
        let mut config = OcrCamConfig::default();
        config.pool.engine = EngineKind::Mock;
        config.pool.size = 3;

        let camera = build_camera(&config.camera).await;
        let state = AppState::new(config.clone(), camera);
        let provisioning = spawn_provisioning(state.pool.clone(), build_engine(&config.pool));
        let autostart = spawn_autostart(&state);

        autostart.await.unwrap();
        assert!(state.polling.is_running());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(state.polling.result().unwrap().text, "MOCK OCR TEXT");

        unmount(&state, provisioning).await;
        assert!(!state.polling.is_running());
        assert_eq!(state.pool.status(), PoolStatus::Closed);

        // A second teardown is a no-op.
        state.pool.teardown().await;
        assert_eq!(state.pool.status(), PoolStatus::Closed);
    }
}
