//! Camera backed by a still image file.
//!
//! `attach` decodes the file and scales it to the configured resolution, the
//! same way a live stream is negotiated down to fixed video constraints.
//! Until then the camera reports not-ready and captures fail with
//! `OcrCamError::CameraUnavailable`.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::{debug, info};

use ocrcam_core::error::{OcrCamError, Result};
use ocrcam_core::types::{CameraSize, Frame};

use crate::CameraSource;

pub struct StillImageCamera {
    path: PathBuf,
    size: CameraSize,
    current: RwLock<Option<RgbaImage>>,
}

impl StillImageCamera {
    /// Create an unattached camera for `path`.
    pub fn new(path: impl Into<PathBuf>, size: CameraSize) -> Self {
        Self {
            path: path.into(),
            size,
            current: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn current(&self) -> RwLockReadGuard<'_, Option<RgbaImage>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_mut(&self) -> RwLockWriteGuard<'_, Option<RgbaImage>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decode the image file and attach it as the stream.
    ///
    /// Decoding runs on the blocking pool. On failure the camera stays
    /// unattached.
    pub async fn attach(&self) -> Result<()> {
        let path = self.path.clone();
        let size = self.size;
        let image = tokio::task::spawn_blocking(move || load_scaled(&path, size))
            .await
            .map_err(|e| OcrCamError::Capture(format!("Image decode task panicked: {}", e)))??;

        *self.current_mut() = Some(image);
        info!(path = %self.path.display(), width = size.width, height = size.height, "Camera stream attached");
        Ok(())
    }

    /// Drop the attached stream.
    pub fn detach(&self) {
        *self.current_mut() = None;
        debug!(path = %self.path.display(), "Camera stream detached");
    }
}

fn load_scaled(path: &Path, size: CameraSize) -> Result<RgbaImage> {
    let image = image::open(path)?.to_rgba8();
    if image.width() == size.width && image.height() == size.height {
        return Ok(image);
    }
    Ok(imageops::resize(
        &image,
        size.width,
        size.height,
        FilterType::Triangle,
    ))
}

#[async_trait]
impl CameraSource for StillImageCamera {
    fn size(&self) -> CameraSize {
        self.size
    }

    fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    async fn capture(&self) -> Result<Frame> {
        match self.current().as_ref() {
            Some(image) => Ok(Frame::new(image.clone())),
            None => Err(OcrCamError::CameraUnavailable),
        }
    }
}
