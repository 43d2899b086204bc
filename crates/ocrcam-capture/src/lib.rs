//! ocrcam Capture crate - camera sources and frame imaging helpers.
//!
//! Provides the CameraSource trait for on-demand still-frame capture, a
//! SyntheticCamera that generates a test pattern (and can be attached or
//! detached at runtime), a StillImageCamera backed by an image file, and the
//! crop/encode helpers the polling loop and live feed use.

pub mod imaging;
pub mod still_image;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use image::{Rgba, RgbaImage};

use ocrcam_core::error::{OcrCamError, Result};
use ocrcam_core::types::{CameraSize, Frame};

pub use imaging::{crop, encode_jpeg};
pub use still_image::StillImageCamera;

/// A camera that can hand out still frames on request.
///
/// `capture` must only be called once the stream is attached; otherwise it
/// returns `OcrCamError::CameraUnavailable` and the caller skips the cycle.
#[async_trait]
pub trait CameraSource: Send + Sync {
    /// Resolution of every frame this source produces.
    fn size(&self) -> CameraSize;

    /// Whether a stream is attached and `capture` can succeed.
    fn is_ready(&self) -> bool;

    /// Snapshot the current frame.
    async fn capture(&self) -> Result<Frame>;
}

/// Camera that renders a deterministic test pattern.
///
/// Each capture draws a checkerboard shifted by the capture count, so
/// consecutive frames differ. A fixed image can be supplied instead with
/// [`SyntheticCamera::with_image`].
#[derive(Debug)]
pub struct SyntheticCamera {
    size: CameraSize,
    attached: AtomicBool,
    captures: AtomicU64,
    fixed: Option<RgbaImage>,
}

impl SyntheticCamera {
    /// Create an attached camera.
    pub fn new(size: CameraSize) -> Self {
        Self {
            size,
            attached: AtomicBool::new(true),
            captures: AtomicU64::new(0),
            fixed: None,
        }
    }

    /// Create a camera whose stream is not attached yet.
    pub fn detached(size: CameraSize) -> Self {
        let camera = Self::new(size);
        camera.attached.store(false, Ordering::SeqCst);
        camera
    }

    /// Create an attached camera that always returns `image`.
    ///
    /// The image is used as-is; its dimensions become the camera size.
    pub fn with_image(image: RgbaImage) -> Self {
        let size = CameraSize {
            width: image.width(),
            height: image.height(),
        };
        Self {
            fixed: Some(image),
            ..Self::new(size)
        }
    }

    pub fn attach(&self) {
        self.attached.store(true, Ordering::SeqCst);
        tracing::debug!("Synthetic camera stream attached");
    }

    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
        tracing::debug!("Synthetic camera stream detached");
    }

    /// Number of successful captures so far.
    pub fn captures(&self) -> u64 {
        self.captures.load(Ordering::SeqCst)
    }

    fn render(&self, seq: u64) -> RgbaImage {
        const CELL: u32 = 32;
        let shift = (seq % u64::from(CELL)) as u32;
        RgbaImage::from_fn(self.size.width, self.size.height, |x, y| {
            let dark = ((x + shift) / CELL + y / CELL) % 2 == 0;
            if dark {
                Rgba([32, 32, 32, 255])
            } else {
                Rgba([224, 224, 224, 255])
            }
        })
    }
}

#[async_trait]
impl CameraSource for SyntheticCamera {
    fn size(&self) -> CameraSize {
        self.size
    }

    fn is_ready(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    async fn capture(&self) -> Result<Frame> {
        if !self.is_ready() {
            return Err(OcrCamError::CameraUnavailable);
        }
        let seq = self.captures.fetch_add(1, Ordering::SeqCst);
        let image = match &self.fixed {
            Some(image) => image.clone(),
            None => self.render(seq),
        };
        Ok(Frame::new(image))
    }
}
