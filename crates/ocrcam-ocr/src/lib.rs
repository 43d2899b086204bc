//! ocrcam OCR crate - OCR engine traits, implementations, and the recognition pool.
//!
//! An [`OcrEngine`] creates initialized [`OcrWorker`]s bound to one language.
//! The [`RecognitionPool`] provisions a fixed number of workers in parallel and
//! feeds them jobs from a bounded queue. Two engines ship here: a
//! [`TesseractEngine`] that drives the `tesseract` command-line program and a
//! [`MockOcrEngine`] for tests.

pub mod mock;
pub mod pool;
pub mod tesseract;

use async_trait::async_trait;
use image::RgbaImage;

use ocrcam_core::error::Result;

pub use mock::{MockCounters, MockOcrEngine};
pub use pool::{JobHandle, PoolOptions, RecognitionPool};
pub use tesseract::TesseractEngine;

/// Factory for OCR workers.
///
/// Implementations wrap an OCR backend (a CLI program, a linked library, a
/// remote service) behind a uniform async interface.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Create and fully initialize one worker for `language`.
    ///
    /// The returned worker is ready to recognize immediately.
    async fn create_worker(&self, worker_id: usize, language: &str) -> Result<Box<dyn OcrWorker>>;
}

/// One initialized OCR engine instance. Processes one image at a time.
#[async_trait]
pub trait OcrWorker: Send {
    /// Recognize the text in `image`.
    ///
    /// Returns the extracted text, which may be empty.
    async fn recognize(&mut self, image: &RgbaImage) -> Result<String>;

    /// Release the worker's resources. Called exactly once, on pool teardown.
    async fn terminate(&mut self) {}
}
