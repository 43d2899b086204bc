//! OCR through tesseract, driven by `rusty_tesseract`.
//!
//! Worker initialization checks that tesseract runs and that the requested
//! language model is installed. Each job hands the crop to
//! `rusty_tesseract::image_to_string` on the blocking pool.

use async_trait::async_trait;
use image::RgbaImage;
use rusty_tesseract::image::{DynamicImage, RgbaImage as TessRgbaImage};
use rusty_tesseract::{Args, Image};
use tracing::debug;

use ocrcam_core::error::{OcrCamError, Result};

use crate::{OcrEngine, OcrWorker};

/// Engine backed by the `tesseract` executable on `PATH`.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    dpi: Option<i32>,
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self { dpi: Some(150) }
    }

    /// Resolution hint passed as `--dpi`. `None` lets tesseract guess.
    pub fn dpi(mut self, dpi: Option<i32>) -> Self {
        self.dpi = dpi;
        self
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn create_worker(&self, worker_id: usize, language: &str) -> Result<Box<dyn OcrWorker>> {
        let installed = tokio::task::spawn_blocking(rusty_tesseract::get_tesseract_langs)
            .await
            .map_err(|e| OcrCamError::Ocr(format!("Language check task panicked: {}", e)))?
            .map_err(|e| OcrCamError::Ocr(format!("tesseract unavailable: {}", e)))?;

        // `language` may name several models joined with `+`, e.g. `eng+deu`.
        let missing: Vec<&str> = language
            .split('+')
            .filter(|lang| !installed.iter().any(|l| l == lang))
            .collect();
        if !missing.is_empty() {
            return Err(OcrCamError::Ocr(format!(
                "language model(s) not installed: {}",
                missing.join(", ")
            )));
        }

        debug!(worker_id, language, "Tesseract worker initialized");
        Ok(Box::new(TesseractWorker {
            worker_id,
            args: Args {
                lang: language.to_string(),
                dpi: self.dpi,
                ..Args::default()
            },
        }))
    }
}

struct TesseractWorker {
    worker_id: usize,
    args: Args,
}

#[async_trait]
impl OcrWorker for TesseractWorker {
    async fn recognize(&mut self, image: &RgbaImage) -> Result<String> {
        let (width, height) = image.dimensions();
        let raw = image.as_raw().clone();
        let args = self.args.clone();

        let text = tokio::task::spawn_blocking(move || {
            let buffer = TessRgbaImage::from_raw(width, height, raw).ok_or_else(|| {
                OcrCamError::JobFailed(format!("Bad {}x{} image buffer", width, height))
            })?;
            let image = Image::from_dynamic_image(&DynamicImage::ImageRgba8(buffer))
                .map_err(|e| OcrCamError::JobFailed(e.to_string()))?;
            rusty_tesseract::image_to_string(&image, &args)
                .map_err(|e| OcrCamError::JobFailed(e.to_string()))
        })
        .await
        .map_err(|e| OcrCamError::JobFailed(format!("Recognition task panicked: {}", e)))??;

        debug!(worker_id = self.worker_id, chars = text.len(), "Tesseract job completed");
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_dpi() {
        assert_eq!(TesseractEngine::default().dpi, Some(150));
        assert_eq!(TesseractEngine::new().dpi(None).dpi, None);
    }

    #[cfg(unix)]
    mod fake_binary {
        use super::*;
        use std::ffi::OsString;
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};

        use image::Rgba;
        use tokio::sync::{Mutex, MutexGuard};

        // Tests here rewrite PATH, so they run one at a time.
        static PATH_LOCK: Mutex<()> = Mutex::const_new(());

        /// Points PATH at one directory until dropped.
        struct PathOverride {
            previous: Option<OsString>,
            _lock: MutexGuard<'static, ()>,
        }

        impl PathOverride {
            async fn new(dir: &Path) -> Self {
                let lock = PATH_LOCK.lock().await;
                let previous = std::env::var_os("PATH");
                std::env::set_var("PATH", dir);
                Self {
                    previous,
                    _lock: lock,
                }
            }
        }

        impl Drop for PathOverride {
            fn drop(&mut self) {
                match self.previous.take() {
                    Some(path) => std::env::set_var("PATH", path),
                    None => std::env::remove_var("PATH"),
                }
            }
        }

        /// Install a `tesseract` shell script in `dir` that knows `eng` and
        /// `osd`, prints padded text for any image, and exits 1 while a
        /// `fail` file exists next to it.
        fn install_fake_tesseract(dir: &Path) -> PathBuf {
            let script = format!(
                "#!/bin/sh\n\
                 case \"$1\" in\n\
                 --list-langs) echo 'List of available languages in \"/fake/\" (2):'; echo eng; echo osd; exit 0 ;;\n\
                 --version) echo 'tesseract 5.3.0'; exit 0 ;;\n\
                 esac\n\
                 if [ -f '{dir}/fail' ]; then echo 'Error: image too small' >&2; exit 1; fi\n\
                 printf '  FAKE TEXT\\n\\n'\n",
                dir = dir.display()
            );
            let path = dir.join("tesseract");
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn crop() -> RgbaImage {
            RgbaImage::from_pixel(320, 160, Rgba([255, 255, 255, 255]))
        }

        #[tokio::test]
        async fn test_recognize_trims_output() {
            let dir = tempfile::tempdir().unwrap();
            install_fake_tesseract(dir.path());
            let _path = PathOverride::new(dir.path()).await;

            let mut worker = TesseractEngine::new().create_worker(0, "eng").await.unwrap();
            assert_eq!(worker.recognize(&crop()).await.unwrap(), "FAKE TEXT");
        }

        #[tokio::test]
        async fn test_failed_run_maps_to_job_failed() {
            let dir = tempfile::tempdir().unwrap();
            install_fake_tesseract(dir.path());
            let _path = PathOverride::new(dir.path()).await;

            let mut worker = TesseractEngine::new()
                .create_worker(0, "eng+osd")
                .await
                .unwrap();
            std::fs::write(dir.path().join("fail"), "").unwrap();
            let err = worker.recognize(&crop()).await.unwrap_err();
            assert!(matches!(err, OcrCamError::JobFailed(_)));

            // The worker recovers once tesseract does.
            std::fs::remove_file(dir.path().join("fail")).unwrap();
            assert_eq!(worker.recognize(&crop()).await.unwrap(), "FAKE TEXT");
        }

        #[tokio::test]
        async fn test_missing_language_fails_worker_init() {
            let dir = tempfile::tempdir().unwrap();
            install_fake_tesseract(dir.path());
            let _path = PathOverride::new(dir.path()).await;

            let err = TesseractEngine::new()
                .create_worker(0, "eng+jpn")
                .await
                .err()
                .unwrap();
            assert!(matches!(err, OcrCamError::Ocr(_)));
            assert!(err.to_string().contains("jpn"));
        }

        #[tokio::test]
        async fn test_missing_binary_fails_worker_init() {
            let dir = tempfile::tempdir().unwrap();
            let _path = PathOverride::new(dir.path()).await;

            let err = TesseractEngine::new().create_worker(0, "eng").await.err().unwrap();
            assert!(matches!(err, OcrCamError::Ocr(_)));
            assert!(err.to_string().contains("tesseract unavailable"));
        }
    }
}
