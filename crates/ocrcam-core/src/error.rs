use thiserror::Error;

/// Top-level error type for ocrcam.
///
/// Camera, pool and surface failures all funnel into this enum so the `?`
/// operator works across crate boundaries. Callers that need to recover
/// locally (a skipped tick, a failed job) match on the variant.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OcrCamError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Camera unavailable: no stream attached")]
    CameraUnavailable,

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Region {region} does not fit inside a {width}x{height} frame")]
    InvalidRegion {
        region: String,
        width: u32,
        height: u32,
    },

    #[error("Image error: {0}")]
    Image(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Worker initialization failed: {failed} of {total} workers")]
    WorkerInitFailed { failed: usize, total: usize },

    #[error("Recognition job failed: {0}")]
    JobFailed(String),

    #[error("Job queue full ({capacity} pending)")]
    QueueFull { capacity: usize },

    #[error("Job dropped from queue to make room for a newer one")]
    JobDropped,

    #[error("Recognition pool is closed")]
    PoolClosed,

    #[error("Recognition pool is not ready")]
    PoolNotReady,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("API error: {0}")]
    Api(String),
}

impl OcrCamError {
    /// Whether this error only means "nothing to do this cycle".
    ///
    /// The polling loop logs these at debug level instead of warn.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            OcrCamError::CameraUnavailable | OcrCamError::PoolNotReady
        )
    }
}

impl From<toml::de::Error> for OcrCamError {
    fn from(err: toml::de::Error) -> Self {
        OcrCamError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for OcrCamError {
    fn from(err: toml::ser::Error) -> Self {
        OcrCamError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OcrCamError {
    fn from(err: serde_json::Error) -> Self {
        OcrCamError::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for OcrCamError {
    fn from(err: image::ImageError) -> Self {
        OcrCamError::Image(err.to_string())
    }
}

/// A specialized `Result` type for ocrcam operations.
pub type Result<T> = std::result::Result<T, OcrCamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OcrCamError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_structured_variants() {
        let cases: Vec<(OcrCamError, &str)> = vec![
            (
                OcrCamError::CameraUnavailable,
                "Camera unavailable: no stream attached",
            ),
            (
                OcrCamError::WorkerInitFailed {
                    failed: 2,
                    total: 5,
                },
                "Worker initialization failed: 2 of 5 workers",
            ),
            (
                OcrCamError::QueueFull { capacity: 16 },
                "Job queue full (16 pending)",
            ),
            (OcrCamError::PoolClosed, "Recognition pool is closed"),
            (
                OcrCamError::Ocr("language not installed".to_string()),
                "OCR error: language not installed",
            ),
            (OcrCamError::PoolNotReady, "Recognition pool is not ready"),
            (
                OcrCamError::JobFailed("engine crash".to_string()),
                "Recognition job failed: engine crash",
            ),
            (
                OcrCamError::InvalidRegion {
                    region: "{600,0,100,10}".to_string(),
                    width: 640,
                    height: 480,
                },
                "Region {600,0,100,10} does not fit inside a 640x480 frame",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_skippable_errors() {
        assert!(OcrCamError::CameraUnavailable.is_skippable());
        assert!(OcrCamError::PoolNotReady.is_skippable());
        assert!(!OcrCamError::PoolClosed.is_skippable());
        assert!(!OcrCamError::JobFailed("x".into()).is_skippable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OcrCamError = io_err.into();
        assert!(matches!(err, OcrCamError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let err: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: OcrCamError = err.unwrap_err().into();
        assert!(matches!(err, OcrCamError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: OcrCamError = err.unwrap_err().into();
        assert!(matches!(err, OcrCamError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
