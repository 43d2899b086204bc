use std::fmt;

use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Geometry
// =============================================================================

/// Resolution every frame is captured at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CameraSize {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Fixed rectangle, in frame coordinates, that is sent to OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadableRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for ReadableRegion {
    fn default() -> Self {
        Self {
            left: 160,
            top: 160,
            width: 320,
            height: 160,
        }
    }
}

impl ReadableRegion {
    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.left.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.top.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the region is non-empty and lies entirely inside `size`.
    pub fn fits_within(&self, size: CameraSize) -> bool {
        !self.is_empty()
            && self.left.checked_add(self.width).is_some_and(|r| r <= size.width)
            && self.top.checked_add(self.height).is_some_and(|b| b <= size.height)
    }
}

impl fmt::Display for ReadableRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{},{},{},{}}}",
            self.left, self.top, self.width, self.height
        )
    }
}

// =============================================================================
// Frames and results
// =============================================================================

/// A still image captured from the camera.
///
/// Frames are ephemeral: one is captured per tick, cropped, and handed to the
/// recognition pool. Nothing keeps them around afterwards.
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub image: RgbaImage,
}

impl Frame {
    /// Wrap a raster image captured now.
    pub fn new(image: RgbaImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            captured_at: Utc::now(),
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> CameraSize {
        CameraSize {
            width: self.width(),
            height: self.height(),
        }
    }
}

/// Text produced by one completed recognition job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub job_id: Uuid,
    pub worker_id: usize,
    pub text: String,
    pub completed_at: DateTime<Utc>,
}

// =============================================================================
// Lifecycle states
// =============================================================================

/// Lifecycle of the recognition pool as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    /// Workers are still being initialized.
    Provisioning,
    /// Every worker (or the accepted subset) is initialized.
    Ready,
    /// Provisioning failed; the pool will never become ready.
    Failed,
    /// Torn down. All workers released.
    Closed,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolStatus::Provisioning => write!(f, "provisioning"),
            PoolStatus::Ready => write!(f, "ready"),
            PoolStatus::Failed => write!(f, "failed"),
            PoolStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Whether the polling timer is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollingStatus {
    Stopped,
    Running,
}

impl fmt::Display for PollingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollingStatus::Stopped => write!(f, "stopped"),
            PollingStatus::Running => write!(f, "running"),
        }
    }
}

/// Reason a polling tick did not submit a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickSkipReason {
    /// The recognition pool has not finished provisioning (or is closed).
    PoolNotReady,
    /// No camera stream is attached.
    CameraUnavailable,
    /// The previous tick's job has not resolved yet.
    PreviousJobPending,
}

impl fmt::Display for TickSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickSkipReason::PoolNotReady => write!(f, "pool_not_ready"),
            TickSkipReason::CameraUnavailable => write!(f, "camera_unavailable"),
            TickSkipReason::PreviousJobPending => write!(f, "previous_job_pending"),
        }
    }
}
