use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use ocrcam_core::types::TickSkipReason;

/// Live tick and job counters.
#[derive(Debug, Default)]
pub struct TickCounters {
    ticks_fired: AtomicU64,
    skipped_pool_not_ready: AtomicU64,
    skipped_camera_unavailable: AtomicU64,
    skipped_previous_job_pending: AtomicU64,
    jobs_submitted: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
}

impl TickCounters {
    pub fn record_tick(&self) {
        self.ticks_fired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self, reason: TickSkipReason) {
        let counter = match reason {
            TickSkipReason::PoolNotReady => &self.skipped_pool_not_ready,
            TickSkipReason::CameraUnavailable => &self.skipped_camera_unavailable,
            TickSkipReason::PreviousJobPending => &self.skipped_previous_job_pending,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PollingStats {
        let skipped = SkipCounts {
            pool_not_ready: self.skipped_pool_not_ready.load(Ordering::Relaxed),
            camera_unavailable: self.skipped_camera_unavailable.load(Ordering::Relaxed),
            previous_job_pending: self.skipped_previous_job_pending.load(Ordering::Relaxed),
        };
        PollingStats {
            ticks_fired: self.ticks_fired.load(Ordering::Relaxed),
            ticks_skipped: skipped.total(),
            skipped,
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
        }
    }
}

/// Skipped ticks broken down by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub pool_not_ready: u64,
    pub camera_unavailable: u64,
    pub previous_job_pending: u64,
}

impl SkipCounts {
    pub fn total(&self) -> u64 {
        self.pool_not_ready + self.camera_unavailable + self.previous_job_pending
    }
}

/// Point-in-time copy of [`TickCounters`], as served on `/state`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingStats {
    pub ticks_fired: u64,
    pub ticks_skipped: u64,
    pub skipped: SkipCounts,
    pub jobs_submitted: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
}
