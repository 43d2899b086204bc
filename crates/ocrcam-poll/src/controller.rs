//! Toggleable polling timer that feeds camera crops to the recognition pool.
//!
//! While running, every tick:
//! 1. skips if the pool is not ready,
//! 2. skips if the previous job is unresolved (under `OverlapPolicy::SkipIfBusy`),
//! 3. captures a frame, skipping if no camera stream is attached,
//! 4. crops it to the readable region and queues it on the pool,
//! 5. hands the job to a spawned task that stores the result on completion.
//!
//! Ticks are therefore scheduled at a fixed cadence regardless of how long
//! recognition takes. Stopping the timer never cancels a queued or running job.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ocrcam_capture::CameraSource;
use ocrcam_core::config::{OcrCamConfig, OverlapPolicy};
use ocrcam_core::error::{OcrCamError, Result};
use ocrcam_core::events::SurfaceEvent;
use ocrcam_core::types::{
    PollingStatus, PoolStatus, ReadableRegion, RecognitionResult, TickSkipReason,
};
use ocrcam_ocr::RecognitionPool;

use crate::state::{PollingState, TimerHandle};
use crate::stats::{PollingStats, TickCounters};

/// Timer settings.
#[derive(Debug, Clone, Copy)]
pub struct PollingOptions {
    pub region: ReadableRegion,
    pub interval: Duration,
    pub overlap: OverlapPolicy,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self::from_config(&OcrCamConfig::default())
    }
}

impl PollingOptions {
    pub fn from_config(config: &OcrCamConfig) -> Self {
        Self {
            region: config.region,
            interval: config.polling.interval(),
            overlap: config.polling.overlap,
        }
    }
}

/// Why `try_start` refused to start the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRefusal {
    PoolNotReady,
    AlreadyRunning,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Submitted { job_id: Uuid },
    Skipped(TickSkipReason),
    Failed,
}

/// The most recent recognition text and the most recent job error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestResult {
    pub result: Option<RecognitionResult>,
    pub last_error: Option<String>,
}

struct ControllerInner {
    camera: Arc<dyn CameraSource>,
    pool: RecognitionPool,
    options: PollingOptions,
    state: Mutex<PollingState>,
    latest: Mutex<LatestResult>,
    in_flight: AtomicUsize,
    counters: TickCounters,
    events: broadcast::Sender<SurfaceEvent>,
}

impl ControllerInner {
    fn state(&self) -> MutexGuard<'_, PollingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn latest(&self) -> MutexGuard<'_, LatestResult> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SurfaceEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn tick(self: &Arc<Self>) -> TickOutcome {
        self.counters.record_tick();

        if !self.pool.is_ready() {
            return self.skip(TickSkipReason::PoolNotReady);
        }
        if self.options.overlap == OverlapPolicy::SkipIfBusy
            && self.in_flight.load(Ordering::SeqCst) > 0
        {
            return self.skip(TickSkipReason::PreviousJobPending);
        }

        let frame = match self.camera.capture().await {
            Ok(frame) => frame,
            Err(e) if e.is_skippable() => return self.skip(TickSkipReason::CameraUnavailable),
            Err(e) => {
                self.fail(&e);
                return TickOutcome::Failed;
            }
        };

        let handle = match self.pool.enqueue(&frame, self.options.region) {
            Ok(handle) => handle,
            Err(OcrCamError::PoolNotReady | OcrCamError::PoolClosed) => {
                return self.skip(TickSkipReason::PoolNotReady)
            }
            Err(e) => {
                self.fail(&e);
                return TickOutcome::Failed;
            }
        };

        let job_id = handle.id();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.counters.record_submitted();
        debug!(%job_id, frame_id = %frame.id, "Recognition job submitted");

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = handle.wait().await;
            inner.complete(outcome);
            inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        TickOutcome::Submitted { job_id }
    }

    fn skip(&self, reason: TickSkipReason) -> TickOutcome {
        self.counters.record_skip(reason);
        debug!(%reason, "Tick skipped");
        self.emit(SurfaceEvent::TickSkipped { reason });
        TickOutcome::Skipped(reason)
    }

    fn complete(&self, outcome: Result<RecognitionResult>) {
        match outcome {
            Ok(result) => {
                self.counters.record_completed();
                debug!(
                    job_id = %result.job_id,
                    worker_id = result.worker_id,
                    chars = result.text.len(),
                    "Recognition result updated"
                );
                {
                    let mut latest = self.latest();
                    latest.result = Some(result.clone());
                    latest.last_error = None;
                }
                self.emit(SurfaceEvent::ResultUpdated { result });
            }
            Err(e) => self.fail(&e),
        }
    }

    fn fail(&self, error: &OcrCamError) {
        self.counters.record_failed();
        warn!(error = %error, "Recognition job failed");
        let message = error.to_string();
        self.latest().last_error = Some(message.clone());
        self.emit(SurfaceEvent::JobFailed { message });
    }
}

async fn run_timer(inner: Arc<ControllerInner>, cancel: Arc<Notify>) {
    let mut ticker = tokio::time::interval(inner.options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.notified() => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            biased;
            _ = cancel.notified() => break,
            _ = inner.tick() => {}
        }
    }
    debug!("Polling timer exited");
}

/// Polling controller. Cheap to clone; clones share the same timer.
#[derive(Clone)]
pub struct PollingController {
    inner: Arc<ControllerInner>,
}

impl PollingController {
    pub fn new(
        camera: Arc<dyn CameraSource>,
        pool: RecognitionPool,
        options: PollingOptions,
        events: broadcast::Sender<SurfaceEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                camera,
                pool,
                options,
                state: Mutex::new(PollingState::Stopped),
                latest: Mutex::new(LatestResult::default()),
                in_flight: AtomicUsize::new(0),
                counters: TickCounters::default(),
                events,
            }),
        }
    }

    /// Start the timer. The first tick fires immediately.
    ///
    /// Returns `false` without doing anything if the pool is not ready or the
    /// timer is already running.
    pub fn start(&self) -> bool {
        self.try_start().is_ok()
    }

    /// Like [`start`](Self::start), but says why nothing happened.
    pub fn try_start(&self) -> std::result::Result<(), StartRefusal> {
        {
            let mut state = self.inner.state();
            if state.is_running() {
                debug!("Polling already running");
                return Err(StartRefusal::AlreadyRunning);
            }
            if !self.inner.pool.is_ready() {
                debug!(pool = %self.inner.pool.status(), "Polling start ignored, pool not ready");
                return Err(StartRefusal::PoolNotReady);
            }
            let cancel = Arc::new(Notify::new());
            let task = tokio::spawn(run_timer(Arc::clone(&self.inner), Arc::clone(&cancel)));
            *state = PollingState::Running(TimerHandle::new(cancel, task));
        }
        info!(
            interval_ms = self.inner.options.interval.as_millis() as u64,
            region = %self.inner.options.region,
            "Polling started"
        );
        self.inner.emit(SurfaceEvent::PollingChanged {
            status: PollingStatus::Running,
        });
        Ok(())
    }

    /// Cancel the timer. Jobs already submitted still deliver their results.
    ///
    /// Returns `false` if the timer was not running.
    pub fn stop(&self) -> bool {
        let Some(timer) = self.inner.state().take_timer() else {
            return false;
        };
        // The timer task exits on its own; dropping the handle detaches it.
        drop(timer.cancel());
        info!(in_flight = self.in_flight_jobs(), "Polling stopped");
        self.inner.emit(SurfaceEvent::PollingChanged {
            status: PollingStatus::Stopped,
        });
        true
    }

    /// Start if stopped, stop if running. Returns the resulting status.
    pub fn toggle(&self) -> PollingStatus {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.status()
    }

    /// Wait for the pool to become ready, then start.
    pub async fn start_when_ready(&self) -> Result<bool> {
        self.inner.pool.wait_ready().await?;
        Ok(self.start())
    }

    /// Run one tick now, outside the timer.
    pub async fn tick(&self) -> TickOutcome {
        self.inner.tick().await
    }

    pub fn status(&self) -> PollingStatus {
        self.inner.state().status()
    }

    pub fn is_running(&self) -> bool {
        self.inner.state().is_running()
    }

    /// Latest result and last job error.
    pub fn latest(&self) -> LatestResult {
        self.inner.latest().clone()
    }

    pub fn result(&self) -> Option<RecognitionResult> {
        self.inner.latest().result.clone()
    }

    pub fn stats(&self) -> PollingStats {
        self.inner.counters.snapshot()
    }

    /// Jobs submitted by ticks that have not resolved yet.
    pub fn in_flight_jobs(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> &PollingOptions {
        &self.inner.options
    }

    pub fn pool(&self) -> &RecognitionPool {
        &self.inner.pool
    }

    pub fn camera(&self) -> &Arc<dyn CameraSource> {
        &self.inner.camera
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.inner.events.subscribe()
    }
}

/// Re-publish pool lifecycle changes as surface events until the pool closes.
pub fn forward_pool_status(
    pool: &RecognitionPool,
    events: broadcast::Sender<SurfaceEvent>,
) -> JoinHandle<()> {
    let mut rx = pool.subscribe();
    tokio::spawn(async move {
        loop {
            let status = *rx.borrow_and_update();
            let _ = events.send(SurfaceEvent::PoolStatusChanged { status });
            if status == PoolStatus::Closed || rx.changed().await.is_err() {
                break;
            }
        }
    })
}
