//! Fixed-size pool of OCR workers behind a bounded job queue.
//!
//! Lifecycle: `Provisioning` → `Ready` (or `Failed`) → `Closed`.
//!
//! - [`RecognitionPool::provision`] initializes every worker in parallel and
//!   flips the pool to `Ready` only after all of them have completed (or, under
//!   [`InitPolicy::Partial`], after all attempts finished and at least one
//!   succeeded).
//! - [`RecognitionPool::enqueue`] crops the frame to the region and queues the
//!   job. Idle workers take jobs in FIFO order. A full queue either rejects the
//!   new job or evicts the oldest one, per [`Backpressure`].
//! - [`RecognitionPool::teardown`] rejects queued jobs, lets running jobs
//!   finish, and terminates every worker exactly once.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use image::RgbaImage;
use tokio::sync::{oneshot, watch, Notify};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use ocrcam_core::config::{Backpressure, InitPolicy, PoolConfig};
use ocrcam_core::error::{OcrCamError, Result};
use ocrcam_core::types::{Frame, PoolStatus, ReadableRegion, RecognitionResult};

use crate::{OcrEngine, OcrWorker};

/// Sizing and policy knobs for a [`RecognitionPool`].
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub size: usize,
    pub language: String,
    pub queue_capacity: usize,
    pub backpressure: Backpressure,
    pub init_policy: InitPolicy,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self::from(&PoolConfig::default())
    }
}

impl From<&PoolConfig> for PoolOptions {
    fn from(config: &PoolConfig) -> Self {
        Self {
            size: config.size,
            language: config.language.clone(),
            queue_capacity: config.queue_capacity,
            backpressure: config.backpressure,
            init_policy: config.init_policy,
        }
    }
}

type Reply = oneshot::Sender<Result<RecognitionResult>>;

struct Job {
    id: Uuid,
    image: RgbaImage,
    reply: Reply,
}

#[derive(Default)]
struct JobQueue {
    jobs: VecDeque<Job>,
    closed: bool,
}

struct PoolInner {
    options: PoolOptions,
    queue: Mutex<JobQueue>,
    job_ready: Notify,
    status: watch::Sender<PoolStatus>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: AtomicUsize,
    busy: AtomicUsize,
    /// `(failed, total)` from the provisioning attempt that failed the pool.
    init_failure: Mutex<Option<(usize, usize)>>,
}

impl PoolInner {
    fn queue(&self) -> MutexGuard<'_, JobQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: PoolStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            info!(from = %previous, to = %status, "Recognition pool status changed");
        }
    }

    /// Move from `from` to `to`. Returns `false` if the pool was elsewhere.
    fn transition(&self, from: PoolStatus, to: PoolStatus) -> bool {
        let changed = self.status.send_if_modified(|status| {
            if *status == from {
                *status = to;
                true
            } else {
                false
            }
        });
        if changed {
            info!(from = %from, to = %to, "Recognition pool status changed");
        }
        changed
    }

    /// Wait for the next job. `None` once the pool is closed and drained.
    async fn next_job(&self) -> Option<Job> {
        loop {
            let notified = self.job_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut queue = self.queue();
                if let Some(job) = queue.jobs.pop_front() {
                    return Some(job);
                }
                if queue.closed {
                    return None;
                }
            }
            notified.await;
        }
    }
}

/// Handle to one queued recognition job.
#[derive(Debug)]
pub struct JobHandle {
    id: Uuid,
    rx: oneshot::Receiver<Result<RecognitionResult>>,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the job to finish.
    pub async fn wait(self) -> Result<RecognitionResult> {
        self.rx.await.unwrap_or_else(|_| {
            Err(OcrCamError::JobFailed(
                "worker exited before completing the job".into(),
            ))
        })
    }
}

/// Pool of OCR workers. Cheap to clone; clones share the same workers.
#[derive(Clone)]
pub struct RecognitionPool {
    inner: Arc<PoolInner>,
}

impl std::fmt::Debug for RecognitionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionPool")
            .field("status", &self.status())
            .field("workers", &self.worker_count())
            .field("queued", &self.queued_jobs())
            .finish()
    }
}

impl RecognitionPool {
    /// Create an empty pool in the `Provisioning` state.
    pub fn new(options: PoolOptions) -> Self {
        let (status, _) = watch::channel(PoolStatus::Provisioning);
        Self {
            inner: Arc::new(PoolInner {
                options,
                queue: Mutex::new(JobQueue::default()),
                job_ready: Notify::new(),
                status,
                workers: Mutex::new(Vec::new()),
                worker_count: AtomicUsize::new(0),
                busy: AtomicUsize::new(0),
                init_failure: Mutex::new(None),
            }),
        }
    }

    pub fn options(&self) -> &PoolOptions {
        &self.inner.options
    }

    pub fn status(&self) -> PoolStatus {
        *self.inner.status.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.status() == PoolStatus::Ready
    }

    /// Watch lifecycle changes.
    pub fn subscribe(&self) -> watch::Receiver<PoolStatus> {
        self.inner.status.subscribe()
    }

    /// Number of live workers (zero until ready).
    pub fn worker_count(&self) -> usize {
        self.inner.worker_count.load(Ordering::SeqCst)
    }

    /// Workers currently running a job.
    pub fn busy_workers(&self) -> usize {
        self.inner.busy.load(Ordering::SeqCst)
    }

    /// Jobs waiting for a worker.
    pub fn queued_jobs(&self) -> usize {
        self.inner.queue().jobs.len()
    }

    /// Wait until provisioning has finished.
    ///
    /// Returns `Ok` once ready; `PoolClosed` or `WorkerInitFailed` otherwise.
    pub async fn wait_ready(&self) -> Result<()> {
        let mut rx = self.subscribe();
        let status = *rx
            .wait_for(|s| *s != PoolStatus::Provisioning)
            .await
            .map_err(|_| OcrCamError::PoolClosed)?;
        match status {
            PoolStatus::Ready => Ok(()),
            PoolStatus::Failed => {
                let (failed, total) = self
                    .inner
                    .init_failure
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .unwrap_or((self.inner.options.size, self.inner.options.size));
                Err(OcrCamError::WorkerInitFailed { failed, total })
            }
            _ => Err(OcrCamError::PoolClosed),
        }
    }

    /// Initialize all workers in parallel and register them with the scheduler.
    ///
    /// Readiness flips only after every initialization attempt has finished.
    /// Under `AllOrNothing` any failure fails the pool; under `Partial` the pool
    /// proceeds with the workers that did come up, as long as there is one.
    pub async fn provision(&self, engine: Arc<dyn OcrEngine>) -> Result<usize> {
        let total = self.inner.options.size;
        if self.status() != PoolStatus::Provisioning {
            return Err(OcrCamError::Config(format!(
                "pool cannot be provisioned from state {}",
                self.status()
            )));
        }
        info!(
            engine = engine.name(),
            workers = total,
            language = %self.inner.options.language,
            "Provisioning recognition pool"
        );

        let mut set = JoinSet::new();
        for worker_id in 0..total {
            let engine = Arc::clone(&engine);
            let language = self.inner.options.language.clone();
            set.spawn(async move { (worker_id, engine.create_worker(worker_id, &language).await) });
        }

        let mut ready: Vec<(usize, Box<dyn OcrWorker>)> = Vec::with_capacity(total);
        let mut failed = 0;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((worker_id, Ok(worker))) => {
                    debug!(worker_id, "Worker initialized");
                    ready.push((worker_id, worker));
                }
                Ok((worker_id, Err(e))) => {
                    warn!(worker_id, error = %e, "Worker initialization failed");
                    failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Worker initialization task panicked");
                    failed += 1;
                }
            }
        }

        let accept = match self.inner.options.init_policy {
            InitPolicy::AllOrNothing => failed == 0,
            InitPolicy::Partial => !ready.is_empty(),
        };
        if !accept {
            release_all(ready).await;
            *self
                .inner
                .init_failure
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some((failed, total));
            self.inner.transition(PoolStatus::Provisioning, PoolStatus::Failed);
            return Err(OcrCamError::WorkerInitFailed { failed, total });
        }
        if failed > 0 {
            warn!(
                available = ready.len(),
                failed, total, "Continuing with a partial recognition pool"
            );
        }

        ready.sort_by_key(|(worker_id, _)| *worker_id);
        let count = ready.len();
        // Teardown closes the queue under this lock; register the workers
        // before releasing it.
        let rejected = {
            let queue = self.inner.queue();
            if queue.closed {
                Some(ready)
            } else {
                let mut handles = self
                    .inner
                    .workers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                for (worker_id, worker) in ready {
                    let inner = Arc::clone(&self.inner);
                    handles.push(tokio::spawn(run_worker(inner, worker_id, worker)));
                }
                self.inner.worker_count.store(count, Ordering::SeqCst);
                self.inner.transition(PoolStatus::Provisioning, PoolStatus::Ready);
                None
            }
        };
        if let Some(ready) = rejected {
            release_all(ready).await;
            return Err(OcrCamError::PoolClosed);
        }
        info!(workers = count, "Recognition pool ready");
        Ok(count)
    }

    /// Queue a job recognizing `region` of `frame`.
    ///
    /// Fails fast with `PoolNotReady`, `PoolClosed`, `InvalidRegion`, or (under
    /// `Backpressure::Reject`) `QueueFull`. Under `DropOldest` a full queue
    /// evicts its oldest job, whose handle resolves to `JobDropped`.
    pub fn enqueue(&self, frame: &Frame, region: ReadableRegion) -> Result<JobHandle> {
        match self.status() {
            PoolStatus::Ready => {}
            PoolStatus::Closed => return Err(OcrCamError::PoolClosed),
            _ => return Err(OcrCamError::PoolNotReady),
        }
        let cropped = ocrcam_capture::crop(frame, region)?;

        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        {
            let mut queue = self.inner.queue();
            if queue.closed {
                return Err(OcrCamError::PoolClosed);
            }
            let capacity = self.inner.options.queue_capacity;
            if queue.jobs.len() >= capacity {
                match self.inner.options.backpressure {
                    Backpressure::Reject => {
                        debug!(capacity, "Job queue full, rejecting job");
                        return Err(OcrCamError::QueueFull { capacity });
                    }
                    Backpressure::DropOldest => {
                        if let Some(oldest) = queue.jobs.pop_front() {
                            warn!(job_id = %oldest.id, "Job queue full, dropping oldest job");
                            let _ = oldest.reply.send(Err(OcrCamError::JobDropped));
                        }
                    }
                }
            }
            queue.jobs.push_back(Job {
                id,
                image: cropped.image,
                reply: tx,
            });
        }
        self.inner.job_ready.notify_one();
        debug!(job_id = %id, frame_id = %frame.id, "Recognition job queued");
        Ok(JobHandle { id, rx })
    }

    /// Queue a job and wait for its text.
    pub async fn submit(&self, frame: &Frame, region: ReadableRegion) -> Result<String> {
        let handle = self.enqueue(frame, region)?;
        Ok(handle.wait().await?.text)
    }

    /// Release every worker and reject queued jobs.
    ///
    /// Jobs already running finish and deliver their result. Safe to call more
    /// than once; only the first call does anything.
    pub async fn teardown(&self) {
        let drained: Vec<Job> = {
            let mut queue = self.inner.queue();
            if queue.closed {
                return;
            }
            queue.closed = true;
            queue.jobs.drain(..).collect()
        };
        let rejected = drained.len();
        for job in drained {
            let _ = job.reply.send(Err(OcrCamError::PoolClosed));
        }
        self.inner.job_ready.notify_waiters();

        let handles: Vec<JoinHandle<()>> = {
            let mut workers = self
                .inner
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            workers.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker task ended abnormally");
            }
        }
        self.inner.worker_count.store(0, Ordering::SeqCst);
        self.inner.set_status(PoolStatus::Closed);
        info!(rejected, "Recognition pool torn down");
    }
}

async fn run_worker(inner: Arc<PoolInner>, worker_id: usize, mut worker: Box<dyn OcrWorker>) {
    while let Some(job) = inner.next_job().await {
        inner.busy.fetch_add(1, Ordering::SeqCst);
        let outcome = worker.recognize(&job.image).await;
        inner.busy.fetch_sub(1, Ordering::SeqCst);

        let result = outcome.map(|text| RecognitionResult {
            job_id: job.id,
            worker_id,
            text,
            completed_at: Utc::now(),
        });
        if let Err(e) = &result {
            debug!(worker_id, job_id = %job.id, error = %e, "Recognition job failed");
        }
        // The submitter may have stopped waiting.
        let _ = job.reply.send(result);
    }
    worker.terminate().await;
    debug!(worker_id, "Worker released");
}

async fn release_all(workers: Vec<(usize, Box<dyn OcrWorker>)>) {
    for (worker_id, mut worker) in workers {
        worker.terminate().await;
        debug!(worker_id, "Worker released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::sync::Semaphore;

    use crate::MockOcrEngine;

    fn frame() -> Frame {
        Frame::new(RgbaImage::new(640, 480))
    }

    fn options(size: usize) -> PoolOptions {
        PoolOptions {
            size,
            ..PoolOptions::default()
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_provision_and_submit() {
        let engine = MockOcrEngine::with_text("HELLO");
        let pool = RecognitionPool::new(options(5));
        assert_eq!(pool.status(), PoolStatus::Provisioning);

        let count = pool.provision(Arc::new(engine.clone())).await.unwrap();
        assert_eq!(count, 5);
        assert!(pool.is_ready());
        assert_eq!(pool.worker_count(), 5);
        assert_eq!(engine.counters().inits_completed(), 5);

        let text = pool.submit(&frame(), ReadableRegion::default()).await.unwrap();
        assert_eq!(text, "HELLO");

        pool.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_only_after_every_worker_initialized() {
        for size in 1..=5 {
            let gate = Arc::new(Semaphore::new(0));
            let engine = MockOcrEngine::new().init_gate(Arc::clone(&gate));
            let counters = engine.counters();
            let pool = RecognitionPool::new(options(size));

            let provisioning = {
                let pool = pool.clone();
                tokio::spawn(async move { pool.provision(Arc::new(engine)).await })
            };

            for released in 1..size {
                gate.add_permits(1);
                settle().await;
                assert_eq!(counters.inits_completed(), released);
                assert_eq!(pool.status(), PoolStatus::Provisioning);
                assert!(!pool.is_ready());
            }

            gate.add_permits(1);
            settle().await;
            assert_eq!(counters.inits_completed(), size);
            assert!(pool.is_ready());
            assert_eq!(provisioning.await.unwrap().unwrap(), size);
            pool.teardown().await;
        }
    }

    #[tokio::test]
    async fn test_all_or_nothing_failure() {
        let engine = MockOcrEngine::new().fail_worker(3);
        let counters = engine.counters();
        let pool = RecognitionPool::new(options(5));

        let err = pool.provision(Arc::new(engine)).await.unwrap_err();
        assert!(matches!(
            err,
            OcrCamError::WorkerInitFailed {
                failed: 1,
                total: 5
            }
        ));
        assert_eq!(pool.status(), PoolStatus::Failed);
        // The four that did come up are released again.
        assert_eq!(counters.workers_terminated(), 4);
        assert!(pool.wait_ready().await.is_err());
        assert!(matches!(
            pool.enqueue(&frame(), ReadableRegion::default()),
            Err(OcrCamError::PoolNotReady)
        ));
    }

    #[tokio::test]
    async fn test_wait_ready_reports_actual_init_failures() {
        let pool = RecognitionPool::new(options(5));
        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.wait_ready().await })
        };
        assert!(pool
            .provision(Arc::new(MockOcrEngine::new().fail_worker(3)))
            .await
            .is_err());

        for err in [waiter.await.unwrap().unwrap_err(), pool.wait_ready().await.unwrap_err()] {
            assert!(matches!(
                err,
                OcrCamError::WorkerInitFailed {
                    failed: 1,
                    total: 5
                }
            ));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_teardown_racing_provision_never_leaves_pool_ready() {
        for _ in 0..200 {
            let engine = MockOcrEngine::new();
            let counters = engine.counters();
            let pool = RecognitionPool::new(options(2));

            let provisioning = {
                let pool = pool.clone();
                tokio::spawn(async move { pool.provision(Arc::new(engine)).await })
            };
            let teardown = {
                let pool = pool.clone();
                tokio::spawn(async move { pool.teardown().await })
            };
            let provisioned = provisioning.await.unwrap();
            teardown.await.unwrap();

            assert_eq!(pool.status(), PoolStatus::Closed);
            assert_eq!(pool.worker_count(), 0);
            assert!(pool.inner.workers.lock().unwrap().is_empty());
            // Provisioned workers are joined by teardown; rejected ones are
            // released by provision. Either way every worker is released.
            if provisioned.is_ok() || counters.inits_completed() == 2 {
                assert_eq!(counters.workers_terminated(), 2);
            }
        }
    }

    #[tokio::test]
    async fn test_partial_policy_uses_available_workers() {
        let engine = MockOcrEngine::new().fail_worker(0).fail_worker(4);
        let pool = RecognitionPool::new(PoolOptions {
            init_policy: InitPolicy::Partial,
            ..options(5)
        });

        let count = pool.provision(Arc::new(engine)).await.unwrap();
        assert_eq!(count, 3);
        assert!(pool.is_ready());
        assert!(pool.submit(&frame(), ReadableRegion::default()).await.is_ok());
        pool.teardown().await;
    }

    #[tokio::test]
    async fn test_partial_policy_with_no_workers_fails() {
        let engine = MockOcrEngine::new().fail_worker(0).fail_worker(1);
        let pool = RecognitionPool::new(PoolOptions {
            init_policy: InitPolicy::Partial,
            ..options(2)
        });
        let err = pool.provision(Arc::new(engine)).await.unwrap_err();
        assert!(matches!(err, OcrCamError::WorkerInitFailed { failed: 2, .. }));
        assert_eq!(pool.status(), PoolStatus::Failed);
    }

    #[tokio::test]
    async fn test_enqueue_before_ready_is_rejected() {
        let pool = RecognitionPool::new(options(1));
        let err = pool.enqueue(&frame(), ReadableRegion::default()).unwrap_err();
        assert!(matches!(err, OcrCamError::PoolNotReady));
    }

    #[tokio::test]
    async fn test_enqueue_invalid_region() {
        let pool = RecognitionPool::new(options(1));
        pool.provision(Arc::new(MockOcrEngine::new())).await.unwrap();
        let region = ReadableRegion {
            left: 600,
            top: 0,
            width: 100,
            height: 100,
        };
        let err = pool.enqueue(&frame(), region).unwrap_err();
        assert!(matches!(err, OcrCamError::InvalidRegion { .. }));
        pool.teardown().await;
    }

    #[tokio::test]
    async fn test_job_failure_is_reported() {
        let pool = RecognitionPool::new(options(1));
        pool.provision(Arc::new(MockOcrEngine::new().fail_jobs()))
            .await
            .unwrap();
        let err = pool
            .submit(&frame(), ReadableRegion::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OcrCamError::JobFailed(_)));
        // The worker survives a failed job.
        assert_eq!(pool.worker_count(), 1);
        pool.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_spread_across_idle_workers() {
        let engine = MockOcrEngine::new().recognize_delay(Duration::from_secs(1));
        let pool = RecognitionPool::new(options(3));
        pool.provision(Arc::new(engine)).await.unwrap();

        let handles: Vec<JobHandle> = (0..3)
            .map(|_| pool.enqueue(&frame(), ReadableRegion::default()).unwrap())
            .collect();
        settle().await;
        assert_eq!(pool.busy_workers(), 3);
        assert_eq!(pool.queued_jobs(), 0);

        let mut workers = Vec::new();
        for handle in handles {
            workers.push(handle.wait().await.unwrap().worker_id);
        }
        workers.sort_unstable();
        assert_eq!(workers, vec![0, 1, 2]);
        pool.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_when_queue_full() {
        let engine = MockOcrEngine::new().recognize_delay(Duration::from_secs(5));
        let pool = RecognitionPool::new(PoolOptions {
            queue_capacity: 2,
            ..options(1)
        });
        pool.provision(Arc::new(engine)).await.unwrap();

        // One running, two queued.
        let running = pool.enqueue(&frame(), ReadableRegion::default()).unwrap();
        settle().await;
        let _q1 = pool.enqueue(&frame(), ReadableRegion::default()).unwrap();
        let _q2 = pool.enqueue(&frame(), ReadableRegion::default()).unwrap();
        assert_eq!(pool.queued_jobs(), 2);

        let err = pool.enqueue(&frame(), ReadableRegion::default()).unwrap_err();
        assert!(matches!(err, OcrCamError::QueueFull { capacity: 2 }));
        assert_eq!(pool.queued_jobs(), 2);

        assert!(running.wait().await.is_ok());
        pool.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_oldest_when_queue_full() {
        let engine = MockOcrEngine::new().recognize_delay(Duration::from_secs(5));
        let pool = RecognitionPool::new(PoolOptions {
            queue_capacity: 2,
            backpressure: Backpressure::DropOldest,
            ..options(1)
        });
        pool.provision(Arc::new(engine)).await.unwrap();

        let running = pool.enqueue(&frame(), ReadableRegion::default()).unwrap();
        settle().await;
        let oldest = pool.enqueue(&frame(), ReadableRegion::default()).unwrap();
        let second = pool.enqueue(&frame(), ReadableRegion::default()).unwrap();
        let newest = pool.enqueue(&frame(), ReadableRegion::default()).unwrap();
        assert_eq!(pool.queued_jobs(), 2);

        assert!(matches!(oldest.wait().await, Err(OcrCamError::JobDropped)));
        assert!(running.wait().await.is_ok());
        assert!(second.wait().await.is_ok());
        assert!(newest.wait().await.is_ok());
        pool.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_rejects_queued_and_finishes_running() {
        let engine = MockOcrEngine::with_text("LATE").recognize_delay(Duration::from_secs(2));
        let counters = engine.counters();
        let pool = RecognitionPool::new(options(1));
        pool.provision(Arc::new(engine)).await.unwrap();

        let running = pool.enqueue(&frame(), ReadableRegion::default()).unwrap();
        settle().await;
        let queued = pool.enqueue(&frame(), ReadableRegion::default()).unwrap();

        pool.teardown().await;
        assert_eq!(pool.status(), PoolStatus::Closed);
        assert_eq!(pool.worker_count(), 0);
        assert_eq!(counters.workers_terminated(), 1);

        assert!(matches!(queued.wait().await, Err(OcrCamError::PoolClosed)));
        assert_eq!(running.wait().await.unwrap().text, "LATE");
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let engine = MockOcrEngine::new();
        let counters = engine.counters();
        let pool = RecognitionPool::new(options(5));
        pool.provision(Arc::new(engine)).await.unwrap();

        pool.teardown().await;
        pool.teardown().await;
        assert_eq!(counters.workers_terminated(), 5);
        assert!(matches!(
            pool.enqueue(&frame(), ReadableRegion::default()),
            Err(OcrCamError::PoolClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_during_provisioning_releases_workers() {
        let engine = MockOcrEngine::new().init_delay(Duration::from_secs(1));
        let counters = engine.counters();
        let pool = RecognitionPool::new(options(3));

        let provisioning = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.provision(Arc::new(engine)).await })
        };
        settle().await;
        pool.teardown().await;
        assert_eq!(pool.status(), PoolStatus::Closed);

        let err = provisioning.await.unwrap().unwrap_err();
        assert!(matches!(err, OcrCamError::PoolClosed));
        assert_eq!(counters.inits_completed(), 3);
        assert_eq!(counters.workers_terminated(), 3);
        assert!(!pool.is_ready());
    }

    #[tokio::test]
    async fn test_provision_twice_is_rejected() {
        let pool = RecognitionPool::new(options(1));
        pool.provision(Arc::new(MockOcrEngine::new())).await.unwrap();
        assert!(pool.provision(Arc::new(MockOcrEngine::new())).await.is_err());
        pool.teardown().await;
    }

    #[tokio::test]
    async fn test_wait_ready() {
        let pool = RecognitionPool::new(options(2));
        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.wait_ready().await })
        };
        pool.provision(Arc::new(MockOcrEngine::new())).await.unwrap();
        assert!(waiter.await.unwrap().is_ok());
        pool.teardown().await;
    }
}
