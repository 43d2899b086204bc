//! Mock OCR engine for testing.
//!
//! Returns deterministic text without performing real OCR. Initialization and
//! recognition latency, per-worker init failures, and job failures are all
//! configurable, and shared counters record what the pool did with the
//! workers.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use tokio::sync::Semaphore;

use ocrcam_core::error::{OcrCamError, Result};

use crate::{OcrEngine, OcrWorker};

/// Counters shared between a [`MockOcrEngine`] and every worker it creates.
#[derive(Debug, Default)]
pub struct MockCounters {
    inits_completed: AtomicUsize,
    jobs_completed: AtomicUsize,
    workers_terminated: AtomicUsize,
}

impl MockCounters {
    pub fn inits_completed(&self) -> usize {
        self.inits_completed.load(Ordering::SeqCst)
    }

    pub fn jobs_completed(&self) -> usize {
        self.jobs_completed.load(Ordering::SeqCst)
    }

    pub fn workers_terminated(&self) -> usize {
        self.workers_terminated.load(Ordering::SeqCst)
    }
}

/// Mock OCR engine.
#[derive(Debug, Clone)]
pub struct MockOcrEngine {
    text: String,
    numbered: bool,
    init_delay: Duration,
    recognize_delay: Duration,
    failing_workers: HashSet<usize>,
    fail_jobs: bool,
    init_gate: Option<Arc<Semaphore>>,
    counters: Arc<MockCounters>,
}

impl MockOcrEngine {
    /// Create a mock engine with default response text and no latency.
    pub fn new() -> Self {
        Self {
            text: "MOCK OCR TEXT".to_string(),
            numbered: false,
            init_delay: Duration::ZERO,
            recognize_delay: Duration::ZERO,
            failing_workers: HashSet::new(),
            fail_jobs: false,
            init_gate: None,
            counters: Arc::new(MockCounters::default()),
        }
    }

    /// Create a mock engine that returns the specified text.
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::new()
        }
    }

    /// Append ` #<n>` to every result, `n` counting completed jobs from 1.
    pub fn numbered(mut self) -> Self {
        self.numbered = true;
        self
    }

    pub fn init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    pub fn recognize_delay(mut self, delay: Duration) -> Self {
        self.recognize_delay = delay;
        self
    }

    /// Make initialization of the given worker fail.
    pub fn fail_worker(mut self, worker_id: usize) -> Self {
        self.failing_workers.insert(worker_id);
        self
    }

    /// Make every recognition job fail.
    pub fn fail_jobs(mut self) -> Self {
        self.fail_jobs = true;
        self
    }

    /// Hold each worker initialization until a permit is added to `gate`.
    pub fn init_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.init_gate = Some(gate);
        self
    }

    pub fn counters(&self) -> Arc<MockCounters> {
        Arc::clone(&self.counters)
    }
}

impl Default for MockOcrEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrEngine for MockOcrEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_worker(&self, worker_id: usize, language: &str) -> Result<Box<dyn OcrWorker>> {
        if let Some(gate) = &self.init_gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| OcrCamError::Ocr("init gate closed".into()))?;
            permit.forget();
        }
        if !self.init_delay.is_zero() {
            tokio::time::sleep(self.init_delay).await;
        }
        if self.failing_workers.contains(&worker_id) {
            return Err(OcrCamError::Ocr(format!(
                "mock worker {} failed to load {}",
                worker_id, language
            )));
        }
        self.counters.inits_completed.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockWorker {
            text: self.text.clone(),
            numbered: self.numbered,
            delay: self.recognize_delay,
            fail: self.fail_jobs,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockWorker {
    text: String,
    numbered: bool,
    delay: Duration,
    fail: bool,
    counters: Arc<MockCounters>,
}

#[async_trait]
impl OcrWorker for MockWorker {
    async fn recognize(&mut self, image: &RgbaImage) -> Result<String> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrCamError::JobFailed("Empty image".to_string()));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(OcrCamError::JobFailed("mock recognition failure".into()));
        }
        let n = self.counters.jobs_completed.fetch_add(1, Ordering::SeqCst) + 1;
        if self.numbered {
            Ok(format!("{} #{}", self.text, n))
        } else {
            Ok(self.text.clone())
        }
    }

    async fn terminate(&mut self) {
        self.counters.workers_terminated.fetch_add(1, Ordering::SeqCst);
    }
}
