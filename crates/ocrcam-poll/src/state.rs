//! Polling state: either stopped, or running with exactly one timer.
//!
//! Holding the timer inside the `Running` variant means a second timer cannot
//! exist without first replacing (and cancelling) the state that owns the
//! first one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use ocrcam_core::types::PollingStatus;

/// Owned handle to a running timer task.
#[derive(Debug)]
pub struct TimerHandle {
    cancel: Arc<Notify>,
    task: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

impl TimerHandle {
    pub(crate) fn new(cancel: Arc<Notify>, task: JoinHandle<()>) -> Self {
        Self {
            cancel,
            task,
            started_at: Utc::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the timer task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the timer. No further ticks fire once this returns control to the
    /// runtime; jobs already submitted keep running.
    pub fn cancel(self) -> JoinHandle<()> {
        // notify_one stores a permit, so a timer that is mid-tick still sees it.
        self.cancel.notify_one();
        self.task
    }
}

/// Two-state polling lifecycle.
#[derive(Debug, Default)]
pub enum PollingState {
    #[default]
    Stopped,
    Running(TimerHandle),
}

impl PollingState {
    pub fn status(&self) -> PollingStatus {
        match self {
            PollingState::Stopped => PollingStatus::Stopped,
            PollingState::Running(_) => PollingStatus::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, PollingState::Running(_))
    }

    /// Move to `Stopped`, handing back the timer if there was one.
    pub fn take_timer(&mut self) -> Option<TimerHandle> {
        match std::mem::take(self) {
            PollingState::Running(handle) => Some(handle),
            PollingState::Stopped => None,
        }
    }
}
