use serde::{Deserialize, Serialize};

use crate::types::{PollingStatus, PoolStatus, RecognitionResult, TickSkipReason};

/// Events pushed to the presentation surface.
///
/// Emitted by the pool watcher and the polling controller, consumed by the SSE
/// stream and by headless logging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SurfaceEvent {
    /// The pool moved to a new lifecycle state.
    PoolStatusChanged { status: PoolStatus },

    /// The polling timer was started or stopped.
    PollingChanged { status: PollingStatus },

    /// A recognition job finished and replaced the displayed text.
    ResultUpdated { result: RecognitionResult },

    /// A tick fired but did not submit a job.
    TickSkipped { reason: TickSkipReason },

    /// A submitted job failed; the displayed text is unchanged.
    JobFailed { message: String },
}

impl SurfaceEvent {
    /// Event name used for SSE `event:` lines and log fields.
    pub fn event_name(&self) -> &'static str {
        match self {
            SurfaceEvent::PoolStatusChanged { .. } => "pool_status_changed",
            SurfaceEvent::PollingChanged { .. } => "polling_changed",
            SurfaceEvent::ResultUpdated { .. } => "result_updated",
            SurfaceEvent::TickSkipped { .. } => "tick_skipped",
            SurfaceEvent::JobFailed { .. } => "job_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_event_names() {
        let events = vec![
            (
                SurfaceEvent::PoolStatusChanged {
                    status: PoolStatus::Ready,
                },
                "pool_status_changed",
            ),
            (
                SurfaceEvent::PollingChanged {
                    status: PollingStatus::Running,
                },
                "polling_changed",
            ),
            (
                SurfaceEvent::TickSkipped {
                    reason: TickSkipReason::CameraUnavailable,
                },
                "tick_skipped",
            ),
            (
                SurfaceEvent::JobFailed {
                    message: "boom".into(),
                },
                "job_failed",
            ),
        ];
        for (event, name) in events {
            assert_eq!(event.event_name(), name);
        }
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = SurfaceEvent::ResultUpdated {
            result: RecognitionResult {
                job_id: Uuid::new_v4(),
                worker_id: 3,
                text: "HELLO".into(),
                completed_at: Utc::now(),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "result_updated");
        assert_eq!(json["result"]["text"], "HELLO");
        assert_eq!(json["result"]["worker_id"], 3);

        let back: SurfaceEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
