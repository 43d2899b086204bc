//! ocrcam Polling crate - the toggleable recognition timer.
//!
//! [`PollingController`] owns at most one timer (see [`PollingState`]). While
//! it runs, each tick captures a frame, crops it to the readable region and
//! queues it on the recognition pool; the latest result, the last job error
//! and tick counters are kept for the presentation surface.

pub mod controller;
pub mod state;
pub mod stats;

pub use controller::{
    forward_pool_status, LatestResult, PollingController, PollingOptions, StartRefusal,
    TickOutcome,
};
pub use state::{PollingState, TimerHandle};
pub use stats::{PollingStats, SkipCounts, TickCounters};
