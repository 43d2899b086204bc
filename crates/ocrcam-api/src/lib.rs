//! ocrcam API crate - axum HTTP server for the presentation surface.
//!
//! Serves the embedded surface page, its `/state` snapshot, the polling
//! controls, live camera snapshots and an SSE stream of surface events.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
