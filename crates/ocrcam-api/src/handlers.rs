//! Route handler functions for all API endpoints.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use ocrcam_capture::CameraSource;
use ocrcam_core::types::{PollingStatus, PoolStatus};
use ocrcam_ui::SurfaceView;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub pool: PoolStatus,
}

/// Result of a polling start/stop/toggle request.
#[derive(Debug, Serialize, Deserialize)]
pub struct PollingActionResult {
    pub success: bool,
    pub status: PollingStatus,
    pub message: String,
}

impl PollingActionResult {
    fn new(status: PollingStatus) -> Self {
        let message = match status {
            PollingStatus::Running => "Polling started",
            PollingStatus::Stopped => "Polling stopped",
        };
        Self {
            success: true,
            status,
            message: message.to_string(),
        }
    }
}

// =============================================================================
// Surface
// =============================================================================

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        pool: state.pool.status(),
    })
}

/// GET /ui - serve the self-contained surface HTML.
pub async fn ui() -> impl IntoResponse {
    Html(ocrcam_ui::SURFACE_HTML)
}

/// GET /state - everything the surface renders.
pub async fn surface_state(State(state): State<AppState>) -> Result<Json<SurfaceView>, ApiError> {
    Ok(Json(SurfaceView::snapshot(&state.polling)?))
}

// =============================================================================
// Polling controls
// =============================================================================

/// POST /polling/start - start the polling timer.
pub async fn polling_start(
    State(state): State<AppState>,
) -> Result<Json<PollingActionResult>, ApiError> {
    state.polling.try_start()?;
    Ok(Json(PollingActionResult::new(PollingStatus::Running)))
}

/// POST /polling/stop - stop the polling timer.
pub async fn polling_stop(
    State(state): State<AppState>,
) -> Result<Json<PollingActionResult>, ApiError> {
    if !state.polling.stop() {
        return Err(ApiError::Conflict("Polling is not running".to_string()));
    }
    Ok(Json(PollingActionResult::new(PollingStatus::Stopped)))
}

/// POST /toggle - the START/STOP button.
pub async fn toggle(State(state): State<AppState>) -> Result<Json<PollingActionResult>, ApiError> {
    if state.polling.is_running() {
        polling_stop(State(state)).await
    } else {
        polling_start(State(state)).await
    }
}

// =============================================================================
// Live feed
// =============================================================================

/// GET /frame.jpg - current camera frame as JPEG.
pub async fn frame_jpg(State(state): State<AppState>) -> Result<Response, ApiError> {
    if !state.camera.is_ready() {
        return Err(ApiError::ServiceUnavailable(
            "Camera stream is not attached".to_string(),
        ));
    }
    let frame = state.camera.capture().await?;
    let quality = state.config.camera.jpeg_quality;
    let jpeg = tokio::task::spawn_blocking(move || ocrcam_capture::encode_jpeg(&frame.image, quality))
        .await
        .map_err(|e| ApiError::Internal(format!("Encoder task failed: {}", e)))??;

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        jpeg,
    )
        .into_response())
}

/// GET /stream - SSE stream of surface events.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().event(event.event_name()).data(data)))
        }
        // Lagged receivers just miss events; the page re-reads /state.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
