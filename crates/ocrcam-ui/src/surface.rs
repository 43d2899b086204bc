//! The embedded presentation surface.
//!
//! One self-contained HTML page with inline CSS and JavaScript. It polls
//! `/state` once on load, then follows `/stream` (server-sent events) and
//! refreshes the live feed from `/frame.jpg`. The START/STOP button posts to
//! `/toggle`.

/// The complete self-contained surface HTML, served from `/ui`.
///
/// ```rust,ignore
/// use ocrcam_ui::SURFACE_HTML;
///
/// async fn ui_handler() -> axum::response::Html<&'static str> {
///     axum::response::Html(SURFACE_HTML)
/// }
/// ```
pub const SURFACE_HTML: &str = include_str!("../assets/surface.html");
