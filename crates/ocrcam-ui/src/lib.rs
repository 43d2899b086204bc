//! ocrcam UI crate - the presentation surface.
//!
//! The surface is a single self-contained HTML page embedded at compile time
//! via `include_str!`, plus the view model it renders from:
//!
//! - [`surface`]: the HTML served from the `/ui` endpoint
//! - [`overlay`]: border geometry of the mask marking the readable region
//! - [`view`]: the START/STOP control and the `/state` snapshot

pub mod overlay;
pub mod surface;
pub mod view;

pub use overlay::{BorderWidths, OverlayMask, OVERLAY_COLOR};
pub use surface::SURFACE_HTML;
pub use view::{CameraStatus, ControlButton, SurfaceView};
