pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::OcrCamConfig;
pub use error::{OcrCamError, Result};
pub use events::SurfaceEvent;
pub use types::*;
