//! Overlay mask geometry.
//!
//! The mask is an element whose content box is exactly the readable region
//! and whose borders darken everything else. Each border width is the
//! distance from the camera edge to the matching region edge, so the element
//! as a whole covers the full camera frame.

use serde::{Deserialize, Serialize};

use ocrcam_core::error::{OcrCamError, Result};
use ocrcam_core::types::{CameraSize, ReadableRegion};

/// Border colour of the mask (black, two-thirds opaque).
pub const OVERLAY_COLOR: &str = "#000000AA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderWidths {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

/// Mask sized to the region, with borders out to the camera edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayMask {
    pub width: u32,
    pub height: u32,
    pub border: BorderWidths,
    pub color: String,
}

impl OverlayMask {
    /// Compute the mask for `region` on a `camera`-sized feed.
    ///
    /// Fails with `InvalidRegion` if the region does not lie inside the frame.
    pub fn new(camera: CameraSize, region: ReadableRegion) -> Result<Self> {
        if !region.fits_within(camera) {
            return Err(OcrCamError::InvalidRegion {
                region: region.to_string(),
                width: camera.width,
                height: camera.height,
            });
        }
        Ok(Self {
            width: region.width,
            height: region.height,
            border: BorderWidths {
                top: region.top,
                right: camera.width - region.right(),
                bottom: camera.height - region.bottom(),
                left: region.left,
            },
            color: OVERLAY_COLOR.to_string(),
        })
    }

    /// Total width including borders; equals the camera width.
    pub fn outer_width(&self) -> u32 {
        self.border.left + self.width + self.border.right
    }

    /// Total height including borders; equals the camera height.
    pub fn outer_height(&self) -> u32 {
        self.border.top + self.height + self.border.bottom
    }

    /// Inline CSS for the mask element.
    pub fn css(&self) -> String {
        format!(
            "width:{}px;height:{}px;border-style:solid;border-color:{};\
             border-width:{}px {}px {}px {}px",
            self.width,
            self.height,
            self.color,
            self.border.top,
            self.border.right,
            self.border.bottom,
            self.border.left
        )
    }
}
