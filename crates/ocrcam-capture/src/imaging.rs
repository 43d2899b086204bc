//! Cropping and encoding of captured frames.

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, RgbaImage};

use ocrcam_core::error::{OcrCamError, Result};
use ocrcam_core::types::{Frame, ReadableRegion};

/// Cut `region` out of `frame`.
///
/// The returned frame keeps the source frame's id and capture time. Fails
/// with `InvalidRegion` if the region is empty or extends past the frame.
pub fn crop(frame: &Frame, region: ReadableRegion) -> Result<Frame> {
    if !region.fits_within(frame.size()) {
        return Err(OcrCamError::InvalidRegion {
            region: region.to_string(),
            width: frame.width(),
            height: frame.height(),
        });
    }
    let image = imageops::crop_imm(
        &frame.image,
        region.left,
        region.top,
        region.width,
        region.height,
    )
    .to_image();

    Ok(Frame {
        id: frame.id,
        captured_at: frame.captured_at,
        image,
    })
}

/// Encode an image as JPEG for the live feed. Alpha is discarded.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    DynamicImage::ImageRgb8(rgb).write_with_encoder(encoder)?;
    Ok(bytes)
}
