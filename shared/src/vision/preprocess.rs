use image::{ColorType, DynamicImage, ImageOutputFormat};
use std::io::Cursor;

use super::error::AnalysisError;

const JPEG_QUALITY: u8 = 90;

/// Image bytes ready to be inlined into a model request
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Decode, force 3-channel RGB, re-encode as JPEG.
pub fn prepare_image(bytes: &[u8]) -> Result<PreparedImage, AnalysisError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| AnalysisError::ImageDecode(e.to_string()))?;

    let rgb = if decoded.color() == ColorType::Rgb8 {
        decoded
    } else {
        tracing::debug!("Converting image from {:?} to Rgb8", decoded.color());
        DynamicImage::ImageRgb8(decoded.to_rgb8())
    };

    let mut encoded = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut encoded), ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| AnalysisError::ImageDecode(format!("re-encode failed: {}", e)))?;

    Ok(PreparedImage {
        mime_type: "image/jpeg",
        bytes: encoded,
    })
}
