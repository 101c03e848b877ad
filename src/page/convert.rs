//! Bitmap re-encoding for converted downloads.

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};

use crate::error_handling::ConvertError;
use crate::models::ConvertFormat;

/// Whether `bytes` look like an image the decoder understands.
pub fn is_decodable_image(bytes: &[u8]) -> bool {
    image::guess_format(bytes).is_ok()
}

/// Decodes `bytes` and re-encodes them as `format`.
///
/// JPEG has no alpha channel, so transparent pixels are flattened onto the
/// RGB values the source already carries.
///
/// # Errors
///
/// `ConvertError::NoTarget` for [`ConvertFormat::Original`], `Decode` when the
/// bytes are not a supported image, `Encode` when writing the output fails.
pub fn convert_image(bytes: &[u8], format: ConvertFormat) -> Result<Bytes, ConvertError> {
    let target = match format {
        ConvertFormat::Original => return Err(ConvertError::NoTarget),
        ConvertFormat::Jpg => ImageFormat::Jpeg,
        ConvertFormat::Png => ImageFormat::Png,
    };

    let decoded = image::load_from_memory(bytes).map_err(|e| ConvertError::Decode(e.to_string()))?;
    let prepared = match target {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        _ => decoded,
    };

    let mut out = Vec::new();
    prepared
        .write_to(&mut Cursor::new(&mut out), target)
        .map_err(|e| ConvertError::Encode(e.to_string()))?;
    Ok(Bytes::from(out))
}

/// [`convert_image`] on the blocking pool, off the async workers.
pub async fn convert_image_blocking(
    bytes: Bytes,
    format: ConvertFormat,
) -> Result<Bytes, ConvertError> {
    tokio::task::spawn_blocking(move || convert_image(&bytes, format))
        .await
        .map_err(|e| ConvertError::Encode(format!("conversion task failed: {}", e)))?
}
