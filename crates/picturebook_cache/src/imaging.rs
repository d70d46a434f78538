//! Downscaling and re-encoding of generated avatars before they are stored.

use crate::AvatarSettings;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use picturebook_core::ImageData;
use picturebook_error::{ImageError, ImageErrorKind};
use std::io::Cursor;
use tracing::{debug, instrument, warn};

/// Fit an image inside `max_dimension` on its long side and encode it as JPEG.
///
/// Aspect ratio is preserved and images already within bounds are not enlarged.
///
/// # Errors
///
/// Returns an error if the bytes cannot be decoded or the JPEG cannot be written.
#[instrument(skip(image), fields(bytes = image.len(), mime = image.mime_type()))]
pub fn downscale(
    image: &ImageData,
    max_dimension: u32,
    jpeg_quality: u8,
) -> Result<ImageData, ImageError> {
    let decoded = image::load_from_memory(image.bytes())
        .map_err(|e| ImageError::new(ImageErrorKind::Decode(e.to_string())))?;

    let (width, height) = (decoded.width(), decoded.height());
    let resized = if width > max_dimension || height > max_dimension {
        decoded.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        decoded
    };

    let rgb = resized.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ImageError::new(ImageErrorKind::Encode(e.to_string())))?;

    debug!(
        from = %format!("{}x{}", width, height),
        to = %format!("{}x{}", rgb.width(), rgb.height()),
        "Downscaled avatar"
    );
    Ok(ImageData::new(buffer.into_inner(), "image/jpeg"))
}

/// Prepare a generated image for storage.
///
/// Anything the image codecs cannot read is kept as delivered.
pub fn prepare_for_storage(image: &ImageData, settings: &AvatarSettings) -> ImageData {
    match downscale(image, *settings.max_dimension(), *settings.jpeg_quality()) {
        Ok(scaled) => scaled,
        Err(e) => {
            warn!(error = %e, "Keeping generated image at original size");
            image.clone()
        }
    }
}
