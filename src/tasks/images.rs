// src/tasks/images.rs

//! Raster recompression and WebP conversion.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};

use crate::tasks::error::TransformError;

/// Quality used when re-encoding JPEGs.
pub const JPEG_QUALITY: u8 = 75;

fn decode(source: &[u8]) -> Result<(ImageFormat, DynamicImage), TransformError> {
    let format = image::guess_format(source)?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(TransformError::Unsupported(format!(
            "{format:?} images are not handled (only PNG and JPEG)"
        )));
    }
    let img = image::load_from_memory_with_format(source, format)?;
    Ok((format, img))
}

/// Re-encode a PNG (best compression, adaptive filtering) or JPEG
/// (quality 75). Returns whichever of the original and the re-encoded bytes
/// is smaller.
pub fn optimize(source: &[u8]) -> Result<Vec<u8>, TransformError> {
    let (format, img) = decode(source)?;
    let (width, height) = (img.width(), img.height());
    let mut out = Vec::new();

    match format {
        ImageFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut out,
                CompressionType::Best,
                FilterType::Adaptive,
            );
            encoder.write_image(img.as_bytes(), width, height, img.color().into())?;
        }
        _ => {
            let rgb = img.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
            encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)?;
        }
    }

    if out.len() < source.len() {
        Ok(out)
    } else {
        Ok(source.to_vec())
    }
}

/// Convert a PNG or JPEG to lossless WebP.
pub fn to_webp(source: &[u8]) -> Result<Vec<u8>, TransformError> {
    let (_, img) = decode(source)?;
    let img = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::WebP)?;
    Ok(out.into_inner())
}
