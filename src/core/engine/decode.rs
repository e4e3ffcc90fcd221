//! Fast image decoding with format-specific optimizations.
//!
//! Uses zune-jpeg for JPEG files (1.5-2x faster than image crate),
//! falls back to image crate for other formats.

use super::read;
use crate::error::CapabilityError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Source formats with a dedicated decode path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Other,
}

impl SourceFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("jpg" | "jpeg") => Self::Jpeg,
            Some("png") => Self::Png,
            Some("webp") => Self::WebP,
            _ => Self::Other,
        }
    }
}

/// Decode input bytes using the fastest available decoder.
///
/// - JPEG: zune-jpeg (1.5-2x faster)
/// - Other formats: image crate fallback
pub fn decode_image(path: &Path, bytes: &[u8]) -> Result<DynamicImage, CapabilityError> {
    if !read::validate_image_header(bytes) {
        return Err(CapabilityError::Decode {
            path: path.to_path_buf(),
            reason: "unrecognized image header".to_string(),
        });
    }

    match SourceFormat::from_path(path) {
        SourceFormat::Jpeg => decode_jpeg(path, bytes).or_else(|_| decode_fallback(path, bytes)),
        _ => decode_fallback(path, bytes),
    }
}

/// Fast JPEG decoding using zune-jpeg
fn decode_jpeg(path: &Path, bytes: &[u8]) -> Result<DynamicImage, CapabilityError> {
    let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);

    let pixels = decoder.decode().map_err(|e| CapabilityError::Decode {
        path: path.to_path_buf(),
        reason: format!("zune-jpeg decode failed: {:?}", e),
    })?;

    let info = decoder.info().ok_or_else(|| CapabilityError::Decode {
        path: path.to_path_buf(),
        reason: "failed to get image info".to_string(),
    })?;

    let width = info.width as u32;
    let height = info.height as u32;

    // Get actual output colorspace after decoding
    let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);

    let image = match out_colorspace {
        ColorSpace::RGB => {
            let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                    CapabilityError::Decode {
                        path: path.to_path_buf(),
                        reason: "failed to create RGB buffer".to_string(),
                    }
                })?;
            DynamicImage::ImageRgb8(buffer)
        }
        ColorSpace::RGBA => {
            let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                    CapabilityError::Decode {
                        path: path.to_path_buf(),
                        reason: "failed to create RGBA buffer".to_string(),
                    }
                })?;
            DynamicImage::ImageRgba8(buffer)
        }
        ColorSpace::Luma => {
            let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| {
                    CapabilityError::Decode {
                        path: path.to_path_buf(),
                        reason: "failed to create Luma buffer".to_string(),
                    }
                })?;
            DynamicImage::ImageLuma8(buffer)
        }
        _ => {
            // Unsupported colorspace, fall back to image crate
            return decode_fallback(path, bytes);
        }
    };

    Ok(image)
}

/// Fallback to image crate for non-JPEG formats
fn decode_fallback(path: &Path, bytes: &[u8]) -> Result<DynamicImage, CapabilityError> {
    image::load_from_memory(bytes).map_err(|e| CapabilityError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
