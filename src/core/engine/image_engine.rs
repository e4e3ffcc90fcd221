//! Production transform engine backed by the image crate.

use super::{decode, read, registry, OutputFormat, TransformEngine};
use crate::core::descriptor::Operation;
use crate::core::identity::FORMAT_OVERRIDE_OP;
use crate::error::CapabilityError;
use image::DynamicImage;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;

/// Decodes the input, applies each registered operation in recorded order,
/// and encodes the result.
pub struct ImageEngine;

impl ImageEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformEngine for ImageEngine {
    fn apply(&self, input: &Path, operations: &[Operation]) -> Result<Vec<u8>, CapabilityError> {
        let bytes = read::read_file_bytes(input)?;
        let mut image = decode::decode_image(input, &bytes)?;

        for op in operations {
            image = registry::apply_operation(image, op)?;
        }

        encode(image, output_format(input, operations)?)
    }
}

/// The encoding for the final bytes: a trailing `toFormat` wins, otherwise
/// the input's extension. Matches the filename override rule exactly, so the
/// written bytes always agree with the authoritative extension.
fn output_format(
    input: &Path,
    operations: &[Operation],
) -> Result<OutputFormat, CapabilityError> {
    if let Some(op) = operations.last().filter(|op| op.name == FORMAT_OVERRIDE_OP) {
        let format = op.args.first().and_then(Value::as_str).ok_or_else(|| {
            CapabilityError::InvalidArguments {
                operation: op.name.clone(),
                reason: "expected a format name as the first argument".to_string(),
            }
        })?;
        return OutputFormat::parse(format);
    }
    OutputFormat::from_extension(input)
}

fn encode(image: DynamicImage, format: OutputFormat) -> Result<Vec<u8>, CapabilityError> {
    // JPEG cannot carry alpha
    let image = match format {
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format.to_image_format())
        .map_err(|e| CapabilityError::Encode {
            format: format.to_string(),
            reason: e.to_string(),
        })?;

    Ok(buffer.into_inner())
}
