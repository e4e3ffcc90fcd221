//! The static operation registry.
//!
//! Maps operation names to typed argument handling and invocation, enumerated
//! once at initialization. The registered name set is what the host exposes as
//! per-operation filters; an unknown name or malformed arguments surface as
//! capability errors when the transform runs.

use super::resize;
use crate::core::descriptor::Operation;
use crate::error::CapabilityError;
use image::DynamicImage;
use serde_json::Value;
use std::path::Path;

/// A transform operation the engine knows how to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// `resize(width[, height])` - exact resize; height defaults to the
    /// source aspect ratio
    Resize,
    /// `toFormat(format)` - selects the output encoding; no pixel effect
    ToFormat,
    /// `rotate(degrees)` - quarter-turn rotation, multiples of 90
    Rotate,
    /// `grayscale()` / `greyscale()` - drop color
    Grayscale,
    /// `blur(sigma)` - gaussian blur
    Blur,
    /// `flip()` - mirror about the horizontal axis
    Flip,
    /// `flop()` - mirror about the vertical axis
    Flop,
    /// `negate()` - invert pixel values
    Negate,
    /// `thumbnail(width[, height])` - fit within a box, never upscaling
    Thumbnail,
}

/// Registered name -> kind table. `greyscale` is an accepted alias.
const REGISTRY: &[(&str, OperationKind)] = &[
    ("resize", OperationKind::Resize),
    ("toFormat", OperationKind::ToFormat),
    ("rotate", OperationKind::Rotate),
    ("grayscale", OperationKind::Grayscale),
    ("greyscale", OperationKind::Grayscale),
    ("blur", OperationKind::Blur),
    ("flip", OperationKind::Flip),
    ("flop", OperationKind::Flop),
    ("negate", OperationKind::Negate),
    ("thumbnail", OperationKind::Thumbnail),
];

impl OperationKind {
    /// Look up an operation by its registered name
    pub fn parse(name: &str) -> Result<Self, CapabilityError> {
        REGISTRY
            .iter()
            .find(|(registered, _)| *registered == name)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| CapabilityError::UnknownOperation {
                name: name.to_string(),
            })
    }

    /// All registrable operation names, for start-time hook registration
    pub fn names() -> impl Iterator<Item = &'static str> {
        REGISTRY.iter().map(|(name, _)| *name)
    }
}

/// Apply one operation to a decoded image.
///
/// `toFormat` is validated here but has no pixel effect; the engine resolves
/// the output encoding separately.
pub fn apply_operation(
    image: DynamicImage,
    op: &Operation,
) -> Result<DynamicImage, CapabilityError> {
    match OperationKind::parse(&op.name)? {
        OperationKind::Resize => {
            let width = u32_arg(op, 0)?;
            let (width, height) = match optional_u32_arg(op, 1)? {
                Some(height) => (width, height),
                None => resize::scale_to_width(image.width(), image.height(), width),
            };
            resize::resize(&image, width, height, &op.name)
        }
        OperationKind::Thumbnail => {
            let width = u32_arg(op, 0)?;
            let height = optional_u32_arg(op, 1)?.unwrap_or(width);
            let (width, height) = resize::fit_within(image.width(), image.height(), width, height);
            if (width, height) == (image.width(), image.height()) {
                return Ok(image);
            }
            resize::resize(&image, width, height, &op.name)
        }
        OperationKind::ToFormat => {
            OutputFormat::parse(format_arg(op)?)?;
            Ok(image)
        }
        OperationKind::Rotate => {
            let degrees = i64_arg(op, 0)?;
            match degrees.rem_euclid(360) {
                0 => Ok(image),
                90 => Ok(image.rotate90()),
                180 => Ok(image.rotate180()),
                270 => Ok(image.rotate270()),
                _ => Err(invalid(op, "rotation must be a multiple of 90 degrees")),
            }
        }
        OperationKind::Grayscale => Ok(image.grayscale()),
        OperationKind::Blur => {
            let sigma = f32_arg(op, 0)?;
            if sigma <= 0.0 {
                return Err(invalid(op, "sigma must be positive"));
            }
            Ok(image.blur(sigma))
        }
        OperationKind::Flip => Ok(image.flipv()),
        OperationKind::Flop => Ok(image.fliph()),
        OperationKind::Negate => {
            let mut image = image;
            image.invert();
            Ok(image)
        }
    }
}

/// Output encodings the engine can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
}

impl OutputFormat {
    /// Parse a format name as given to `toFormat`
    pub fn parse(name: &str) -> Result<Self, CapabilityError> {
        match name.to_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            "gif" => Ok(Self::Gif),
            "bmp" => Ok(Self::Bmp),
            "tif" | "tiff" => Ok(Self::Tiff),
            _ => Err(CapabilityError::UnsupportedFormat {
                format: name.to_string(),
            }),
        }
    }

    /// Derive the format from a path extension
    pub fn from_extension(path: &Path) -> Result<Self, CapabilityError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| CapabilityError::UnsupportedFormat {
                format: path.to_string_lossy().into_owned(),
            })?;
        Self::parse(ext)
    }

    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::WebP => image::ImageFormat::WebP,
            Self::Gif => image::ImageFormat::Gif,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jpeg => write!(f, "jpeg"),
            Self::Png => write!(f, "png"),
            Self::WebP => write!(f, "webp"),
            Self::Gif => write!(f, "gif"),
            Self::Bmp => write!(f, "bmp"),
            Self::Tiff => write!(f, "tiff"),
        }
    }
}

fn invalid(op: &Operation, reason: &str) -> CapabilityError {
    CapabilityError::InvalidArguments {
        operation: op.name.clone(),
        reason: reason.to_string(),
    }
}

fn u32_arg(op: &Operation, index: usize) -> Result<u32, CapabilityError> {
    optional_u32_arg(op, index)?
        .ok_or_else(|| invalid(op, &format!("expected a positive integer at position {index}")))
}

fn optional_u32_arg(op: &Operation, index: usize) -> Result<Option<u32>, CapabilityError> {
    match op.args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid(op, &format!("expected a positive integer at position {index}"))),
    }
}

fn i64_arg(op: &Operation, index: usize) -> Result<i64, CapabilityError> {
    op.args
        .get(index)
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid(op, &format!("expected an integer at position {index}")))
}

fn f32_arg(op: &Operation, index: usize) -> Result<f32, CapabilityError> {
    op.args
        .get(index)
        .and_then(Value::as_f64)
        .map(|n| n as f32)
        .ok_or_else(|| invalid(op, &format!("expected a number at position {index}")))
}

fn format_arg(op: &Operation) -> Result<&str, CapabilityError> {
    op.args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(op, "expected a format name as the first argument"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use serde_json::json;

    fn operation(name: &str, args: Vec<Value>) -> Operation {
        Operation {
            name: name.to_string(),
            args,
        }
    }

    fn test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 0])
        }))
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let error = OperationKind::parse("sepia").unwrap_err();

        assert!(matches!(error, CapabilityError::UnknownOperation { .. }));
    }

    #[test]
    fn registry_enumerates_names() {
        let names: Vec<_> = OperationKind::names().collect();

        assert!(names.contains(&"resize"));
        assert!(names.contains(&"toFormat"));
        assert!(names.contains(&"greyscale"));
    }

    #[test]
    fn resize_with_both_dimensions() {
        let out = apply_operation(test_image(100, 50), &operation("resize", vec![json!(10), json!(20)]))
            .unwrap();

        assert_eq!((out.width(), out.height()), (10, 20));
    }

    #[test]
    fn resize_with_width_only_keeps_aspect() {
        let out =
            apply_operation(test_image(100, 50), &operation("resize", vec![json!(50)])).unwrap();

        assert_eq!((out.width(), out.height()), (50, 25));
    }

    #[test]
    fn resize_with_null_height_keeps_aspect() {
        let out = apply_operation(
            test_image(100, 50),
            &operation("resize", vec![json!(50), Value::Null]),
        )
        .unwrap();

        assert_eq!((out.width(), out.height()), (50, 25));
    }

    #[test]
    fn resize_without_width_is_invalid() {
        let error = apply_operation(test_image(10, 10), &operation("resize", vec![])).unwrap_err();

        assert!(matches!(error, CapabilityError::InvalidArguments { .. }));
    }

    #[test]
    fn thumbnail_never_upscales() {
        let out = apply_operation(
            test_image(10, 10),
            &operation("thumbnail", vec![json!(100), json!(100)]),
        )
        .unwrap();

        assert_eq!((out.width(), out.height()), (10, 10));
    }

    #[test]
    fn rotate_quarter_turns_swap_dimensions() {
        let out =
            apply_operation(test_image(100, 50), &operation("rotate", vec![json!(90)])).unwrap();

        assert_eq!((out.width(), out.height()), (50, 100));
    }

    #[test]
    fn rotate_negative_angle_normalizes() {
        let out =
            apply_operation(test_image(100, 50), &operation("rotate", vec![json!(-90)])).unwrap();

        assert_eq!((out.width(), out.height()), (50, 100));
    }

    #[test]
    fn rotate_rejects_odd_angles() {
        let error =
            apply_operation(test_image(10, 10), &operation("rotate", vec![json!(45)])).unwrap_err();

        assert!(matches!(error, CapabilityError::InvalidArguments { .. }));
    }

    #[test]
    fn to_format_validates_but_leaves_pixels_alone() {
        let out = apply_operation(
            test_image(10, 10),
            &operation("toFormat", vec![json!("webp")]),
        )
        .unwrap();

        assert_eq!((out.width(), out.height()), (10, 10));
    }

    #[test]
    fn to_format_rejects_unknown_format() {
        let error = apply_operation(
            test_image(10, 10),
            &operation("toFormat", vec![json!("xcf")]),
        )
        .unwrap_err();

        assert!(matches!(error, CapabilityError::UnsupportedFormat { .. }));
    }

    #[test]
    fn blur_rejects_non_positive_sigma() {
        let error =
            apply_operation(test_image(10, 10), &operation("blur", vec![json!(0)])).unwrap_err();

        assert!(matches!(error, CapabilityError::InvalidArguments { .. }));
    }

    #[test]
    fn output_format_parses_aliases() {
        assert_eq!(OutputFormat::parse("jpg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("JPEG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("webp").unwrap(), OutputFormat::WebP);
    }

    #[test]
    fn output_format_from_extension() {
        assert_eq!(
            OutputFormat::from_extension(Path::new("photo.png")).unwrap(),
            OutputFormat::Png
        );
        assert!(OutputFormat::from_extension(Path::new("photo")).is_err());
    }
}
