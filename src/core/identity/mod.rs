//! # Identity Module
//!
//! Deterministic content identities for transform descriptors, and the
//! output-name derivation built on top of them.
//!
//! The identity doubles as cache key and filename component: the same
//! input + operations always produce the same file (reused across runs), and
//! any change to the input path or operation chain changes the filename.

use crate::core::descriptor::Descriptor;
use std::fmt;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_128;

/// Operation name whose trailing occurrence overrides the output extension
pub const FORMAT_OVERRIDE_OP: &str = "toFormat";

/// A 128-bit digest of a canonicalized descriptor.
///
/// Rendered as 32 lowercase hex characters. Not adversarially
/// collision-resistant; build input is trusted and local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(u128);

impl Identity {
    /// Compute the identity of a descriptor.
    ///
    /// The canonical representation is the descriptor's JSON serialization:
    /// struct fields serialize in declaration order and object keys sort, so
    /// logically-equal descriptors hash equal regardless of construction path.
    pub fn of(descriptor: &Descriptor) -> Self {
        let bytes = serde_json::to_vec(descriptor)
            .expect("descriptor serialization cannot fail for plain JSON values");
        Self(xxh3_128(&bytes))
    }

    /// The identity as 32 hex characters
    pub fn to_hex(self) -> String {
        format!("{:032x}", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// The authoritative output file name for a descriptor:
/// `{base}-{identity}{ext}`, where the extension comes from a trailing
/// `toFormat` operation if present, else from the input path.
pub fn output_file_name(descriptor: &Descriptor) -> String {
    let (base, input_ext) = split_input(&descriptor.input_path);
    let ext = descriptor
        .last_operation()
        .filter(|op| op.name == FORMAT_OVERRIDE_OP)
        .and_then(|op| op.args.first())
        .and_then(|arg| arg.as_str())
        .map(|format| format!(".{format}"))
        .unwrap_or(input_ext);

    format!("{base}-{}{ext}", Identity::of(descriptor))
}

/// The provisional output file name emitted at render time.
///
/// Always uses the input's extension: render-time call sites do not inspect
/// the operation chain, and the rewrite pass applies the format override.
pub fn provisional_file_name(descriptor: &Descriptor) -> String {
    let (base, ext) = split_input(&descriptor.input_path);
    format!("{base}-{}{ext}", Identity::of(descriptor))
}

/// Split an input path into (base name, extension-with-dot)
fn split_input(input_path: &str) -> (String, String) {
    let path = Path::new(input_path);
    let base = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    (base, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resized(input: &str, width: u64, height: u64) -> Descriptor {
        Descriptor::new(input).with_operation("resize", vec![json!(width), json!(height)])
    }

    #[test]
    fn identical_descriptors_hash_equal() {
        let a = resized("photo.jpg", 200, 200);
        let b = resized("photo.jpg", 200, 200);

        assert_eq!(Identity::of(&a), Identity::of(&b));
    }

    #[test]
    fn argument_change_changes_identity() {
        let a = resized("photo.jpg", 200, 200);
        let b = resized("photo.jpg", 201, 200);

        assert_ne!(Identity::of(&a), Identity::of(&b));
    }

    #[test]
    fn input_path_change_changes_identity() {
        let a = resized("photo.jpg", 200, 200);
        let b = resized("other.jpg", 200, 200);

        assert_ne!(Identity::of(&a), Identity::of(&b));
    }

    #[test]
    fn operation_order_changes_identity() {
        let a = Descriptor::new("photo.jpg")
            .with_operation("rotate", vec![json!(90)])
            .with_operation("grayscale", vec![]);
        let b = Descriptor::new("photo.jpg")
            .with_operation("grayscale", vec![])
            .with_operation("rotate", vec![json!(90)]);

        assert_ne!(Identity::of(&a), Identity::of(&b));
    }

    #[test]
    fn identity_renders_as_32_hex_chars() {
        let hex = Identity::of(&Descriptor::new("photo.jpg")).to_hex();

        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn output_name_keeps_input_extension_by_default() {
        let descriptor = resized("photo.jpg", 200, 200);
        let name = output_file_name(&descriptor);

        assert!(name.starts_with("photo-"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn trailing_to_format_overrides_extension() {
        let descriptor = resized("photo.jpg", 200, 200)
            .with_operation("toFormat", vec![json!("webp")]);

        assert!(output_file_name(&descriptor).ends_with(".webp"));
    }

    #[test]
    fn non_trailing_to_format_does_not_override() {
        let descriptor = Descriptor::new("photo.jpg")
            .with_operation("toFormat", vec![json!("webp")])
            .with_operation("rotate", vec![json!(90)]);

        assert!(output_file_name(&descriptor).ends_with(".jpg"));
    }

    #[test]
    fn provisional_name_ignores_format_override() {
        let descriptor = resized("photo.jpg", 200, 200)
            .with_operation("toFormat", vec![json!("webp")]);

        assert!(provisional_file_name(&descriptor).ends_with(".jpg"));
        // Identity portion is identical; only the extension differs.
        let authoritative = output_file_name(&descriptor);
        assert_eq!(
            provisional_file_name(&descriptor).trim_end_matches(".jpg"),
            authoritative.trim_end_matches(".webp")
        );
    }

    #[test]
    fn input_without_extension_gets_no_dot() {
        let name = output_file_name(&Descriptor::new("photo"));

        assert!(name.starts_with("photo-"));
        assert!(!name.contains('.'));
    }

    #[test]
    fn base_name_strips_directories() {
        let name = output_file_name(&Descriptor::new("content/img/photo.jpg"));

        assert!(name.starts_with("photo-"));
        assert!(!name.contains('/'));
    }
}
