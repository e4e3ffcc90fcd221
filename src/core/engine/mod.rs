//! # Engine Module
//!
//! The transform capability: the seam between the pipeline and actual pixel
//! work. The pipeline treats it as opaque - "apply these operations to this
//! input, give me encoded output bytes" - so tests can substitute counting or
//! failing stubs.
//!
//! ## Submodules
//! - `read` - input byte loading (mmap for large files, header validation)
//! - `decode` - format-specific decoding (zune-jpeg fast path)
//! - `resize` - SIMD-accelerated resizing
//! - `registry` - the static operation registry
//! - `image_engine` - the production implementation

mod decode;
mod image_engine;
mod read;
mod registry;
mod resize;

pub use image_engine::ImageEngine;
pub use registry::{OperationKind, OutputFormat};

use crate::core::descriptor::Operation;
use crate::error::CapabilityError;
use std::path::Path;

/// Applies an ordered chain of named operations to an input image and yields
/// encoded output bytes ready to be written.
///
/// Fails with a capability error on an unknown operation name, invalid
/// arguments, unreadable input, or an unsupported output format.
pub trait TransformEngine: Send + Sync {
    fn apply(&self, input: &Path, operations: &[Operation]) -> Result<Vec<u8>, CapabilityError>;
}
