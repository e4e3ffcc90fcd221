//! # image-mill
//!
//! A build-time image transform pipeline with content-addressed caching.
//!
//! ## Core Philosophy
//! - **Describe at render time, materialize once** - templates embed
//!   declarative transform markers; a later pass does the pixel work
//! - **Identity is the cache** - the same input and operations always produce
//!   the same file name, reused across runs and busted by any change
//! - **Fail loud** - a broken marker or failed transform fails the build
//!   instead of shipping dangling references
//!
//! ## Architecture
//! The library is split into a core engine (host-agnostic) and the surface a
//! rendering host registers:
//! - `core` - descriptors, identities, the marker codec, the transform
//!   engine, the materialization cache, and the rewriter
//! - `hooks` - filters, the `getUrl` shortcode, and the `sharpTransform` pass
//! - `error` - pipeline error types

pub mod core;
pub mod error;
pub mod hooks;

// Re-export commonly used types at the crate root
pub use error::{PipelineError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
