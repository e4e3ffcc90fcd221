//! # Core Module
//!
//! The host-agnostic transform pipeline engine.
//!
//! ## Modules
//! - `descriptor` - declarative transform descriptions
//! - `identity` - deterministic identities and output-name derivation
//! - `marker` - the placeholder codec for generated content
//! - `engine` - the transform capability and its image implementation
//! - `materialize` - the content-addressed materialization cache
//! - `rewrite` - the full text pass over finished content
//! - `config` - output directory and URL prefix options
//! - `watcher` - rendered-content watching for the CLI watch mode

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod identity;
pub mod marker;
pub mod materialize;
pub mod rewrite;
pub mod watcher;

// Re-export commonly used types
pub use config::PipelineOptions;
pub use descriptor::{Descriptor, Operation};
pub use engine::{ImageEngine, TransformEngine};
pub use identity::Identity;
pub use materialize::{MaterializeStats, Materializer};
pub use rewrite::Rewriter;
