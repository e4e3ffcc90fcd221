//! # Error Module
//!
//! Error types for the transform pipeline.
//!
//! ## Design Principles
//! - **Fail loud on producer bugs** - a malformed marker aborts the pass
//! - **Include context** - paths, operation names, what went wrong
//! - **Retryable failures stay retryable** - a failed materialization is
//!   never recorded as done, so the next run can try again

use std::path::PathBuf;
use thiserror::Error;

/// Top-level pipeline error
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Transform error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    #[error("Watcher error: {0}")]
    Watch(#[from] WatcherError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while decoding transform markers out of content
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Malformed transform marker near `{snippet}`: {source}")]
    MalformedMarker {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by the transform capability
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    #[error("Invalid arguments for {operation}: {reason}")]
    InvalidArguments { operation: String, reason: String },

    #[error("Failed to read input {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Unsupported output format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Failed to encode output as {format}: {reason}")]
    Encode { format: String, reason: String },
}

/// Errors raised while producing output files
#[derive(Error, Debug)]
pub enum FilesystemError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the content watcher
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to initialize watcher: {0}")]
    InitFailed(String),

    #[error("Failed to watch {path}: {reason}")]
    WatchFailed { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_error_includes_operation() {
        let error = CapabilityError::InvalidArguments {
            operation: "resize".to_string(),
            reason: "expected a width".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("resize"));
        assert!(message.contains("expected a width"));
    }

    #[test]
    fn filesystem_error_includes_path() {
        let error = FilesystemError::Write {
            path: PathBuf::from("/site/assets/photo-abc.webp"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = error.to_string();
        assert!(message.contains("/site/assets/photo-abc.webp"));
    }

    #[test]
    fn descriptor_error_includes_snippet() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = DescriptorError::MalformedMarker {
            snippet: "{not json".to_string(),
            source,
        };
        assert!(error.to_string().contains("{not json"));
    }
}
