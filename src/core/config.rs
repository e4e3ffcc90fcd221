//! Pipeline configuration.

use crate::error::PipelineError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration for asset output and public URL shaping
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineOptions {
    /// Filesystem directory that receives materialized assets
    pub output_dir: PathBuf,
    /// Public path prefix embedded in rewritten content
    pub url_path: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("public/assets/images"),
            url_path: "/assets/images/".to_string(),
        }
    }
}

impl PipelineOptions {
    /// Reject configurations the pipeline cannot operate with
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(PipelineError::Config("outputDir must not be empty".to_string()));
        }
        if self.url_path.is_empty() {
            return Err(PipelineError::Config("urlPath must not be empty".to_string()));
        }
        Ok(())
    }

    /// Public URL for a materialized file name
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.url_path.trim_end_matches('/'), file_name)
    }

    /// Filesystem path for a materialized file name
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Override the output directory
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl AsRef<Path>) -> Self {
        self.output_dir = output_dir.as_ref().to_path_buf();
        self
    }

    /// Override the URL prefix
    #[must_use]
    pub fn with_url_path(mut self, url_path: impl Into<String>) -> Self {
        self.url_path = url_path.into();
        self
    }
}
