//! # Rewrite Module
//!
//! The full text pass over finished content: find every marker, materialize
//! every referenced transform concurrently, and splice authoritative URL
//! paths over the marker spans. The rewritten text is returned only after
//! every triggered materialization has settled.

use crate::core::identity;
use crate::core::marker::{self, MarkerMatch};
use crate::core::materialize::Materializer;
use crate::error::Result;
use rayon::prelude::*;
use std::sync::Arc;

/// Rewrites rendered content against a shared materialization cache
pub struct Rewriter {
    materializer: Arc<Materializer>,
}

impl Rewriter {
    pub fn new(materializer: Arc<Materializer>) -> Self {
        Self { materializer }
    }

    /// Resolve every marker in `text` and return the cleaned text.
    ///
    /// A malformed marker aborts the whole pass before any materialization
    /// is scheduled. A failed materialization aborts the pass after all
    /// scheduled work has settled; no partially-rewritten text escapes.
    pub fn rewrite(&self, text: &str) -> Result<String> {
        let matches = marker::decode_all(text)?;
        if matches.is_empty() {
            return Ok(text.to_string());
        }

        // Authoritative names apply the format-override rule the render-time
        // provisional paths could not.
        let resolved: Vec<(MarkerMatch, String)> = matches
            .into_iter()
            .map(|m| {
                let file_name = identity::output_file_name(&m.descriptor);
                (m, file_name)
            })
            .collect();

        resolved
            .par_iter()
            .try_for_each(|(m, file_name)| {
                self.materializer.ensure_materialized(&m.descriptor, file_name)
            })?;

        // Spans are non-overlapping and in document order; build the output
        // by concatenation rather than repeated in-place search.
        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        for (m, file_name) in &resolved {
            output.push_str(&text[cursor..m.span.start]);
            output.push_str(&self.materializer.options().url_for(file_name));
            cursor = m.span.end;
        }
        output.push_str(&text[cursor..]);

        Ok(output)
    }
}
