//! # Hooks Module
//!
//! The surface a rendering host registers against: a `sharp` entry-point
//! filter, one filter per registered operation, a `getUrl` shortcode, and a
//! `sharpTransform` output pass.
//!
//! Render time and transform time are deliberately decoupled: the filters and
//! the shortcode only build descriptors and emit markers; all filesystem and
//! pixel work happens when `sharp_transform` runs over finished content.

use crate::core::config::PipelineOptions;
use crate::core::descriptor::Descriptor;
use crate::core::engine::{OperationKind, TransformEngine};
use crate::core::marker;
use crate::core::materialize::{MaterializeStats, Materializer};
use crate::core::rewrite::Rewriter;
use crate::error::Result;
use serde_json::Value;
use std::sync::Arc;

/// Suffix identifying output artifacts eligible for the rewrite pass
const ELIGIBLE_SUFFIX: &str = ".html";

/// The hook surface handed to the rendering host.
///
/// Construction validates configuration and creates the output directory, so
/// a misconfigured pipeline fails at startup rather than mid-build.
pub struct Hooks {
    materializer: Arc<Materializer>,
    rewriter: Rewriter,
}

impl Hooks {
    pub fn new(options: PipelineOptions, engine: Box<dyn TransformEngine>) -> Result<Self> {
        options.validate()?;
        let materializer = Arc::new(Materializer::new(options, engine));
        materializer.init_output_dir()?;
        let rewriter = Rewriter::new(Arc::clone(&materializer));
        Ok(Self {
            materializer,
            rewriter,
        })
    }

    /// The `sharp` filter: start a descriptor from an input path
    pub fn sharp(&self, input_path: &str) -> Descriptor {
        Descriptor::new(input_path)
    }

    /// A per-operation filter: append `name(args)` to a descriptor or bare
    /// path.
    ///
    /// The name is checked against the operation registry so a typo fails at
    /// render time instead of surfacing as a broken build artifact later.
    pub fn apply_filter(
        &self,
        name: &str,
        source: impl Into<Descriptor>,
        args: Vec<Value>,
    ) -> Result<Descriptor> {
        OperationKind::parse(name)?;
        Ok(source.into().with_operation(name, args))
    }

    /// Names the host should register one operation filter for
    pub fn filter_names() -> impl Iterator<Item = &'static str> {
        OperationKind::names()
    }

    /// The `getUrl` shortcode: marker plus provisional path
    pub fn get_url(&self, source: impl Into<Descriptor>) -> String {
        marker::emit_url(&source.into(), self.materializer.options())
    }

    /// The `sharpTransform` pass, invoked once per output artifact.
    ///
    /// Ineligible artifacts are returned unchanged with zero decode attempts
    /// and no materialization side effects.
    pub fn sharp_transform(&self, content: &str, output_path: &str) -> Result<String> {
        if !output_path.ends_with(ELIGIBLE_SUFFIX) {
            return Ok(content.to_string());
        }
        self.rewriter.rewrite(content)
    }

    /// Reset the cache: empty the in-memory record and recreate the output
    /// directory empty
    pub fn clear_output_dir(&self) -> Result<()> {
        self.materializer.clear()
    }

    /// Materialization activity so far
    pub fn stats(&self) -> MaterializeStats {
        self.materializer.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::Operation;
    use crate::error::CapabilityError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingEngine {
        calls: AtomicUsize,
    }

    impl TransformEngine for CountingEngine {
        fn apply(
            &self,
            _input: &std::path::Path,
            _operations: &[Operation],
        ) -> std::result::Result<Vec<u8>, CapabilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(b"transformed".to_vec())
        }
    }

    fn hooks(dir: &TempDir) -> (Hooks, &'static CountingEngine) {
        let engine: &'static CountingEngine = Box::leak(Box::new(CountingEngine {
            calls: AtomicUsize::new(0),
        }));
        struct EngineRef(&'static CountingEngine);
        impl TransformEngine for EngineRef {
            fn apply(
                &self,
                input: &std::path::Path,
                operations: &[Operation],
            ) -> std::result::Result<Vec<u8>, CapabilityError> {
                self.0.apply(input, operations)
            }
        }

        let options = PipelineOptions::default().with_output_dir(dir.path().join("assets"));
        (
            Hooks::new(options, Box::new(EngineRef(engine))).unwrap(),
            engine,
        )
    }

    #[test]
    fn construction_creates_output_dir() {
        let dir = TempDir::new().unwrap();
        let _ = hooks(&dir);

        assert!(dir.path().join("assets").exists());
    }

    #[test]
    fn construction_rejects_empty_url_path() {
        let dir = TempDir::new().unwrap();
        let options = PipelineOptions::default()
            .with_output_dir(dir.path())
            .with_url_path("");

        assert!(Hooks::new(
            options,
            Box::new(CountingEngine {
                calls: AtomicUsize::new(0)
            })
        )
        .is_err());
    }

    #[test]
    fn sharp_builds_a_bare_descriptor() {
        let dir = TempDir::new().unwrap();
        let (hooks, _) = hooks(&dir);

        let descriptor = hooks.sharp("photo.jpg");

        assert_eq!(descriptor.input_path, "photo.jpg");
        assert!(descriptor.operations.is_empty());
    }

    #[test]
    fn apply_filter_chains_operations() {
        let dir = TempDir::new().unwrap();
        let (hooks, _) = hooks(&dir);

        let descriptor = hooks
            .apply_filter("resize", hooks.sharp("photo.jpg"), vec![json!(200), json!(200)])
            .and_then(|d| hooks.apply_filter("toFormat", d, vec![json!("webp")]))
            .unwrap();

        assert_eq!(descriptor.operations.len(), 2);
    }

    #[test]
    fn apply_filter_accepts_bare_paths() {
        let dir = TempDir::new().unwrap();
        let (hooks, _) = hooks(&dir);

        let descriptor = hooks
            .apply_filter("rotate", "photo.jpg", vec![json!(90)])
            .unwrap();

        assert_eq!(descriptor.input_path, "photo.jpg");
        assert_eq!(descriptor.operations.len(), 1);
    }

    #[test]
    fn apply_filter_rejects_unknown_names() {
        let dir = TempDir::new().unwrap();
        let (hooks, _) = hooks(&dir);

        assert!(hooks.apply_filter("sepia", "photo.jpg", vec![]).is_err());
    }

    #[test]
    fn filter_names_cover_the_registry() {
        let names: Vec<_> = Hooks::filter_names().collect();

        assert!(names.contains(&"resize"));
        assert!(names.contains(&"toFormat"));
    }

    #[test]
    fn get_url_emits_marker_and_provisional_path() {
        let dir = TempDir::new().unwrap();
        let (hooks, engine) = hooks(&dir);

        let emitted = hooks.get_url("photo.jpg");

        assert!(emitted.starts_with("<!-- SHARP_IMAGE {"));
        assert!(emitted.contains("-->/assets/images/photo-"));
        // Render time does no transform work
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn non_eligible_output_passes_through() {
        let dir = TempDir::new().unwrap();
        let (hooks, engine) = hooks(&dir);

        let content = format!(r#"body {{ background: url("{}") }}"#, hooks.get_url("bg.png"));

        let result = hooks.sharp_transform(&content, "styles.css").unwrap();

        assert_eq!(result, content);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn eligible_output_is_rewritten() {
        let dir = TempDir::new().unwrap();
        let (hooks, engine) = hooks(&dir);

        let content = format!(r#"<img src="{}">"#, hooks.get_url("photo.jpg"));

        let result = hooks.sharp_transform(&content, "index.html").unwrap();

        assert!(!result.contains("SHARP_IMAGE"));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_then_rewrite_rematerializes() {
        let dir = TempDir::new().unwrap();
        let (hooks, engine) = hooks(&dir);

        let content = format!(r#"<img src="{}">"#, hooks.get_url("photo.jpg"));
        hooks.sharp_transform(&content, "index.html").unwrap();
        hooks.clear_output_dir().unwrap();
        hooks.sharp_transform(&content, "index.html").unwrap();

        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    }
}
