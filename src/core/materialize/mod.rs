//! # Materialize Module
//!
//! The content-addressed transform cache. Guarantees each unique transform
//! identity is produced at most once per process (in-memory ledger +
//! per-identity locking) and reused across runs (on-disk existence check),
//! and that output files appear atomically.
//!
//! Admin operations (`clear`) racing active materializations have undefined
//! outcome; callers are responsible for serializing them against pipeline
//! runs.

use crate::core::config::PipelineOptions;
use crate::core::descriptor::Descriptor;
use crate::core::engine::TransformEngine;
use crate::core::identity::Identity;
use crate::error::{FilesystemError, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Snapshot of materialization activity, for summaries
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterializeStats {
    /// Transforms actually executed and written
    pub transforms_run: usize,
    /// Outputs found already on disk from a previous run
    pub disk_hits: usize,
    /// Repeat references answered from the in-memory record
    pub ledger_hits: usize,
}

/// The materialization cache.
///
/// Holds the process-lifetime record of materialized identities and drives
/// the external transform engine for the ones that are missing.
pub struct Materializer {
    options: PipelineOptions,
    engine: Box<dyn TransformEngine>,
    /// Identities confirmed materialized (on disk or freshly written)
    ledger: RwLock<HashSet<Identity>>,
    /// Per-identity gates: concurrent first use of one identity performs the
    /// transform exactly once
    in_flight: Mutex<HashMap<Identity, Arc<Mutex<()>>>>,
    transforms_run: AtomicUsize,
    disk_hits: AtomicUsize,
    ledger_hits: AtomicUsize,
}

impl Materializer {
    pub fn new(options: PipelineOptions, engine: Box<dyn TransformEngine>) -> Self {
        Self {
            options,
            engine,
            ledger: RwLock::new(HashSet::new()),
            in_flight: Mutex::new(HashMap::new()),
            transforms_run: AtomicUsize::new(0),
            disk_hits: AtomicUsize::new(0),
            ledger_hits: AtomicUsize::new(0),
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Create the output directory (idempotent, recursive)
    pub fn init_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.options.output_dir).map_err(|source| {
            FilesystemError::CreateDir {
                path: self.options.output_dir.clone(),
                source,
            }
        })?;
        Ok(())
    }

    /// Guarantee the output file for `descriptor` exists under `file_name`.
    ///
    /// Fast path: the identity is already recorded, no filesystem access.
    /// Warm path: the file exists from a previous run, record and return.
    /// Slow path: run the transform and write the result atomically.
    ///
    /// Failures propagate without recording the identity, so the next call
    /// retries.
    pub fn ensure_materialized(&self, descriptor: &Descriptor, file_name: &str) -> Result<()> {
        let identity = Identity::of(descriptor);

        if self.is_recorded(identity) {
            self.ledger_hits.fetch_add(1, Ordering::SeqCst);
            debug!(identity = %identity, "transform already recorded");
            return Ok(());
        }

        let gate = self.gate_for(identity);
        let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have finished while we waited on the gate
        if self.is_recorded(identity) {
            self.ledger_hits.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        }

        let output_path = self.options.output_path(file_name);

        if output_path.exists() {
            self.disk_hits.fetch_add(1, Ordering::SeqCst);
            info!(file = %file_name, "image already exists");
            self.record(identity);
            return Ok(());
        }

        info!(file = %file_name, "processing image");
        let bytes = self
            .engine
            .apply(Path::new(&descriptor.input_path), &descriptor.operations)?;

        // file_name may imply nested segments below the output dir
        let parent = output_path
            .parent()
            .unwrap_or(self.options.output_dir.as_path());
        fs::create_dir_all(parent).map_err(|source| FilesystemError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;

        // Stage in the output dir (same filesystem) and rename into place, so
        // a concurrent existence check never observes a partial file.
        let staged = NamedTempFile::new_in(parent).map_err(|source| FilesystemError::Write {
            path: output_path.clone(),
            source,
        })?;
        fs::write(staged.path(), &bytes).map_err(|source| FilesystemError::Write {
            path: output_path.clone(),
            source,
        })?;
        staged
            .persist(&output_path)
            .map_err(|e| FilesystemError::Write {
                path: output_path.clone(),
                source: e.error,
            })?;

        self.transforms_run.fetch_add(1, Ordering::SeqCst);
        self.record(identity);
        Ok(())
    }

    /// Empty the in-memory record and recreate the output directory empty.
    ///
    /// Tolerates the directory being absent.
    pub fn clear(&self) -> Result<()> {
        self.ledger
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        match fs::remove_dir_all(&self.options.output_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(FilesystemError::Remove {
                    path: self.options.output_dir.clone(),
                    source,
                }
                .into())
            }
        }

        self.init_output_dir()
    }

    pub fn stats(&self) -> MaterializeStats {
        MaterializeStats {
            transforms_run: self.transforms_run.load(Ordering::SeqCst),
            disk_hits: self.disk_hits.load(Ordering::SeqCst),
            ledger_hits: self.ledger_hits.load(Ordering::SeqCst),
        }
    }

    fn is_recorded(&self, identity: Identity) -> bool {
        self.ledger
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&identity)
    }

    fn record(&self, identity: Identity) {
        self.ledger
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity);
    }

    fn gate_for(&self, identity: Identity) -> Arc<Mutex<()>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(identity)
            .or_default()
            .clone()
    }
}
