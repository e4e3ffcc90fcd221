//! # Content Watcher Module
//!
//! Monitors a rendered-output directory for content changes in real-time,
//! driving the CLI watch mode.
//!
//! ## Features
//! - Watches for new and modified rendered files
//! - Filters to eligible content files (`.html`)
//! - Debounces rapid file changes

use crate::error::WatcherError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Configuration for the content watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce duration for rapid file changes
    pub debounce_duration: Duration,
    /// Whether to watch subdirectories recursively
    pub recursive: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(500),
            recursive: true,
        }
    }
}

/// Events emitted when rendered content changes
#[derive(Debug, Clone)]
pub enum ContentEvent {
    /// A content file was created or modified
    Changed(PathBuf),
    /// A content file was removed
    Removed(PathBuf),
    /// An error occurred while watching
    Error(String),
}

/// Watches a rendered-output tree for content file changes
pub struct ContentWatcher {
    watcher: RecommendedWatcher,
    config: WatcherConfig,
}

impl ContentWatcher {
    /// Create a new watcher that passes events to the provided handler
    pub fn new<F>(config: WatcherConfig, event_handler: F) -> Result<Self, WatcherError>
    where
        F: Fn(ContentEvent) + Send + 'static,
    {
        let debounce = config.debounce_duration;
        let last_seen: Arc<Mutex<HashMap<PathBuf, Instant>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let watcher = notify::recommended_watcher(move |result: Result<Event, notify::Error>| {
            match result {
                Ok(event) => {
                    if let Some(content_event) = Self::process_event(event) {
                        if Self::debounced(&last_seen, &content_event, debounce) {
                            return;
                        }
                        event_handler(content_event);
                    }
                }
                Err(e) => {
                    event_handler(ContentEvent::Error(e.to_string()));
                }
            }
        })
        .map_err(|e| WatcherError::InitFailed(e.to_string()))?;

        Ok(Self { watcher, config })
    }

    /// Start watching a directory
    pub fn watch(&mut self, path: &Path) -> Result<(), WatcherError> {
        let mode = if self.config.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        self.watcher
            .watch(path, mode)
            .map_err(|e| WatcherError::WatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Convert a notify event to a ContentEvent if it touches eligible content
    fn process_event(event: Event) -> Option<ContentEvent> {
        let path = event
            .paths
            .into_iter()
            .find(|p| Self::is_content_file(p))?;

        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => Some(ContentEvent::Changed(path)),
            EventKind::Remove(_) => Some(ContentEvent::Removed(path)),
            _ => None,
        }
    }

    /// True when the event should be swallowed as a rapid repeat
    fn debounced(
        last_seen: &Mutex<HashMap<PathBuf, Instant>>,
        event: &ContentEvent,
        debounce: Duration,
    ) -> bool {
        let path = match event {
            ContentEvent::Changed(path) => path.clone(),
            _ => return false,
        };

        let now = Instant::now();
        let mut seen = last_seen.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = seen.get(&path) {
            if now.duration_since(*previous) < debounce {
                return true;
            }
        }
        seen.insert(path, now);
        false
    }

    fn is_content_file(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html"))
    }
}
