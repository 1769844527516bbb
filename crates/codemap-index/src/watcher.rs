//! File system watcher for incremental re-indexing.
//!
//! This module provides file watching with debouncing and the same ignore
//! rules as directory indexing. Only C and C++ files produce events.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebouncedEvent, Debouncer, new_debouncer};
use tracing::{debug, warn};

use crate::filter::PathFilter;

/// Error type for file watcher operations.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Ignore rules error: {0}")]
    Ignore(#[from] ignore::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// A file was created or modified.
    Modified(PathBuf),
    /// A file was deleted.
    Deleted(PathBuf),
}

impl FileEvent {
    /// Get the path associated with this event.
    pub fn path(&self) -> &Path {
        match self {
            FileEvent::Modified(p) | FileEvent::Deleted(p) => p,
        }
    }

    /// Classify a debounced path by whether it still exists.
    fn from_path(path: PathBuf) -> Self {
        if path.exists() {
            FileEvent::Modified(path)
        } else {
            FileEvent::Deleted(path)
        }
    }
}

/// Configuration for the file watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce duration for rapid events.
    pub debounce_duration: Duration,
    /// Whether to respect `.gitignore` and `.codemapignore`.
    pub use_gitignore: bool,
    /// Additional ignore patterns.
    pub ignore_patterns: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(300),
            use_gitignore: true,
            ignore_patterns: vec![
                "build".to_string(),
                "node_modules".to_string(),
                ".git".to_string(),
                ".codemap".to_string(),
            ],
        }
    }
}

/// File system watcher with debouncing and filtering.
pub struct FileWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    rx: Receiver<std::result::Result<Vec<DebouncedEvent>, notify::Error>>,
    filter: PathFilter,
    /// Accepted events from a batch that have not been handed out yet.
    pending: RefCell<VecDeque<FileEvent>>,
}

impl FileWatcher {
    /// Create a new file watcher for the given root directory.
    pub fn new(root: &Path) -> Result<Self> {
        Self::with_config(root, WatcherConfig::default())
    }

    /// Create a new file watcher with custom configuration.
    pub fn with_config(root: &Path, config: WatcherConfig) -> Result<Self> {
        // Events arrive with canonical paths on some platforms
        let root = root.canonicalize()?;
        let (tx, rx) = channel();

        let mut debouncer = new_debouncer(config.debounce_duration, tx)?;
        debouncer
            .watcher()
            .watch(&root, RecursiveMode::Recursive)?;

        let filter = PathFilter::new(&root, config.use_gitignore, &config.ignore_patterns)?;
        debug!(root = %root.display(), "Watching for changes");

        Ok(Self {
            _debouncer: debouncer,
            rx,
            filter,
            pending: RefCell::new(VecDeque::new()),
        })
    }

    /// Check if a path should be ignored.
    fn should_ignore(&self, path: &Path) -> bool {
        !self.filter.accepts(path)
    }

    /// Queue every accepted path of one debounced batch.
    fn enqueue(&self, events: Vec<DebouncedEvent>) {
        let mut pending = self.pending.borrow_mut();
        for event in events {
            if self.should_ignore(&event.path) {
                continue;
            }
            let event = FileEvent::from_path(event.path);
            if !pending.contains(&event) {
                pending.push_back(event);
            }
        }
    }

    fn pop_pending(&self) -> Option<FileEvent> {
        self.pending.borrow_mut().pop_front()
    }

    /// Get the next file event, blocking until one is available.
    ///
    /// Returns `None` if the watcher has been stopped.
    pub fn next_event(&self) -> Option<FileEvent> {
        loop {
            if let Some(event) = self.pop_pending() {
                return Some(event);
            }
            match self.rx.recv() {
                Ok(Ok(events)) => self.enqueue(events),
                Ok(Err(error)) => {
                    warn!(error = %error, "Watch error");
                }
                Err(_) => {
                    // Channel closed
                    return None;
                }
            }
        }
    }

    /// Try to get the next file event without blocking.
    ///
    /// Returns `None` if no event is immediately available.
    pub fn try_next_event(&self) -> Option<FileEvent> {
        if let Some(event) = self.pop_pending() {
            return Some(event);
        }
        match self.rx.try_recv() {
            Ok(Ok(events)) => {
                self.enqueue(events);
                self.pop_pending()
            }
            _ => None,
        }
    }

    /// Get the root directory being watched.
    pub fn root(&self) -> &Path {
        self.filter.root()
    }
}

/// Run a watch loop, calling `on_event` for each file event.
///
/// Handler errors are logged and the loop continues. Returns when the
/// watcher stops.
pub fn watch_and_rebuild<F, E>(watcher: &FileWatcher, mut on_event: F)
where
    F: FnMut(FileEvent) -> std::result::Result<(), E>,
    E: Display,
{
    while let Some(event) = watcher.next_event() {
        let path = event.path().to_path_buf();
        if let Err(e) = on_event(event) {
            warn!(path = %path.display(), error = %e, "Error handling file event");
        }
    }
}
