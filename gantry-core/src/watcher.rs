//! File watching and glob bindings for change-triggered runs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::Config as NotifyConfig;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::WatchRule;
use crate::error::{Error, Result};

/// Glob patterns bound to the task set they re-trigger.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    patterns: Vec<String>,
    tasks: Vec<String>,
    globs: GlobSet,
}

impl WatchBinding {
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if a glob does not parse.
    pub fn new(patterns: Vec<String>, tasks: Vec<String>) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = Glob::new(pattern).map_err(|e| Error::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        let globs = builder.build().map_err(|e| Error::InvalidPattern {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })?;

        Ok(Self {
            patterns,
            tasks,
            globs,
        })
    }

    pub fn from_rule(rule: &WatchRule) -> Result<Self> {
        Self::new(rule.patterns.clone(), rule.tasks.clone())
    }

    #[inline]
    pub fn matches(&self, path: &Path) -> bool {
        self.globs.is_match(path)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }
}

pub struct WatcherConfig {
    pub debounce_ms: u64,
    pub root: PathBuf,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            root: PathBuf::from("."),
        }
    }
}

/// Filesystem watcher over the project root.
///
/// Events are enqueued by the notify backend and drained by a single
/// consumer via [`next_event`](Self::next_event); the consumer loop owns
/// debouncing and run coalescing.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    receiver: std::sync::mpsc::Receiver<notify::Result<Event>>,
    bindings: Vec<WatchBinding>,
    root: PathBuf,
    config: WatcherConfig,
}

impl FileWatcher {
    pub fn new(config: WatcherConfig, bindings: Vec<WatchBinding>) -> Result<Self> {
        let (tx, rx) = std::sync::mpsc::channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::Watch(format!("failed to create watcher: {}", e)))?;

        // Matching happens against root-relative paths, but notify reports
        // absolute ones.
        let root = std::fs::canonicalize(&config.root).unwrap_or_else(|_| config.root.clone());

        let mut file_watcher = Self {
            watcher,
            receiver: rx,
            bindings,
            root,
            config,
        };

        file_watcher.watch_root()?;

        Ok(file_watcher)
    }

    fn watch_root(&mut self) -> Result<()> {
        self.watcher
            .watch(&self.config.root, RecursiveMode::Recursive)
            .map_err(|e| Error::Watch(format!("failed to watch directory: {}", e)))
    }

    pub fn debounce_ms(&self) -> u64 {
        self.config.debounce_ms
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    /// Non-blocking poll for the next filesystem event.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        match self.receiver.try_recv() {
            Ok(Ok(event)) => Ok(Some(event)),
            Ok(Err(e)) => Err(Error::Watch(format!("watcher error: {}", e))),
            Err(std::sync::mpsc::TryRecvError::Empty) => Ok(None),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                Err(Error::Watch("watcher channel disconnected".to_string()))
            }
        }
    }

    /// Blocks until a filesystem event arrives.
    pub fn wait_for_event(&mut self) -> Result<Event> {
        self.receiver
            .recv()
            .map_err(|_| Error::Watch("watcher channel disconnected".to_string()))?
            .map_err(|e| Error::Watch(format!("watcher error: {}", e)))
    }

    /// Maps an event's paths through the bindings and returns the union of
    /// task sets whose patterns match, together with the matching paths.
    pub fn triggered_tasks(&self, event: &Event) -> (HashSet<String>, Vec<PathBuf>) {
        let mut tasks = HashSet::new();
        let mut matched_paths = Vec::new();

        for path in &event.paths {
            let relative = path.strip_prefix(&self.root).unwrap_or(path.as_path());
            let mut matched = false;
            for binding in &self.bindings {
                if binding.matches(relative) {
                    tasks.extend(binding.tasks().iter().cloned());
                    matched = true;
                }
            }
            if matched {
                matched_paths.push(relative.to_path_buf());
            }
        }

        (tasks, matched_paths)
    }
}
