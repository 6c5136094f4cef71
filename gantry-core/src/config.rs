//! TOML manifest parsing for task definitions.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::registry::TaskRegistry;
use crate::task::Task;

/// A task declaration in `gantry.toml`.
///
/// The simple form is a bare command string:
///
/// ```toml
/// [tasks]
/// clean = "rm -rf dist build"
/// ```
///
/// The detailed form adds dependencies; omitting `command` declares an
/// aggregate task that only sequences its dependencies:
///
/// ```toml
/// [tasks]
/// scss = { command = "sass src/scss/main.scss dist/css/styles.css", depends_on = ["scss-lint"] }
/// styles = { depends_on = ["html", "scss"] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskValue {
    Simple(String),
    Detailed {
        command: Option<String>,
        #[serde(default)]
        depends_on: Vec<String>,
        description: Option<String>,
    },
}

/// A watch binding: glob patterns associated with the tasks to re-run
/// when a matching path changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchRule {
    pub patterns: Vec<String>,
    pub tasks: Vec<String>,
}

/// Runner settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Default cap on tasks executing concurrently within a level.
    pub default_parallel: Option<usize>,
    /// Quiet window before a watch-triggered run, in milliseconds.
    pub debounce_ms: Option<u64>,
}

/// Project manifest as defined in `gantry.toml`.
///
/// Task declaration order is preserved; it is the tie-break for scheduling
/// independent tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub tasks: IndexMap<String, TaskValue>,
    #[serde(default)]
    pub watch: Vec<WatchRule>,
    #[serde(default)]
    pub settings: Settings,
}

impl Manifest {
    /// Loads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ManifestNotFound`] if the file does not exist, or a
    /// TOML error with the file path as context if it does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ManifestNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        toml::from_str(&raw).map_err(|error| Error::Toml {
            error,
            context: path.display().to_string(),
        })
    }

    /// Converts task declarations into [`Task`]s, in declaration order.
    pub fn to_tasks(&self) -> Vec<Task> {
        self.tasks
            .iter()
            .map(|(name, task_value)| match task_value {
                TaskValue::Simple(command) => Task::new(name.clone(), command.clone(), Vec::new()),
                TaskValue::Detailed {
                    command,
                    depends_on,
                    description,
                } => {
                    let mut task = match command {
                        Some(command) => {
                            Task::new(name.clone(), command.clone(), depends_on.clone())
                        }
                        None => Task::aggregate(name.clone(), depends_on.clone()),
                    };
                    if let Some(description) = description {
                        task = task.with_description(description.clone());
                    }
                    task
                }
            })
            .collect()
    }

    /// Builds a registry from the manifest's task declarations.
    pub fn to_registry(&self) -> Result<TaskRegistry> {
        let mut registry = TaskRegistry::new();
        for task in self.to_tasks() {
            registry.register(task)?;
        }
        Ok(registry)
    }
}
