//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error in {context}: {error}")]
    Toml {
        error: toml::de::Error,
        context: String,
    },

    #[error("Duplicate task: {0}. Task names must be unique.")]
    DuplicateTask(String),

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("Circular dependency detected: {0}. Use 'gantry graph' to visualize the task graph.")]
    CircularDependency(String),

    #[error("Task not found: {name}. Available tasks: {available}")]
    TaskNotFound { name: String, available: String },

    #[error("Task '{task}' failed: {message}")]
    TaskFailed { task: String, message: String },

    #[error("Invalid watch pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Manifest not found: {0}. Expected 'gantry.toml' in the project root.")]
    ManifestNotFound(PathBuf),

    #[error("Watch error: {0}")]
    Watch(String),
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Toml {
            error,
            context: "gantry.toml".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
