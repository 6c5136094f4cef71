//! Streaming output utilities for task execution.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::error::{Error, Result};
use crate::task::Task;

/// A spawned task whose output is consumed line by line while it runs.
pub struct StreamingTask {
    child: Child,
    task_name: String,
}

impl StreamingTask {
    /// Spawns the task's command in `workdir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the task has no command or the child process
    /// cannot be spawned.
    pub fn spawn(task: &Task, workdir: &Path) -> Result<Self> {
        let command = task.command.as_deref().ok_or_else(|| Error::TaskFailed {
            task: task.name.clone(),
            message: "task has no command to stream".to_string(),
        })?;

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::TaskFailed {
                task: task.name.clone(),
                message: format!("failed to spawn task: {}", e),
            })?;

        Ok(Self {
            child,
            task_name: task.name.clone(),
        })
    }

    /// Forwards each output line to `on_line` (second argument is true for
    /// stderr lines) until both streams close, then reaps the child.
    ///
    /// Returns whether the child exited successfully.
    pub fn stream_output<F>(mut self, mut on_line: F) -> Result<bool>
    where
        F: FnMut(&str, bool),
    {
        let task_name = self.task_name.clone();
        let stdout = self.child.stdout.take().ok_or_else(|| Error::TaskFailed {
            task: task_name.clone(),
            message: "failed to capture stdout".to_string(),
        })?;
        let stderr = self.child.stderr.take().ok_or_else(|| Error::TaskFailed {
            task: task_name.clone(),
            message: "failed to capture stderr".to_string(),
        })?;

        // One reader thread per stream; lines funnel through a channel to
        // the caller's thread so `on_line` never runs concurrently.
        std::thread::scope(|scope| {
            let (tx, rx) = std::sync::mpsc::channel::<(String, bool)>();
            let tx_err = tx.clone();

            scope.spawn(move || {
                for line in BufReader::new(stdout).lines().map_while(|line| line.ok()) {
                    if tx.send((line, false)).is_err() {
                        break;
                    }
                }
            });
            scope.spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(|line| line.ok()) {
                    if tx_err.send((line, true)).is_err() {
                        break;
                    }
                }
            });

            for (line, is_stderr) in rx {
                let trimmed = line.trim_end();
                if !trimmed.is_empty() {
                    on_line(trimmed, is_stderr);
                }
            }
        });

        let status = self.child.wait().map_err(|e| Error::TaskFailed {
            task: task_name,
            message: format!("failed to wait for process: {}", e),
        })?;

        Ok(status.success())
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }
}
