//! Single-task execution with buffered output capture.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::runner::{TaskResult, TaskStatus};
use crate::task::Task;

/// Executes one task's action as a `sh -c` child process and captures its
/// output. Aggregate tasks (no command) complete immediately.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    workdir: PathBuf,
}

impl TaskExecutor {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Runs the task's command to completion.
    ///
    /// A non-zero exit status is a `Failed` outcome, not an `Err`; `Err` is
    /// reserved for being unable to invoke the action at all.
    pub fn execute(&self, task: &Task) -> Result<TaskResult> {
        let Some(command) = task.command.as_deref() else {
            return Ok(TaskResult {
                task_name: task.name.clone(),
                status: TaskStatus::Done,
                stdout: String::new(),
                stderr: String::new(),
                duration: Duration::ZERO,
            });
        };

        let start = Instant::now();
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::TaskFailed {
                task: task.name.clone(),
                message: format!("failed to execute command: {}", e),
            })?;

        let status = if output.status.success() {
            TaskStatus::Done
        } else {
            TaskStatus::Failed
        };

        Ok(TaskResult {
            task_name: task.name.clone(),
            status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        })
    }
}
