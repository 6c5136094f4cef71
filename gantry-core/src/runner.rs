//! Task execution engine and per-invocation state machine.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::executor::TaskExecutor;
use crate::graph::TaskGraph;
use crate::streaming::StreamingTask;
use crate::task::Task;

/// State of one task within one invocation of [`TaskRunner::run`].
///
/// `Done`, `Failed` and `Skipped` are terminal; a task never leaves a
/// terminal state within an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Failed,
    /// The task's action was never invoked because a dependency failed
    /// (or the run was cancelled before the task started).
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Done | TaskStatus::Failed | TaskStatus::Skipped
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one task within a run.
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// Name of the task.
    pub task_name: String,
    /// Terminal status the task reached.
    pub status: TaskStatus,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Wall-clock time the action took.
    pub duration: Duration,
}

impl TaskResult {
    fn skipped(task_name: &str) -> Self {
        Self {
            task_name: task_name.to_string(),
            status: TaskStatus::Skipped,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
        }
    }

    fn failure(task_name: &str, message: String, duration: Duration) -> Self {
        Self {
            task_name: task_name.to_string(),
            status: TaskStatus::Failed,
            stdout: String::new(),
            stderr: message,
            duration,
        }
    }
}

/// Every task outcome of one invocation, in level order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<TaskResult>,
}

impl RunReport {
    /// True if every task in the closure reached `done`.
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.status == TaskStatus::Done)
    }

    /// The first task whose action reported failure, if any.
    pub fn first_failure(&self) -> Option<&TaskResult> {
        self.results.iter().find(|r| r.status == TaskStatus::Failed)
    }

    /// Tasks that were never run because a dependency failed.
    pub fn skipped(&self) -> impl Iterator<Item = &TaskResult> {
        self.results
            .iter()
            .filter(|r| r.status == TaskStatus::Skipped)
    }

    /// Converts a failed report into [`Error::TaskFailed`] for `?`-style
    /// propagation.
    pub fn check(&self) -> Result<()> {
        match self.first_failure() {
            Some(failed) => {
                let message = if failed.stderr.trim().is_empty() {
                    "command exited with a non-zero status".to_string()
                } else {
                    failed.stderr.trim().to_string()
                };
                Err(Error::TaskFailed {
                    task: failed.task_name.clone(),
                    message,
                })
            }
            None => Ok(()),
        }
    }
}

enum WorkerMsg {
    Line {
        task: String,
        line: String,
        stderr: bool,
    },
    Finished(TaskResult),
}

/// Executes tasks respecting dependency order.
///
/// The registry and graph are immutable during a run; per-invocation state
/// lives on the driver thread (the caller of [`run`](Self::run)), which is
/// the only writer of task statuses. Workers execute actions and report
/// results over a channel.
pub struct TaskRunner {
    workdir: PathBuf,
    graph: TaskGraph,
    max_parallel: Option<usize>,
    cancel: Option<Arc<AtomicBool>>,
    thread_pool: Arc<rayon::ThreadPool>,
    executor: TaskExecutor,
}

impl TaskRunner {
    pub fn new(workdir: impl Into<PathBuf>, graph: TaskGraph) -> Self {
        let workdir = workdir.into();
        let executor = TaskExecutor::new(workdir.clone());

        Self {
            workdir,
            graph,
            max_parallel: None,
            cancel: None,
            thread_pool: Arc::new(Self::build_pool(None)),
            executor,
        }
    }

    fn build_pool(num_threads: Option<usize>) -> rayon::ThreadPool {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("gantry-worker-{}", i));
        if let Some(n) = num_threads {
            builder = builder.num_threads(n);
        }
        builder
            .build()
            .unwrap_or_else(|_| rayon::ThreadPoolBuilder::new().build().unwrap())
    }

    /// Caps the number of tasks executing concurrently within a level.
    pub fn with_max_parallel(mut self, max_parallel: Option<usize>) -> Self {
        self.max_parallel = max_parallel;
        self.thread_pool = Arc::new(Self::build_pool(self.max_parallel));
        self
    }

    /// Installs a cancellation flag, checked between levels. Tasks not yet
    /// started when the flag flips are reported as skipped.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Runs the requested tasks and their transitive dependency closure.
    ///
    /// Output is captured per task. An empty request succeeds trivially
    /// with no actions executed. Task failures are recorded in the report,
    /// not returned as `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] if a requested name is not
    /// registered.
    pub fn run(&self, task_names: &[String]) -> Result<RunReport> {
        self.run_levels(task_names, None)
    }

    /// Like [`run`](Self::run), but forwards each output line to `on_line`
    /// (task name, line, is-stderr) while actions execute. Lines from
    /// concurrent tasks are serialized through the driver thread, so the
    /// callback never runs concurrently with itself.
    pub fn run_with_output<F>(&self, task_names: &[String], on_line: F) -> Result<RunReport>
    where
        F: Fn(&str, &str, bool) + Sync,
    {
        self.run_levels(task_names, Some(&on_line))
    }

    fn run_levels(
        &self,
        task_names: &[String],
        on_line: Option<&(dyn Fn(&str, &str, bool) + Sync)>,
    ) -> Result<RunReport> {
        if task_names.is_empty() {
            return Ok(RunReport::default());
        }

        let closure = self.graph.closure(task_names)?;
        let mut statuses: HashMap<String, TaskStatus> = closure
            .iter()
            .map(|name| (name.clone(), TaskStatus::Pending))
            .collect();
        let mut report = RunReport::default();
        let mut cancelled = false;

        for level in self.graph.dependency_levels() {
            let level_tasks: Vec<&Task> = level
                .iter()
                .filter(|name| closure.contains(name.as_str()))
                .filter_map(|name| self.graph.get_task(name))
                .collect();

            if level_tasks.is_empty() {
                continue;
            }

            if self.is_cancelled() {
                cancelled = true;
            }

            let mut runnable = Vec::with_capacity(level_tasks.len());
            for task in level_tasks {
                // Every dependency sits in an earlier level, so it is
                // terminal by the time its dependents are considered.
                let blocked = task
                    .deps
                    .iter()
                    .any(|dep| statuses.get(dep.as_str()) != Some(&TaskStatus::Done));
                if cancelled || blocked {
                    statuses.insert(task.name.clone(), TaskStatus::Skipped);
                    report.results.push(TaskResult::skipped(&task.name));
                } else {
                    statuses.insert(task.name.clone(), TaskStatus::Running);
                    runnable.push(task);
                }
            }

            if runnable.is_empty() {
                continue;
            }

            let mut level_results = match on_line {
                None => self.execute_level(&runnable),
                Some(cb) => self.execute_level_streaming(&runnable, cb),
            };

            level_results
                .sort_by_key(|r| runnable.iter().position(|t| t.name == r.task_name));
            for result in level_results {
                statuses.insert(result.task_name.clone(), result.status);
                report.results.push(result);
            }
        }

        Ok(report)
    }

    fn execute_level(&self, tasks: &[&Task]) -> Vec<TaskResult> {
        let (tx, rx) = channel::unbounded();
        let executor = &self.executor;
        self.thread_pool.install(|| {
            tasks.par_iter().for_each(|task| {
                let result = executor.execute(task).unwrap_or_else(|e| {
                    TaskResult::failure(&task.name, e.to_string(), Duration::ZERO)
                });
                let _ = tx.send(result);
            });
        });
        drop(tx);

        rx.iter().collect()
    }

    fn execute_level_streaming(
        &self,
        tasks: &[&Task],
        on_line: &(dyn Fn(&str, &str, bool) + Sync),
    ) -> Vec<TaskResult> {
        let (tx, rx) = channel::unbounded();
        let mut results = Vec::with_capacity(tasks.len());

        std::thread::scope(|scope| {
            for &task in tasks {
                let tx = tx.clone();
                let workdir = &self.workdir;
                scope.spawn(move || {
                    let result = Self::run_streaming_task(task, workdir, &tx);
                    let _ = tx.send(WorkerMsg::Finished(result));
                });
            }
            drop(tx);

            for msg in rx {
                match msg {
                    WorkerMsg::Line { task, line, stderr } => on_line(&task, &line, stderr),
                    WorkerMsg::Finished(result) => results.push(result),
                }
            }
        });

        results
    }

    fn run_streaming_task(
        task: &Task,
        workdir: &Path,
        tx: &channel::Sender<WorkerMsg>,
    ) -> TaskResult {
        if !task.has_action() {
            return TaskResult {
                task_name: task.name.clone(),
                status: TaskStatus::Done,
                stdout: String::new(),
                stderr: String::new(),
                duration: Duration::ZERO,
            };
        }

        let start = Instant::now();
        let streaming = match StreamingTask::spawn(task, workdir) {
            Ok(streaming) => streaming,
            Err(e) => return TaskResult::failure(&task.name, e.to_string(), start.elapsed()),
        };

        let mut stdout_buf = String::new();
        let mut stderr_buf = String::new();
        let outcome = streaming.stream_output(|line, is_stderr| {
            if is_stderr {
                stderr_buf.push_str(line);
                stderr_buf.push('\n');
            } else {
                stdout_buf.push_str(line);
                stdout_buf.push('\n');
            }
            let _ = tx.send(WorkerMsg::Line {
                task: task.name.clone(),
                line: line.to_string(),
                stderr: is_stderr,
            });
        });

        match outcome {
            Ok(success) => TaskResult {
                task_name: task.name.clone(),
                status: if success {
                    TaskStatus::Done
                } else {
                    TaskStatus::Failed
                },
                stdout: stdout_buf,
                stderr: stderr_buf,
                duration: start.elapsed(),
            },
            Err(e) => TaskResult::failure(&task.name, e.to_string(), start.elapsed()),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::SeqCst))
    }
}
