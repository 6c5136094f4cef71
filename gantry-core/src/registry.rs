//! Declaration-ordered task registry.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::task::Task;

/// Mapping from task name to [`Task`], preserving declaration order.
///
/// Declaration order is the deterministic tie-break used when scheduling
/// tasks that have no dependency relationship. Registering a name twice is
/// rejected rather than overwriting.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: IndexMap<String, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task to the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTask`] if a task with the same name is
    /// already registered.
    pub fn register(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.name) {
            return Err(Error::DuplicateTask(task.name));
        }
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Task names in declaration order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Comma-separated task names, for error messages.
    pub fn available(&self) -> String {
        self.tasks.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
