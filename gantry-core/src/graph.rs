//! Task dependency graph management using petgraph.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{Error, Result};
use crate::registry::TaskRegistry;
use crate::task::Task;

/// Directed acyclic graph of task dependencies.
///
/// Edges point from a task to the tasks it depends on. Cycles and unknown
/// dependency names are rejected at construction, before any execution.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    tasks: HashMap<NodeIndex, Task>,
    cached_topological_order: Vec<String>,
    dependency_levels: Vec<Vec<String>>,
}

impl TaskGraph {
    /// Creates a dependency graph from a registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDependency`] if a task depends on a name that
    /// was never registered, or [`Error::CircularDependency`] if the
    /// dependency relation contains a cycle.
    pub fn new(registry: &TaskRegistry) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let mut tasks_map = HashMap::new();

        // Node insertion follows declaration order, so node indices double
        // as the deterministic tie-break when ordering independent tasks.
        for task in registry.tasks() {
            let node = graph.add_node(task.name.clone());
            node_map.insert(task.name.clone(), node);
            tasks_map.insert(node, task.clone());
        }

        for task in registry.tasks() {
            let from_node = node_map[&task.name];
            for dep_name in &task.deps {
                let to_node = node_map
                    .get(dep_name)
                    .ok_or_else(|| Error::UnknownDependency {
                        task: task.name.clone(),
                        dependency: dep_name.clone(),
                    })?;
                graph.add_edge(from_node, *to_node, ());
            }
        }

        toposort(&graph, None).map_err(|cycle| {
            let cycle_node = graph[cycle.node_id()].clone();
            Error::CircularDependency(format!("cycle involving task '{}'", cycle_node))
        })?;

        let topological_order = Self::stable_topological_order(&graph);
        let dependency_levels = Self::compute_dependency_levels(&graph, &topological_order);

        let topological_order = topological_order
            .into_iter()
            .map(|idx| graph[idx].clone())
            .collect();

        Ok(Self {
            graph,
            node_map,
            tasks: tasks_map,
            cached_topological_order: topological_order,
            dependency_levels,
        })
    }

    /// Kahn's algorithm, always picking the lowest-index ready node so that
    /// ties between independent tasks resolve by declaration order. Assumes
    /// acyclicity was already checked.
    fn stable_topological_order(graph: &DiGraph<String, ()>) -> Vec<NodeIndex> {
        let mut unmet: Vec<usize> = graph
            .node_indices()
            .map(|node| graph.neighbors_directed(node, Direction::Outgoing).count())
            .collect();
        let mut placed = vec![false; graph.node_count()];
        let mut order = Vec::with_capacity(graph.node_count());

        for _ in 0..graph.node_count() {
            let Some(next) = graph
                .node_indices()
                .find(|node| !placed[node.index()] && unmet[node.index()] == 0)
            else {
                break;
            };
            placed[next.index()] = true;
            for dependent in graph.neighbors_directed(next, Direction::Incoming) {
                unmet[dependent.index()] -= 1;
            }
            order.push(next);
        }

        order
    }

    fn compute_dependency_levels(
        graph: &DiGraph<String, ()>,
        order: &[NodeIndex],
    ) -> Vec<Vec<String>> {
        let mut levels: Vec<Vec<String>> = Vec::new();
        let mut level_map: HashMap<NodeIndex, usize> = HashMap::new();

        for &node in order {
            let level = graph
                .neighbors_directed(node, Direction::Outgoing)
                .filter_map(|dep| level_map.get(&dep))
                .max()
                .map(|l| l + 1)
                .unwrap_or(0);

            level_map.insert(node, level);
            while levels.len() <= level {
                levels.push(Vec::new());
            }
            levels[level].push(graph[node].clone());
        }

        levels
    }

    /// Retrieves a task by name.
    #[inline]
    pub fn get_task(&self, name: &str) -> Option<&Task> {
        self.node_map.get(name).and_then(|idx| self.tasks.get(idx))
    }

    /// Returns task names in topological order (dependencies before
    /// dependents, ties broken by declaration order).
    ///
    /// This is cached during graph construction for fast access.
    #[inline]
    pub fn topological_order(&self) -> &[String] {
        &self.cached_topological_order
    }

    /// Returns dependency levels for parallel execution.
    ///
    /// Each level contains tasks whose dependencies all sit in earlier
    /// levels, so members of one level can execute concurrently.
    #[inline]
    pub fn dependency_levels(&self) -> &[Vec<String>] {
        &self.dependency_levels
    }

    /// Returns direct dependencies of a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is not found in the graph.
    pub fn dependencies(&self, task_name: &str) -> Result<Vec<String>> {
        let node = self.resolve(task_name)?;
        Ok(self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|idx| self.graph[idx].clone())
            .collect())
    }

    /// Returns direct dependents of a task (tasks that depend on it).
    ///
    /// # Errors
    ///
    /// Returns an error if the task is not found in the graph.
    pub fn dependents(&self, task_name: &str) -> Result<Vec<String>> {
        let node = self.resolve(task_name)?;
        Ok(self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|idx| self.graph[idx].clone())
            .collect())
    }

    /// Returns the transitive dependency closure of the requested tasks:
    /// the tasks themselves plus everything reachable via dependency edges.
    ///
    /// # Errors
    ///
    /// Returns an error if any requested name is not found in the graph.
    pub fn closure(&self, task_names: &[String]) -> Result<HashSet<String>> {
        let mut result = HashSet::new();
        let mut stack = Vec::with_capacity(task_names.len());

        for name in task_names {
            self.resolve(name)?;
            stack.push(name.clone());
        }

        while let Some(current) = stack.pop() {
            if !result.insert(current.clone()) {
                continue;
            }
            for dep in self.dependencies(&current)? {
                if !result.contains(&dep) {
                    stack.push(dep);
                }
            }
        }

        Ok(result)
    }

    /// Returns all tasks in the graph.
    pub fn all_tasks(&self) -> Vec<&Task> {
        self.cached_topological_order
            .iter()
            .filter_map(|name| self.get_task(name))
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn resolve(&self, task_name: &str) -> Result<NodeIndex> {
        self.node_map
            .get(task_name)
            .copied()
            .ok_or_else(|| Error::TaskNotFound {
                name: task_name.to_string(),
                available: self.cached_topological_order.join(", "),
            })
    }
}
