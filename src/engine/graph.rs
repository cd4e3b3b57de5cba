// ABOUTME: Task dependency graph with cycle detection and topological ordering
// ABOUTME: Built per execution from a workflow's tasks; validates well-formedness up front

use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::{Direction, Graph};
use std::collections::HashMap;

use super::error::{ExecutionError, Result};
use crate::model::Workflow;

/// Transient adjacency structure over a workflow's tasks.
///
/// Owned by the executor for the duration of one run. Edges point from a
/// dependency to its dependent, so a topological order lists every task
/// after all of its dependencies.
#[derive(Debug)]
pub struct TaskGraph {
    graph: Graph<String, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl TaskGraph {
    pub fn from_workflow(workflow: &Workflow) -> Result<Self> {
        let mut graph = Graph::new();
        let mut indices = HashMap::new();

        for task_id in workflow.tasks.keys() {
            let node = graph.add_node(task_id.clone());
            indices.insert(task_id.clone(), node);
        }

        for (task_id, task) in &workflow.tasks {
            let task_node = indices[task_id];
            for dependency in &task.depends_on {
                let dep_node =
                    *indices
                        .get(dependency)
                        .ok_or_else(|| ExecutionError::UnknownDependency {
                            task: task_id.clone(),
                            dependency: dependency.clone(),
                        })?;
                graph.add_edge(dep_node, task_node, ());
            }
        }

        Ok(Self { graph, indices })
    }

    /// Compute a valid topological order, failing fast on cycles.
    ///
    /// The order validates well-formedness and provides the deterministic
    /// tie-break rank for dispatch; it does not dictate the run order, which
    /// is governed by readiness at execution time.
    pub fn execution_order(&self) -> Result<Vec<String>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            ExecutionError::CircularDependency {
                tasks: vec![self.graph[cycle.node_id()].clone()],
            }
        })?;

        Ok(sorted.into_iter().map(|n| self.graph[n].clone()).collect())
    }

    /// Rank of each task in the topological order (lower runs first among
    /// simultaneously-ready tasks).
    pub fn ranks(&self) -> Result<HashMap<String, usize>> {
        Ok(self
            .execution_order()?
            .into_iter()
            .enumerate()
            .map(|(rank, task_id)| (task_id, rank))
            .collect())
    }

    /// Direct dependencies of the given task.
    pub fn dependencies(&self, task_id: &str) -> Vec<String> {
        self.neighbors(task_id, Direction::Incoming)
    }

    /// Tasks directly depending on the given task.
    pub fn dependents(&self, task_id: &str) -> Vec<String> {
        self.neighbors(task_id, Direction::Outgoing)
    }

    fn neighbors(&self, task_id: &str, direction: Direction) -> Vec<String> {
        match self.indices.get(task_id) {
            Some(&node) => self
                .graph
                .neighbors_directed(node, direction)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
