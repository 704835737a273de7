//! Task graph used while materializing generated projects.
//!
//! The graph is an arena: every task is inserted first and indexed by the
//! template name that produced it, then edges are resolved by lookup.
//! Nothing is resolved while inserting.

use crate::core::task::{Task, TaskId};
use crate::error::{Error, Result};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Directed graph of tasks; an edge `a -> b` means `b` depends on `a`.
pub struct TaskGraph {
    graph: DiGraph<Task, ()>,
    /// Index mapping from TaskId to NodeIndex for fast lookups.
    task_index: HashMap<TaskId, NodeIndex>,
    /// Index mapping from template name to NodeIndex for edge resolution.
    name_index: HashMap<String, NodeIndex>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            task_index: HashMap::new(),
            name_index: HashMap::new(),
        }
    }

    /// Insert a task under `key` (its template name).
    ///
    /// # Errors
    /// Returns an error if `key` or the task id is already present.
    pub fn insert(&mut self, key: &str, task: Task) -> Result<NodeIndex> {
        if self.name_index.contains_key(key) {
            return Err(Error::InvalidTemplate(format!(
                "duplicate task template name '{}'",
                key
            )));
        }
        if self.task_index.contains_key(&task.id) {
            return Err(Error::Validation(format!(
                "Task {} already in graph",
                task.id
            )));
        }

        let id = task.id.clone();
        let index = self.graph.add_node(task);
        self.task_index.insert(id, index);
        self.name_index.insert(key.to_string(), index);
        Ok(index)
    }

    /// Look up a node by the template name it was inserted under.
    pub fn lookup(&self, key: &str) -> Option<NodeIndex> {
        self.name_index.get(key).copied()
    }

    pub fn get_task(&self, id: &TaskId) -> Option<&Task> {
        self.task_index
            .get(id)
            .and_then(|&index| self.graph.node_weight(index))
    }

    pub fn task_at(&self, index: NodeIndex) -> Option<&Task> {
        self.graph.node_weight(index)
    }

    /// Record that `dependent` depends on `prerequisite`.
    ///
    /// The edge is mirrored into the dependent task's `dependencies` list.
    /// Duplicate edges are ignored.
    ///
    /// # Errors
    /// Returns an error for unknown nodes or a self-dependency.
    pub fn add_dependency(&mut self, prerequisite: NodeIndex, dependent: NodeIndex) -> Result<()> {
        if prerequisite == dependent {
            return Err(Error::InvalidTemplate(
                "task template depends on itself".to_string(),
            ));
        }
        let prerequisite_id = self
            .graph
            .node_weight(prerequisite)
            .map(|t| t.id.clone())
            .ok_or_else(|| Error::Validation("prerequisite not found in graph".to_string()))?;
        if self.graph.find_edge(prerequisite, dependent).is_some() {
            return Ok(());
        }
        let task = self
            .graph
            .node_weight_mut(dependent)
            .ok_or_else(|| Error::Validation("dependent not found in graph".to_string()))?;
        task.add_dependency(&prerequisite_id)?;
        self.graph.add_edge(prerequisite, dependent, ());
        Ok(())
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn has_dependency(&self, prerequisite: &TaskId, dependent: &TaskId) -> bool {
        match (self.task_index.get(prerequisite), self.task_index.get(dependent)) {
            (Some(&from), Some(&to)) => self.graph.find_edge(from, to).is_some(),
            _ => false,
        }
    }

    /// All edges as (prerequisite, dependent) pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&Task, &Task)> + '_ {
        self.graph.edge_references().filter_map(move |edge| {
            Some((
                self.graph.node_weight(edge.source())?,
                self.graph.node_weight(edge.target())?,
            ))
        })
    }

    /// Validate the graph before it leaves the generator.
    ///
    /// Every edge must point from an equal or earlier phase to a later
    /// one, and the graph must be acyclic.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplate` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        for (prerequisite, dependent) in self.edges() {
            let from = prerequisite.phase_order().unwrap_or(0);
            let to = dependent.phase_order().unwrap_or(0);
            if from > to {
                return Err(Error::InvalidTemplate(format!(
                    "'{}' (phase {}) cannot depend on '{}' (phase {})",
                    dependent.name, to, prerequisite.name, from
                )));
            }
        }

        if is_cyclic_directed(&self.graph) {
            return Err(Error::InvalidTemplate(
                "dependency cycle between task templates".to_string(),
            ));
        }
        Ok(())
    }

    /// Consume the graph, yielding tasks in topological order.
    ///
    /// Among tasks whose prerequisites are all emitted, the one inserted
    /// earliest goes first, so the order is deterministic and follows
    /// template order wherever dependencies allow.
    ///
    /// # Errors
    /// Returns `Error::InvalidTemplate` if the graph contains a cycle.
    pub fn into_ordered_tasks(self) -> Result<Vec<Task>> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|i| self.graph.neighbors_directed(i, Direction::Incoming).count())
            .collect();

        let mut heap: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(i)) = heap.pop() {
            order.push(i);
            for next in self
                .graph
                .neighbors_directed(NodeIndex::new(i), Direction::Outgoing)
            {
                let slot = &mut in_degree[next.index()];
                *slot -= 1;
                if *slot == 0 {
                    heap.push(Reverse(next.index()));
                }
            }
        }

        if order.len() != self.graph.node_count() {
            return Err(Error::InvalidTemplate(
                "dependency cycle between task templates".to_string(),
            ));
        }

        let (nodes, _) = self.graph.into_nodes_edges();
        let mut slots: Vec<Option<Task>> = nodes.into_iter().map(|n| Some(n.weight)).collect();
        Ok(order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect())
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}
