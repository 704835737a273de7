//! Core domain models: tasks and the generated task graph.

pub mod graph;
pub mod task;

pub use graph::TaskGraph;
pub use task::{Priority, Task, TaskId, TaskStatus, META_PHASE, META_PHASE_ORDER};
