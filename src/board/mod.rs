//! Board analysis: task list in, structural health out.

pub mod analyzer;

pub use analyzer::{analyze, BoardAnalyzer, BoardState, TaskCounts, WorkflowPattern};
