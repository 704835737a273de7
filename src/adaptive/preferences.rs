//! Soft per-agent label preferences learned from task outcomes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::Task;
use crate::error::{Error, Result};

/// Score of a label the agent has no history with.
pub const NEUTRAL_PREFERENCE: f64 = 0.5;

/// How an agent's work on a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Blocked,
    Abandoned,
}

impl Outcome {
    /// Adjustment applied to each of the task's labels.
    pub fn delta(&self) -> f64 {
        match self {
            Outcome::Completed => 0.1,
            Outcome::Blocked => -0.05,
            Outcome::Abandoned => -0.1,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::Blocked => write!(f, "blocked"),
            Outcome::Abandoned => write!(f, "abandoned"),
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "completed" | "done" => Ok(Outcome::Completed),
            "blocked" => Ok(Outcome::Blocked),
            "abandoned" => Ok(Outcome::Abandoned),
            other => Err(Error::InvalidArgument(format!("unknown outcome '{}'", other))),
        }
    }
}

/// Agent -> lowercased label -> score in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceStore {
    scores: BTreeMap<String, BTreeMap<String, f64>>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an outcome to every label of `task`.
    pub fn record(&mut self, agent_id: &str, task: &Task, outcome: Outcome) {
        let labels = self.scores.entry(agent_id.to_string()).or_default();
        for label in &task.labels {
            let score = labels
                .entry(label.to_lowercase())
                .or_insert(NEUTRAL_PREFERENCE);
            *score = (*score + outcome.delta()).clamp(0.0, 1.0);
        }
    }

    pub fn label_score(&self, agent_id: &str, label: &str) -> f64 {
        self.scores
            .get(agent_id)
            .and_then(|labels| labels.get(&label.to_lowercase()))
            .copied()
            .unwrap_or(NEUTRAL_PREFERENCE)
    }

    /// Mean label score of `task` for the agent; neutral without labels.
    pub fn preference(&self, agent_id: &str, task: &Task) -> f64 {
        if task.labels.is_empty() {
            return NEUTRAL_PREFERENCE;
        }
        let total: f64 = task
            .labels
            .iter()
            .map(|label| self.label_score(agent_id, label))
            .sum();
        total / task.labels.len() as f64
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
