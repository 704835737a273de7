//! Task data model shared by every component.
//!
//! Tasks arrive from the board as plain data, or are materialized by the
//! project generator. The core mutates them only through assignment and
//! progress calls; it never deletes one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Metadata key holding the phase name of a generated task.
pub const META_PHASE: &str = "phase";
/// Metadata key holding the phase order of a generated task.
pub const META_PHASE_ORDER: &str = "phase_order";

/// Opaque task identifier.
///
/// Board tasks keep whatever id the board assigned; generated tasks get
/// a UUID v4 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new unique task identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Return at most the first 8 characters for display.
    pub fn short(&self) -> String {
        self.0.chars().take(8).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Board status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Blocked,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "todo"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Done => write!(f, "done"),
            TaskStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// Task priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Number of distinct priority levels.
    pub const LEVELS: usize = 4;

    /// Scheduling weight of this priority.
    pub fn weight(&self) -> f64 {
        match self {
            Priority::Low => 0.2,
            Priority::Medium => 0.5,
            Priority::High => 0.8,
            Priority::Urgent => 1.0,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(Error::InvalidArgument(format!("unknown priority '{}'", other))),
        }
    }
}

/// A unit of work on the board.
///
/// Every field except `id` and `name` has a default so partially filled
/// board payloads still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Effort estimate in hours, never negative.
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Open map; generated tasks carry `phase` and `phase_order`.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Task {
    /// Create a Todo task with a fresh id.
    pub fn new(name: &str, description: &str) -> Self {
        Self::with_id(TaskId::new(), name, description)
    }

    /// Create a Todo task with a caller-chosen id.
    pub fn with_id(id: impl Into<TaskId>, name: &str, description: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.to_string(),
            description: description.to_string(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            labels: Vec::new(),
            estimated_hours: 0.0,
            dependencies: Vec::new(),
            assigned_to: None,
            created_at: now,
            updated_at: now,
            metadata: BTreeMap::new(),
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for label in labels {
            self.add_label(label.as_ref());
        }
        self
    }

    pub fn estimate(mut self, hours: f64) -> Self {
        self.estimated_hours = hours.max(0.0);
        self
    }

    /// Builder form of [`Task::add_dependency`].
    pub fn depends_on(mut self, id: &TaskId) -> Result<Self> {
        self.add_dependency(id)?;
        Ok(self)
    }

    /// Add a label unless an equal one (ignoring case) is present.
    pub fn add_label(&mut self, label: &str) {
        let label = label.trim();
        if label.is_empty() {
            return;
        }
        if !self.labels.iter().any(|l| l.eq_ignore_ascii_case(label)) {
            self.labels.push(label.to_string());
        }
    }

    /// Add an explicit dependency.
    ///
    /// # Errors
    /// Returns `Error::Validation` when the task would depend on itself.
    pub fn add_dependency(&mut self, id: &TaskId) -> Result<()> {
        if *id == self.id {
            return Err(Error::Validation(format!(
                "Task {} cannot depend on itself",
                self.id
            )));
        }
        if !self.dependencies.contains(id) {
            self.dependencies.push(id.clone());
        }
        Ok(())
    }

    pub fn has_dependency(&self, id: &TaskId) -> bool {
        self.dependencies.contains(id)
    }

    /// Assign the task to an agent and move it to InProgress.
    pub fn assign(&mut self, agent_id: &str) {
        self.assigned_to = Some(agent_id.to_string());
        self.status = TaskStatus::InProgress;
        self.touch();
    }

    pub fn complete(&mut self) {
        self.status = TaskStatus::Done;
        self.touch();
    }

    pub fn block(&mut self) {
        self.status = TaskStatus::Blocked;
        self.touch();
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub fn is_todo(&self) -> bool {
        self.status == TaskStatus::Todo
    }

    /// Phase name recorded by the generator, if any.
    pub fn phase_name(&self) -> Option<&str> {
        self.metadata.get(META_PHASE).and_then(Value::as_str)
    }

    /// Phase order recorded by the generator, if any.
    pub fn phase_order(&self) -> Option<u32> {
        self.metadata
            .get(META_PHASE_ORDER)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }

    /// Lowercased name, description and labels joined for keyword matching.
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(
            self.name.len() + self.description.len() + self.labels.len() * 12 + 2,
        );
        text.push_str(&self.name);
        text.push(' ');
        text.push_str(&self.description);
        for label in &self.labels {
            text.push(' ');
            text.push_str(label);
        }
        text.to_lowercase()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
