//! Per-mode handlers.
//!
//! The set is closed: [`OrchestrationMode::handler`] picks the handler for
//! a mode. Handler state round-trips through an opaque JSON blob the
//! registry stores while the mode is inactive.
//!
//! [`OrchestrationMode::handler`]: super::OrchestrationMode::handler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};

use super::OrchestrationMode;
use crate::core::TaskId;
use crate::error::Result;

/// Something a mode did that its handler keeps track of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activity {
    ProjectGenerated {
        project: String,
        template: String,
        task_count: usize,
    },
    TaskHandedOut {
        agent_id: String,
        task_id: TaskId,
    },
}

impl Activity {
    /// Mode whose handler tracks this activity.
    pub fn mode(&self) -> OrchestrationMode {
        match self {
            Activity::ProjectGenerated { .. } => OrchestrationMode::Creator,
            Activity::TaskHandedOut { .. } => OrchestrationMode::Adaptive,
        }
    }
}

pub trait ModeHandler: Send {
    fn mode(&self) -> OrchestrationMode;

    /// Serialize handler state for the registry's blob store.
    fn serialize_state(&self) -> Result<Value>;

    /// Replace handler state from a stored blob; `Value::Null` resets it.
    fn restore_state(&mut self, state: &Value) -> Result<()>;

    fn status(&self) -> Value;

    fn capabilities(&self) -> &'static [&'static str];

    /// Activities for other modes are ignored.
    fn record_activity(&mut self, activity: &Activity, at: DateTime<Utc>);
}

fn restore<T: Default + for<'de> Deserialize<'de>>(state: &Value) -> Result<T> {
    if state.is_null() {
        Ok(T::default())
    } else {
        Ok(serde_json::from_value(state.clone())?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project: String,
    pub template: String,
    pub task_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Records kept per handler list; older ones only survive as counts.
pub const RECENT_LIMIT: usize = 20;

fn push_recent<T>(list: &mut VecDeque<T>, item: T) {
    if list.len() == RECENT_LIMIT {
        list.pop_front();
    }
    list.push_back(item);
}

/// Tracks projects generated while Creator is active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatorHandler {
    generated: usize,
    /// Oldest first.
    projects: VecDeque<ProjectRecord>,
}

impl CreatorHandler {
    pub fn projects(&self) -> &VecDeque<ProjectRecord> {
        &self.projects
    }

    pub fn generated(&self) -> usize {
        self.generated
    }
}

impl ModeHandler for CreatorHandler {
    fn mode(&self) -> OrchestrationMode {
        OrchestrationMode::Creator
    }

    fn serialize_state(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn restore_state(&mut self, state: &Value) -> Result<()> {
        *self = restore(state)?;
        Ok(())
    }

    fn status(&self) -> Value {
        json!({
            "projects_generated": self.generated,
            "last_project": self.projects.back().map(|p| p.project.clone()),
        })
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &["generate_project", "list_templates", "infer_template"]
    }

    fn record_activity(&mut self, activity: &Activity, at: DateTime<Utc>) {
        if let Activity::ProjectGenerated {
            project,
            template,
            task_count,
        } = activity
        {
            self.generated += 1;
            push_recent(
                &mut self.projects,
                ProjectRecord {
                    project: project.clone(),
                    template: template.clone(),
                    task_count: *task_count,
                    generated_at: at,
                },
            );
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentHandouts {
    pub count: usize,
    /// Oldest first.
    pub recent: VecDeque<TaskId>,
}

/// Tracks task hand-outs per agent while Adaptive is active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveHandler {
    handouts: BTreeMap<String, AgentHandouts>,
    last_handout: Option<DateTime<Utc>>,
}

impl AdaptiveHandler {
    pub fn handouts_for(&self, agent_id: &str) -> Option<&AgentHandouts> {
        self.handouts.get(agent_id)
    }

    pub fn total_handouts(&self) -> usize {
        self.handouts.values().map(|h| h.count).sum()
    }
}

impl ModeHandler for AdaptiveHandler {
    fn mode(&self) -> OrchestrationMode {
        OrchestrationMode::Adaptive
    }

    fn serialize_state(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn restore_state(&mut self, state: &Value) -> Result<()> {
        *self = restore(state)?;
        Ok(())
    }

    fn status(&self) -> Value {
        let per_agent: BTreeMap<&str, usize> = self
            .handouts
            .iter()
            .map(|(agent, handouts)| (agent.as_str(), handouts.count))
            .collect();
        json!({
            "total_handouts": self.total_handouts(),
            "handouts_per_agent": per_agent,
            "last_handout": self.last_handout,
        })
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &["next_task", "blocking_analysis", "record_outcome"]
    }

    fn record_activity(&mut self, activity: &Activity, at: DateTime<Utc>) {
        if let Activity::TaskHandedOut { agent_id, task_id } = activity {
            let handouts = self.handouts.entry(agent_id.clone()).or_default();
            handouts.count += 1;
            push_recent(&mut handouts.recent, task_id.clone());
            self.last_handout = Some(at);
        }
    }
}
