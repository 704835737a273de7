//! The adaptive scheduler: at most one ready task per request.
//!
//! Candidates pass the hard eligibility rules first; the soft score only
//! orders tasks that are already safe to hand out. The scheduler is pure:
//! callers serialize requests per board and mark the returned task as
//! claimed before the next request.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::eligibility::{Blocker, EligibilityRules};
use super::preferences::PreferenceStore;
use super::scoring::{ScoreBreakdown, Scorer};
use crate::config::SchedulerConfig;
use crate::core::task::Priority;
use crate::core::{Task, TaskId};
use crate::error::Result;
use crate::keywords::KeywordTable;
use crate::{mlog_debug, mlog_trace};

/// An eligible candidate with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTask {
    pub task: Task,
    pub score: ScoreBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedTask {
    pub task_id: TaskId,
    pub name: String,
    pub blocked_by: Vec<Blocker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyTask {
    pub task_id: TaskId,
    pub name: String,
    pub priority: Priority,
}

/// Why nothing (or what) can be handed out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockingAnalysis {
    /// Ineligible Todo tasks with their blockers, in board order.
    pub blocked: Vec<BlockedTask>,
    /// Eligible Todo tasks, priority descending, board order within a
    /// priority.
    pub ready: Vec<ReadyTask>,
}

#[derive(Debug, Clone)]
pub struct AdaptiveScheduler {
    config: SchedulerConfig,
    rules: EligibilityRules,
}

impl AdaptiveScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let rules = EligibilityRules::new(config.related_overlap);
        Self { config, rules }
    }

    /// Scheduler over a substitute scheduling keyword table.
    pub fn with_table(config: SchedulerConfig, table: &KeywordTable) -> Result<Self> {
        let rules = EligibilityRules::with_table(config.related_overlap, table)?;
        Ok(Self { config, rules })
    }

    pub fn rules(&self) -> &EligibilityRules {
        &self.rules
    }

    /// Eligible candidates for the agent, best first.
    ///
    /// Candidates are Todo, unassigned and not currently claimed. Equal
    /// scores keep board order.
    pub fn rank(
        &self,
        agent_id: &str,
        agent_skills: &[String],
        tasks: &[Task],
        current_assignments: &[TaskId],
        preferences: &PreferenceStore,
    ) -> Vec<RankedTask> {
        let claimed: HashSet<&TaskId> = current_assignments.iter().collect();
        let view = self.rules.view(tasks);
        let scorer = Scorer::new(self.config.clone(), preferences);

        let mut ranked: Vec<RankedTask> = tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_todo() && t.assigned_to.is_none() && !claimed.contains(&t.id))
            .filter(|&(i, t)| {
                let eligible = self.rules.is_eligible(&view, i);
                if !eligible {
                    mlog_trace!("[scheduler] {} not eligible", t.id.short());
                }
                eligible
            })
            .filter_map(|(i, t)| {
                let score = scorer.score(agent_id, agent_skills, &view, i)?;
                Some(RankedTask {
                    task: t.clone(),
                    score,
                })
            })
            .collect();

        // Stable: ties keep board order.
        ranked.sort_by(|a, b| b.score.total.total_cmp(&a.score.total));
        ranked
    }

    /// The single best eligible task for the agent, if any.
    pub fn next_task(
        &self,
        agent_id: &str,
        agent_skills: &[String],
        tasks: &[Task],
        current_assignments: &[TaskId],
        preferences: &PreferenceStore,
    ) -> Option<Task> {
        let best = self
            .rank(agent_id, agent_skills, tasks, current_assignments, preferences)
            .into_iter()
            .next();
        match &best {
            Some(ranked) => mlog_debug!(
                "[scheduler] {} -> {} ({:.3}: skill={:.2} priority={:.2} unblocking={:.2} preference={:.2})",
                agent_id,
                ranked.task.id.short(),
                ranked.score.total,
                ranked.score.skill,
                ranked.score.priority,
                ranked.score.unblocking,
                ranked.score.preference
            ),
            None => mlog_debug!("[scheduler] nothing eligible for {}", agent_id),
        }
        best.map(|ranked| ranked.task)
    }

    /// Blockers of every ineligible Todo task, and every ready Todo task.
    pub fn blocking_analysis(&self, tasks: &[Task]) -> BlockingAnalysis {
        let view = self.rules.view(tasks);
        let mut analysis = BlockingAnalysis::default();

        for (i, task) in tasks.iter().enumerate() {
            if !task.is_todo() {
                continue;
            }
            let blockers = self.rules.blockers(&view, i);
            if blockers.is_empty() {
                analysis.ready.push(ReadyTask {
                    task_id: task.id.clone(),
                    name: task.name.clone(),
                    priority: task.priority,
                });
            } else {
                analysis.blocked.push(BlockedTask {
                    task_id: task.id.clone(),
                    name: task.name.clone(),
                    blocked_by: blockers,
                });
            }
        }

        analysis.ready.sort_by(|a, b| b.priority.cmp(&a.priority));
        analysis
    }
}

impl Default for AdaptiveScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
