//! Structural health analysis of a task board.
//!
//! The analyzer is a pure function of the task list: the same tasks always
//! produce the same [`BoardState`], and missing task fields simply count as
//! absent.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::AnalyzerConfig;
use crate::core::{Task, TaskStatus};
use crate::core::task::Priority;
use crate::error::Result;
use crate::keywords::{KeywordMatcher, KeywordTable, COMPONENTS, PHASES};
use crate::modes::OrchestrationMode;
use crate::mlog_trace;

const WEIGHT_DESCRIPTIONS: f64 = 0.25;
const WEIGHT_LABELS: f64 = 0.20;
const WEIGHT_ESTIMATES: f64 = 0.25;
const WEIGHT_DEPENDENCIES: f64 = 0.15;
const WEIGHT_PRIORITY_DIVERSITY: f64 = 0.15;

/// How work flows across the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPattern {
    /// Empty board; nothing to classify.
    Unknown,
    AdHoc,
    /// One task in flight on a board of more than five.
    Sequential,
    /// More than three tasks in flight.
    Parallel,
    /// Three or more recognizable phases.
    Phased,
}

impl std::fmt::Display for WorkflowPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowPattern::Unknown => write!(f, "unknown"),
            WorkflowPattern::AdHoc => write!(f, "ad_hoc"),
            WorkflowPattern::Sequential => write!(f, "sequential"),
            WorkflowPattern::Parallel => write!(f, "parallel"),
            WorkflowPattern::Phased => write!(f, "phased"),
        }
    }
}

/// Per-category task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    pub blocked: usize,
    pub with_descriptions: usize,
    pub with_labels: usize,
    pub with_estimates: usize,
    pub with_dependencies: usize,
    pub distinct_priorities: usize,
}

/// Snapshot of board health, recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    pub counts: TaskCounts,
    /// Weighted structure score in [0, 1].
    pub structure_score: f64,
    pub workflow_pattern: WorkflowPattern,
    /// Detected phase families, in phase order.
    pub phases: Vec<String>,
    /// Detected component families, in table order.
    pub components: Vec<String>,
    pub is_empty: bool,
    pub is_chaotic: bool,
    pub is_well_structured: bool,
    /// Advisory default; explicit user intent overrides it.
    pub recommended_mode: OrchestrationMode,
}

impl BoardState {
    /// The canonical state of an empty board.
    pub fn empty() -> Self {
        Self {
            counts: TaskCounts::default(),
            structure_score: 0.0,
            workflow_pattern: WorkflowPattern::Unknown,
            phases: Vec::new(),
            components: Vec::new(),
            is_empty: true,
            is_chaotic: false,
            is_well_structured: false,
            recommended_mode: OrchestrationMode::Creator,
        }
    }

    pub fn task_count(&self) -> usize {
        self.counts.total
    }
}

/// Computes [`BoardState`] from a task list.
#[derive(Debug, Clone)]
pub struct BoardAnalyzer {
    config: AnalyzerConfig,
    phases: KeywordMatcher,
    components: KeywordMatcher,
}

impl BoardAnalyzer {
    /// Analyzer with default thresholds and the built-in keyword tables.
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            config,
            phases: PHASES.clone(),
            components: COMPONENTS.clone(),
        }
    }

    /// Analyzer with substitute keyword tables.
    ///
    /// # Errors
    /// Returns an error if either table fails to compile.
    pub fn with_tables(
        config: AnalyzerConfig,
        phases: &KeywordTable,
        components: &KeywordTable,
    ) -> Result<Self> {
        Ok(Self {
            config,
            phases: KeywordMatcher::new(phases)?,
            components: KeywordMatcher::new(components)?,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze the board.
    pub fn analyze(&self, tasks: &[Task]) -> BoardState {
        if tasks.is_empty() {
            return BoardState::empty();
        }

        let counts = self.count(tasks);
        let (phases, components) = self.detect_families(tasks);
        let structure_score = structure_score(&counts);
        let workflow_pattern = workflow_pattern(&counts, phases.len());

        let is_chaotic = structure_score < self.config.chaotic_threshold;
        let is_well_structured = structure_score >= self.config.well_structured_threshold;
        let recommended_mode = default_mode(counts.total, is_chaotic, is_well_structured);

        BoardState {
            counts,
            structure_score,
            workflow_pattern,
            phases,
            components,
            is_empty: false,
            is_chaotic,
            is_well_structured,
            recommended_mode,
        }
    }

    fn count(&self, tasks: &[Task]) -> TaskCounts {
        let mut counts = TaskCounts {
            total: tasks.len(),
            ..TaskCounts::default()
        };
        let mut priorities: HashSet<Priority> = HashSet::new();

        for task in tasks {
            match task.status {
                TaskStatus::Todo => counts.todo += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Done => counts.done += 1,
                TaskStatus::Blocked => counts.blocked += 1,
            }
            if task.description.trim().chars().count() > self.config.substantial_description_chars
            {
                counts.with_descriptions += 1;
            }
            if task.labels.len() >= 2 {
                counts.with_labels += 1;
            }
            if task.estimated_hours > 0.0 {
                counts.with_estimates += 1;
            }
            if !task.dependencies.is_empty() {
                counts.with_dependencies += 1;
            }
            priorities.insert(task.priority);
        }

        counts.distinct_priorities = priorities.len();
        counts
    }

    fn detect_families(&self, tasks: &[Task]) -> (Vec<String>, Vec<String>) {
        let mut phase_hits: HashSet<&'static str> = HashSet::new();
        let mut component_hits: HashSet<&'static str> = HashSet::new();

        for task in tasks {
            let text = task.searchable_text();
            let phases = self.phases.matches(&text);
            let components = self.components.matches(&text);
            mlog_trace!(
                "[analyzer] task {} phases={:?} components={:?}",
                task.id.short(),
                phases,
                components
            );
            phase_hits.extend(phases);
            component_hits.extend(components);
        }

        // Report in table order so output is deterministic.
        let phases = self
            .phases
            .family_names()
            .filter(|name| phase_hits.contains(name))
            .map(str::to_string)
            .collect();
        let components = self
            .components
            .family_names()
            .filter(|name| component_hits.contains(name))
            .map(str::to_string)
            .collect();
        (phases, components)
    }
}

impl Default for BoardAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze with the default analyzer.
pub fn analyze(tasks: &[Task]) -> BoardState {
    BoardAnalyzer::new().analyze(tasks)
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn structure_score(counts: &TaskCounts) -> f64 {
    let score = WEIGHT_DESCRIPTIONS * ratio(counts.with_descriptions, counts.total)
        + WEIGHT_LABELS * ratio(counts.with_labels, counts.total)
        + WEIGHT_ESTIMATES * ratio(counts.with_estimates, counts.total)
        + WEIGHT_DEPENDENCIES * ratio(counts.with_dependencies, counts.total)
        + WEIGHT_PRIORITY_DIVERSITY * ratio(counts.distinct_priorities, Priority::LEVELS);
    score.clamp(0.0, 1.0)
}

fn workflow_pattern(counts: &TaskCounts, phase_count: usize) -> WorkflowPattern {
    match counts.in_progress {
        0 => WorkflowPattern::AdHoc,
        1 if counts.total > 5 => WorkflowPattern::Sequential,
        n if n > 3 => WorkflowPattern::Parallel,
        _ if phase_count >= 3 => WorkflowPattern::Phased,
        _ => WorkflowPattern::AdHoc,
    }
}

fn default_mode(total: usize, is_chaotic: bool, is_well_structured: bool) -> OrchestrationMode {
    if total == 0 {
        OrchestrationMode::Creator
    } else if is_chaotic && total > 10 {
        OrchestrationMode::Enricher
    } else if is_well_structured {
        OrchestrationMode::Adaptive
    } else if total < 5 {
        OrchestrationMode::Creator
    } else {
        OrchestrationMode::Enricher
    }
}
