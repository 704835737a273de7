//! Soft multi-factor scoring of eligible tasks.

use serde::{Deserialize, Serialize};

use super::eligibility::BoardView;
use super::preferences::PreferenceStore;
use crate::config::SchedulerConfig;
use crate::core::Task;
use crate::keywords::words;

/// Skill groups; any term of a group counts for every other term in it.
pub const SKILL_SYNONYMS: &[&[&str]] = &[
    &["backend", "api", "server", "endpoint", "endpoints", "service", "services", "rest", "graphql"],
    &["frontend", "front-end", "ui", "react", "vue", "angular", "css", "html", "page", "pages"],
    &["database", "db", "sql", "postgres", "postgresql", "mysql", "schema", "migration", "migrations"],
    &["devops", "infrastructure", "infra", "docker", "kubernetes", "ci", "pipeline", "hosting"],
    &["testing", "test", "tests", "qa", "e2e"],
    &["mobile", "ios", "android", "swift", "kotlin", "flutter"],
    &["security", "auth", "authentication", "authorization", "tls", "permissions"],
    &["design", "ux", "wireframes", "mockups"],
    &["documentation", "docs", "readme", "guide"],
];

/// Per-factor breakdown of a task's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill: f64,
    pub priority: f64,
    pub unblocking: f64,
    pub preference: f64,
    pub total: f64,
}

/// Terms that satisfy `skill`: itself plus every group member.
fn skill_terms(skill: &str) -> Vec<&str> {
    let mut terms = vec![skill];
    for group in SKILL_SYNONYMS {
        if group.iter().any(|term| term.eq_ignore_ascii_case(skill)) {
            terms.extend(group.iter().copied());
        }
    }
    terms
}

/// Whether the word sequence of `phrase` appears in `haystack`.
fn contains_phrase(haystack: &[String], phrase: &str) -> bool {
    let needle = words(phrase);
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle.as_slice())
}

/// Fraction of `skills` found in the task's name, description or labels.
pub fn skill_match(skills: &[String], task: &Task) -> f64 {
    let skills: Vec<&str> = skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if skills.is_empty() {
        return 0.0;
    }
    let text = words(&task.searchable_text());
    let matched = skills
        .iter()
        .filter(|skill| {
            skill_terms(skill)
                .into_iter()
                .any(|term| contains_phrase(&text, term))
        })
        .count();
    matched as f64 / skills.len() as f64
}

/// Fraction of the other unfinished tasks that explicitly depend on the
/// task at `index`.
pub fn unblocking_value(view: &BoardView<'_>, index: usize) -> f64 {
    let Some(task) = view.tasks().get(index) else {
        return 0.0;
    };
    let (waiting, unfinished) = view
        .unfinished_others(index)
        .fold((0usize, 0usize), |(waiting, total), other| {
            (waiting + usize::from(other.has_dependency(&task.id)), total + 1)
        });
    if unfinished == 0 {
        0.0
    } else {
        waiting as f64 / unfinished as f64
    }
}

/// Weighted scorer for one agent.
#[derive(Debug, Clone)]
pub struct Scorer<'p> {
    weights: SchedulerConfig,
    preferences: &'p PreferenceStore,
}

impl<'p> Scorer<'p> {
    pub fn new(weights: SchedulerConfig, preferences: &'p PreferenceStore) -> Self {
        Self {
            weights,
            preferences,
        }
    }

    pub fn score(
        &self,
        agent_id: &str,
        skills: &[String],
        view: &BoardView<'_>,
        index: usize,
    ) -> Option<ScoreBreakdown> {
        let task = view.tasks().get(index)?;
        let skill = skill_match(skills, task);
        let priority = task.priority.weight();
        let unblocking = unblocking_value(view, index);
        let preference = self.preferences.preference(agent_id, task);
        let w = &self.weights;
        Some(ScoreBreakdown {
            skill,
            priority,
            unblocking,
            preference,
            total: w.skill_weight * skill
                + w.priority_weight * priority
                + w.unblocking_weight * unblocking
                + w.preference_weight * preference,
        })
    }
}
