//! Adaptive mode: hand each requesting agent the best task that is safe to
//! start.

pub mod eligibility;
pub mod preferences;
pub mod scheduler;
pub mod scoring;

pub use eligibility::{BlockReason, Blocker, EligibilityRules, Families, WorkRole};
pub use preferences::{Outcome, PreferenceStore, NEUTRAL_PREFERENCE};
pub use scheduler::{AdaptiveScheduler, BlockedTask, BlockingAnalysis, RankedTask, ReadyTask};
pub use scoring::{skill_match, ScoreBreakdown, SKILL_SYNONYMS};
