//! Mode recommendation from board state, intent text and recent history.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use crate::board::{BoardAnalyzer, BoardState};
use crate::config::DetectorConfig;
use crate::core::Task;
use crate::error::Result;
use crate::keywords::{KeywordMatcher, KeywordTable, INTENTS};
use crate::modes::OrchestrationMode;
use crate::mlog_debug;

const INTENT_CONFIDENCE: f64 = 0.90;
const EMPTY_CONFIDENCE: f64 = 0.95;
const CHAOTIC_CONFIDENCE: f64 = 0.85;
const STRUCTURED_CONFIDENCE: f64 = 0.90;
const DEFAULT_CONFIDENCE: f64 = 0.70;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeRecommendation {
    pub mode: OrchestrationMode,
    /// In [0, 1].
    pub confidence: f64,
    pub reasoning: String,
    /// Every other mode, in fixed order.
    pub alternatives: Vec<OrchestrationMode>,
    /// Intent family the message matched, if any.
    pub intent: Option<String>,
}

impl ModeRecommendation {
    fn new(mode: OrchestrationMode, confidence: f64, reasoning: String) -> Self {
        Self {
            mode,
            confidence,
            reasoning,
            alternatives: mode.alternatives(),
            intent: None,
        }
    }
}

fn intent_mode(family: &str) -> Option<OrchestrationMode> {
    match family {
        "create" => Some(OrchestrationMode::Creator),
        "organize" => Some(OrchestrationMode::Enricher),
        "coordinate" => Some(OrchestrationMode::Adaptive),
        _ => None,
    }
}

pub struct ContextDetector {
    analyzer: BoardAnalyzer,
    intents: KeywordMatcher,
    history_limit: usize,
    history: Mutex<HashMap<String, VecDeque<OrchestrationMode>>>,
}

impl ContextDetector {
    pub fn new(analyzer: BoardAnalyzer, config: &DetectorConfig) -> Self {
        Self {
            analyzer,
            intents: INTENTS.clone(),
            history_limit: config.history_limit.max(1),
            history: Mutex::new(HashMap::new()),
        }
    }

    /// Detector classifying intent against a substitute table.
    ///
    /// Families named `create`, `organize` and `coordinate` map to modes;
    /// other family names are ignored.
    pub fn with_intents(
        analyzer: BoardAnalyzer,
        config: &DetectorConfig,
        intents: &KeywordTable,
    ) -> Result<Self> {
        let mut detector = Self::new(analyzer, config);
        detector.intents = KeywordMatcher::new(intents)?;
        Ok(detector)
    }

    pub fn analyzer(&self) -> &BoardAnalyzer {
        &self.analyzer
    }

    /// Recommend a mode for `user_id`.
    ///
    /// An intent in the message decides on its own. Otherwise the board
    /// decides. The output depends only on the inputs and the user's
    /// recorded history.
    pub fn recommend(
        &self,
        user_id: &str,
        tasks: &[Task],
        recent_message: Option<&str>,
    ) -> ModeRecommendation {
        let mut recommendation = match recent_message.and_then(|m| self.classify_intent(m)) {
            Some((family, mode)) => {
                let mut rec = ModeRecommendation::new(
                    mode,
                    INTENT_CONFIDENCE,
                    format!("Message expresses a '{}' intent", family),
                );
                rec.intent = Some(family.to_string());
                rec
            }
            None => Self::from_board(&self.analyzer.analyze(tasks)),
        };

        let recent = self.history(user_id);
        if !recent.is_empty() {
            let modes: Vec<String> = recent.iter().map(|m| m.to_string()).collect();
            recommendation
                .reasoning
                .push_str(&format!(" (recent modes: {})", modes.join(", ")));
        }

        mlog_debug!(
            "[detector] user={} mode={} confidence={:.2}",
            user_id,
            recommendation.mode,
            recommendation.confidence
        );
        recommendation
    }

    fn classify_intent(&self, message: &str) -> Option<(&'static str, OrchestrationMode)> {
        self.intents
            .matches(message)
            .into_iter()
            .find_map(|family| intent_mode(family).map(|mode| (family, mode)))
    }

    fn from_board(board: &BoardState) -> ModeRecommendation {
        if board.is_empty {
            ModeRecommendation::new(
                OrchestrationMode::Creator,
                EMPTY_CONFIDENCE,
                "Board is empty; start by generating a project".to_string(),
            )
        } else if board.is_chaotic {
            ModeRecommendation::new(
                OrchestrationMode::Enricher,
                CHAOTIC_CONFIDENCE,
                format!(
                    "Board structure score {:.2} is chaotic; tasks need organizing",
                    board.structure_score
                ),
            )
        } else if board.is_well_structured {
            ModeRecommendation::new(
                OrchestrationMode::Adaptive,
                STRUCTURED_CONFIDENCE,
                format!(
                    "Board structure score {:.2} is well structured; coordinate agents on it",
                    board.structure_score
                ),
            )
        } else {
            ModeRecommendation::new(
                board.recommended_mode,
                DEFAULT_CONFIDENCE,
                format!(
                    "Board has {} tasks with structure score {:.2}",
                    board.task_count(),
                    board.structure_score
                ),
            )
        }
    }

    /// Append a mode to the user's rolling history, dropping the oldest
    /// entry past the limit.
    pub fn record_switch(&self, user_id: &str, mode: OrchestrationMode) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        let entries = history.entry(user_id.to_string()).or_default();
        entries.push_back(mode);
        while entries.len() > self.history_limit {
            entries.pop_front();
        }
    }

    /// Recorded modes for `user_id`, oldest first.
    pub fn history(&self, user_id: &str) -> Vec<OrchestrationMode> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(user_id)
            .map(|entries| entries.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every user's history, oldest first, for persisting between runs.
    pub fn history_snapshot(&self) -> BTreeMap<String, Vec<OrchestrationMode>> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(user, entries)| (user.clone(), entries.iter().copied().collect()))
            .collect()
    }

    /// Replace all histories, keeping the newest entries within the limit.
    pub fn restore_history(&self, snapshot: BTreeMap<String, Vec<OrchestrationMode>>) {
        let restored = snapshot
            .into_iter()
            .map(|(user, modes)| {
                let skip = modes.len().saturating_sub(self.history_limit);
                (user, modes.into_iter().skip(skip).collect())
            })
            .collect();
        *self.history.lock().unwrap_or_else(|e| e.into_inner()) = restored;
    }
}

impl std::fmt::Debug for ContextDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextDetector")
            .field("intents", &self.intents.table_name())
            .field("history_limit", &self.history_limit)
            .finish()
    }
}
