//! The mode registry: the single holder of cross-call mutable state.
//!
//! One mutex guards the whole registry. Every mutating entry point takes
//! it for the duration of the call, so a switch, an activity and an
//! outcome never interleave.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::handler::{Activity, ModeHandler};
use super::OrchestrationMode;
use crate::adaptive::preferences::{Outcome, PreferenceStore};
use crate::board::BoardState;
use crate::clock::{Clock, SystemClock};
use crate::config::RegistryConfig;
use crate::core::Task;
use crate::error::{Error, Result};
use crate::{mlog, mlog_debug, mlog_warn};

/// One entry of the append-only switch log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchRecord {
    pub from: OrchestrationMode,
    pub to: OrchestrationMode,
    pub reason: Option<String>,
    pub actor: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Result of a successful `switch_mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchOutcome {
    pub success: bool,
    pub previous: OrchestrationMode,
    pub current: OrchestrationMode,
    pub reason: Option<String>,
}

/// Description of the active mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeInfo {
    pub mode: OrchestrationMode,
    pub capabilities: Vec<String>,
    pub switch_count: usize,
    pub status: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSuggestion {
    pub mode: OrchestrationMode,
    pub reason: String,
}

/// Serializable form of the registry, for drivers that persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub current: OrchestrationMode,
    #[serde(default)]
    pub blobs: BTreeMap<OrchestrationMode, Value>,
    #[serde(default)]
    pub log: Vec<SwitchRecord>,
    #[serde(default)]
    pub last_switch: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preferences: PreferenceStore,
}

struct Inner {
    current: OrchestrationMode,
    handler: Box<dyn ModeHandler>,
    blobs: BTreeMap<OrchestrationMode, Value>,
    log: Vec<SwitchRecord>,
    last_switch: Option<DateTime<Utc>>,
    preferences: PreferenceStore,
}

pub struct ModeRegistry {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
}

fn unimplemented(mode: OrchestrationMode) -> Error {
    Error::UnimplementedMode(format!("{} mode has no handler", mode))
}

impl ModeRegistry {
    /// Registry starting in the configured mode, on the wall clock.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// # Errors
    /// Returns `Error::UnimplementedMode` if the initial mode has no handler.
    pub fn with_clock(config: &RegistryConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let handler = config
            .initial_mode
            .handler()
            .ok_or_else(|| unimplemented(config.initial_mode))?;
        Ok(Self {
            inner: Mutex::new(Inner {
                current: config.initial_mode,
                handler,
                blobs: BTreeMap::new(),
                log: Vec::new(),
                last_switch: None,
                preferences: PreferenceStore::new(),
            }),
            clock,
            cooldown: Duration::seconds(config.suggest_cooldown_secs),
        })
    }

    /// Rebuild a registry from a snapshot.
    ///
    /// The snapshot's blob for its current mode becomes the live handler
    /// state.
    pub fn from_snapshot(
        snapshot: RegistrySnapshot,
        config: &RegistryConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let RegistrySnapshot {
            current,
            mut blobs,
            log,
            last_switch,
            preferences,
        } = snapshot;
        let mut handler = current.handler().ok_or_else(|| unimplemented(current))?;
        let blob = blobs.remove(&current).unwrap_or(Value::Null);
        handler.restore_state(&blob)?;
        Ok(Self {
            inner: Mutex::new(Inner {
                current,
                handler,
                blobs,
                log,
                last_switch,
                preferences,
            }),
            clock,
            cooldown: Duration::seconds(config.suggest_cooldown_secs),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            mlog_warn!("[registry] lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Make `target` the active mode.
    ///
    /// The outgoing handler's state is stored, a log entry is appended and
    /// the target's stored state (empty if none) is restored. Switching to
    /// the active mode succeeds without logging.
    ///
    /// # Errors
    /// Returns `Error::UnimplementedMode` for a mode without a handler; the
    /// registry is left untouched.
    pub fn switch_mode(
        &self,
        target: OrchestrationMode,
        reason: Option<&str>,
        actor: Option<&str>,
    ) -> Result<SwitchOutcome> {
        let mut inner = self.lock();
        let previous = inner.current;

        if target == previous {
            mlog_debug!("[registry] switch to active mode {} ignored", target);
            return Ok(SwitchOutcome {
                success: true,
                previous,
                current: target,
                reason: reason.map(str::to_string),
            });
        }

        let mut incoming = target.handler().ok_or_else(|| unimplemented(target))?;
        let outgoing_state = inner.handler.serialize_state()?;
        let stored = inner.blobs.get(&target).cloned().unwrap_or(Value::Null);
        incoming.restore_state(&stored)?;

        let now = self.clock.now();
        inner.blobs.insert(previous, outgoing_state);
        inner.blobs.remove(&target);
        inner.log.push(SwitchRecord {
            from: previous,
            to: target,
            reason: reason.map(str::to_string),
            actor: actor.map(str::to_string),
            timestamp: now,
        });
        inner.current = target;
        inner.handler = incoming;
        inner.last_switch = Some(now);

        mlog!(
            "[registry] switched {} -> {} (actor={}, reason={})",
            previous,
            target,
            actor.unwrap_or("-"),
            reason.unwrap_or("-")
        );
        Ok(SwitchOutcome {
            success: true,
            previous,
            current: target,
            reason: reason.map(str::to_string),
        })
    }

    pub fn current(&self) -> OrchestrationMode {
        self.lock().current
    }

    pub fn current_mode(&self) -> ModeInfo {
        let inner = self.lock();
        ModeInfo {
            mode: inner.current,
            capabilities: inner
                .handler
                .capabilities()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            switch_count: inner.log.len(),
            status: inner.handler.status(),
        }
    }

    /// Suggest a switch the board calls for.
    ///
    /// Nothing is suggested within the cooldown after the last switch, or
    /// when the board points at the active or an unimplemented mode.
    pub fn suggest_switch(&self, board: &BoardState) -> Option<ModeSuggestion> {
        let inner = self.lock();
        if let Some(last) = inner.last_switch {
            if self.clock.now() - last < self.cooldown {
                mlog_debug!("[registry] suggestion suppressed by cooldown");
                return None;
            }
        }

        let (mode, reason) = if board.is_empty {
            (OrchestrationMode::Creator, "board is empty".to_string())
        } else if board.is_chaotic {
            (
                OrchestrationMode::Enricher,
                format!("board structure score {:.2} is chaotic", board.structure_score),
            )
        } else if board.is_well_structured {
            (
                OrchestrationMode::Adaptive,
                format!(
                    "board structure score {:.2} is well structured",
                    board.structure_score
                ),
            )
        } else {
            return None;
        };

        if mode == inner.current || !mode.is_implemented() {
            return None;
        }
        Some(ModeSuggestion { mode, reason })
    }

    pub fn switch_history(&self) -> Vec<SwitchRecord> {
        self.lock().log.clone()
    }

    /// Forward an activity to the active handler.
    ///
    /// Returns false when the activity belongs to an inactive mode.
    pub fn record_activity(&self, activity: &Activity) -> bool {
        let mut inner = self.lock();
        if activity.mode() != inner.current {
            return false;
        }
        let now = self.clock.now();
        inner.handler.record_activity(activity, now);
        true
    }

    pub fn record_outcome(&self, agent_id: &str, task: &Task, outcome: Outcome) {
        let mut inner = self.lock();
        inner.preferences.record(agent_id, task, outcome);
        mlog_debug!(
            "[registry] outcome {} for agent {} on task {}",
            outcome,
            agent_id,
            task.id.short()
        );
    }

    /// Copy of the learned agent preferences.
    pub fn preferences(&self) -> PreferenceStore {
        self.lock().preferences.clone()
    }

    pub fn snapshot(&self) -> Result<RegistrySnapshot> {
        let inner = self.lock();
        let mut blobs = inner.blobs.clone();
        blobs.insert(inner.current, inner.handler.serialize_state()?);
        Ok(RegistrySnapshot {
            current: inner.current,
            blobs,
            log: inner.log.clone(),
            last_switch: inner.last_switch,
            preferences: inner.preferences.clone(),
        })
    }
}

impl std::fmt::Debug for ModeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ModeRegistry")
            .field("current", &inner.current)
            .field("switches", &inner.log.len())
            .finish()
    }
}
