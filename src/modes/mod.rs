//! Orchestration modes, their handlers, and the registry holding the
//! active one.

pub mod handler;
pub mod registry;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use handler::{Activity, AdaptiveHandler, AgentHandouts, CreatorHandler, ModeHandler};
pub use registry::{ModeInfo, ModeRegistry, ModeSuggestion, RegistrySnapshot, SwitchOutcome, SwitchRecord};

/// Global operating strategy of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationMode {
    /// Generate a project plan from a template or description.
    Creator,
    /// Organize an existing messy board. Declared, not implemented.
    Enricher,
    /// Hand ready tasks to agents.
    Adaptive,
}

impl OrchestrationMode {
    /// Every mode, in the fixed order used for alternatives.
    pub const ALL: [OrchestrationMode; 3] = [
        OrchestrationMode::Creator,
        OrchestrationMode::Enricher,
        OrchestrationMode::Adaptive,
    ];

    pub fn is_implemented(&self) -> bool {
        !matches!(self, OrchestrationMode::Enricher)
    }

    /// A fresh handler for this mode, or None when the mode has no
    /// implementation.
    pub fn handler(&self) -> Option<Box<dyn ModeHandler>> {
        match self {
            OrchestrationMode::Creator => Some(Box::new(CreatorHandler::default())),
            OrchestrationMode::Adaptive => Some(Box::new(AdaptiveHandler::default())),
            OrchestrationMode::Enricher => None,
        }
    }

    /// Every other mode, in fixed order.
    pub fn alternatives(&self) -> Vec<OrchestrationMode> {
        Self::ALL.into_iter().filter(|m| m != self).collect()
    }
}

impl std::fmt::Display for OrchestrationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestrationMode::Creator => write!(f, "creator"),
            OrchestrationMode::Enricher => write!(f, "enricher"),
            OrchestrationMode::Adaptive => write!(f, "adaptive"),
        }
    }
}

impl std::str::FromStr for OrchestrationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "creator" => Ok(OrchestrationMode::Creator),
            "enricher" => Ok(OrchestrationMode::Enricher),
            "adaptive" => Ok(OrchestrationMode::Adaptive),
            other => Err(Error::InvalidArgument(format!("unknown mode '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternatives_keep_fixed_order() {
        assert_eq!(
            OrchestrationMode::Enricher.alternatives(),
            vec![OrchestrationMode::Creator, OrchestrationMode::Adaptive]
        );
        assert_eq!(
            OrchestrationMode::Adaptive.alternatives(),
            vec![OrchestrationMode::Creator, OrchestrationMode::Enricher]
        );
    }

    #[test]
    fn test_enricher_has_no_handler() {
        assert!(OrchestrationMode::Enricher.handler().is_none());
        assert!(!OrchestrationMode::Enricher.is_implemented());
        assert_eq!(
            OrchestrationMode::Creator.handler().map(|h| h.mode()),
            Some(OrchestrationMode::Creator)
        );
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(
            "Adaptive".parse::<OrchestrationMode>().unwrap(),
            OrchestrationMode::Adaptive
        );
        assert!("chaos".parse::<OrchestrationMode>().is_err());
        assert_eq!(OrchestrationMode::Creator.to_string(), "creator");
        assert_eq!(
            serde_json::to_string(&OrchestrationMode::Enricher).unwrap(),
            "\"enricher\""
        );
    }
}
