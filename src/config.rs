use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::modes::OrchestrationMode;
use crate::{mlog_debug, Error, Result};

/// Board analyzer thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Boards scoring below this are chaotic.
    pub chaotic_threshold: f64,
    /// Boards scoring at or above this are well structured.
    pub well_structured_threshold: f64,
    /// A description counts once its trimmed length exceeds this.
    pub substantial_description_chars: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            chaotic_threshold: 0.3,
            well_structured_threshold: 0.7,
            substantial_description_chars: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Entries kept per user in the rolling history.
    pub history_limit: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { history_limit: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub initial_mode: OrchestrationMode,
    /// No switch is suggested this soon after the last one.
    pub suggest_cooldown_secs: i64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_mode: OrchestrationMode::Adaptive,
            suggest_cooldown_secs: 300,
        }
    }
}

/// Scoring weights and the relatedness ratio used by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub skill_weight: f64,
    pub priority_weight: f64,
    pub unblocking_weight: f64,
    pub preference_weight: f64,
    /// Share of the smaller token set two tasks must have in common.
    pub related_overlap: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            skill_weight: 0.4,
            priority_weight: 0.3,
            unblocking_weight: 0.2,
            preference_weight: 0.1,
            related_overlap: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Config {
    pub fn maestro_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".maestro"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::maestro_dir()?.join("maestro.toml"))
    }

    pub fn state_path() -> Result<PathBuf> {
        Ok(Self::maestro_dir()?.join("state.json"))
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        mlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            mlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        mlog_debug!(
            "Config loaded: initial_mode={}, cooldown={}s, history_limit={}",
            config.registry.initial_mode,
            config.registry.suggest_cooldown_secs,
            config.detector.history_limit
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                mlog_debug!("Creating config directory: {}", parent.display());
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        mlog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    /// Reject values the components cannot work with.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` naming the offending key.
    pub fn validate(&self) -> Result<()> {
        let a = &self.analyzer;
        if !(0.0..=1.0).contains(&a.chaotic_threshold)
            || !(0.0..=1.0).contains(&a.well_structured_threshold)
        {
            return Err(Error::InvalidArgument(
                "analyzer thresholds must lie in [0, 1]".to_string(),
            ));
        }
        if a.chaotic_threshold > a.well_structured_threshold {
            return Err(Error::InvalidArgument(
                "analyzer.chaotic_threshold exceeds analyzer.well_structured_threshold"
                    .to_string(),
            ));
        }
        if self.detector.history_limit == 0 {
            return Err(Error::InvalidArgument(
                "detector.history_limit must be at least 1".to_string(),
            ));
        }
        if self.registry.suggest_cooldown_secs < 0 {
            return Err(Error::InvalidArgument(
                "registry.suggest_cooldown_secs cannot be negative".to_string(),
            ));
        }
        if !self.registry.initial_mode.is_implemented() {
            return Err(Error::InvalidArgument(format!(
                "registry.initial_mode '{}' is not implemented",
                self.registry.initial_mode
            )));
        }
        let s = &self.scheduler;
        let weights = [
            s.skill_weight,
            s.priority_weight,
            s.unblocking_weight,
            s.preference_weight,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err(Error::InvalidArgument(
                "scheduler weights cannot be negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&s.related_overlap) {
            return Err(Error::InvalidArgument(
                "scheduler.related_overlap must lie in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}
