//! The coordinator: one entry point over every component.
//!
//! Operations that can fail return [`Response`] values rather than
//! errors, so a driving loop can forward them to agents without ever
//! panicking.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::adaptive::{AdaptiveScheduler, BlockingAnalysis, Outcome};
use crate::board::{BoardAnalyzer, BoardState};
use crate::clock::{Clock, SystemClock};
use crate::collaborators::Advisor;
use crate::config::Config;
use crate::context::{ContextDetector, ModeRecommendation};
use crate::core::{Task, TaskId};
use crate::creator::{GeneratedProject, ProjectGenerator, ProjectRequest, ProjectSize, TemplateInfo};
use crate::error::{Error, ErrorKind, Result};
use crate::modes::{
    Activity, ModeInfo, ModeRegistry, ModeSuggestion, OrchestrationMode, RegistrySnapshot,
    SwitchOutcome,
};
use crate::{mlog_error, mlog_warn};

/// Structured failure, serialized as `{success: false, kind, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub success: bool,
    pub kind: ErrorKind,
    pub error: String,
}

impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        Self {
            success: false,
            kind: err.kind(),
            error: err.to_string(),
        }
    }
}

/// Either the success payload or a [`Failure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response<T> {
    Success(T),
    Failure(Failure),
}

impl<T> Response<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Response::Success(value) => Some(value),
            Response::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Response::Success(_) => None,
            Response::Failure(failure) => Some(failure),
        }
    }
}

impl<T> From<Result<T>> for Response<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Response::Success(value),
            Err(err) => {
                mlog_error!("{}", err);
                Response::Failure(Failure::from(&err))
            }
        }
    }
}

/// What a driver persists between runs: the registry and every user's
/// recent modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub registry: RegistrySnapshot,
    #[serde(default)]
    pub user_history: BTreeMap<String, Vec<OrchestrationMode>>,
}

pub struct Coordinator {
    analyzer: BoardAnalyzer,
    detector: ContextDetector,
    registry: ModeRegistry,
    generator: ProjectGenerator,
    scheduler: AdaptiveScheduler,
    advisor: Option<Box<dyn Advisor>>,
}

impl Coordinator {
    /// Coordinator on the wall clock with a fresh registry.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let registry = ModeRegistry::with_clock(&config.registry, clock)?;
        Self::with_registry(config, registry)
    }

    /// Coordinator around an existing registry, e.g. one restored from a
    /// snapshot.
    pub fn with_registry(config: &Config, registry: ModeRegistry) -> Result<Self> {
        config.validate()?;
        let analyzer = BoardAnalyzer::with_config(config.analyzer.clone());
        Ok(Self {
            detector: ContextDetector::new(analyzer.clone(), &config.detector),
            analyzer,
            registry,
            generator: ProjectGenerator::new(),
            scheduler: AdaptiveScheduler::new(config.scheduler.clone()),
            advisor: None,
        })
    }

    /// Coordinator restored from a [`SessionSnapshot`].
    pub fn from_snapshot(
        config: &Config,
        snapshot: SessionSnapshot,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let registry = ModeRegistry::from_snapshot(snapshot.registry, &config.registry, clock)?;
        let coordinator = Self::with_registry(config, registry)?;
        coordinator.detector.restore_history(snapshot.user_history);
        Ok(coordinator)
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        Ok(SessionSnapshot {
            registry: self.registry.snapshot()?,
            user_history: self.detector.history_snapshot(),
        })
    }

    pub fn with_advisor(mut self, advisor: Box<dyn Advisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn with_generator(mut self, generator: ProjectGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn registry(&self) -> &ModeRegistry {
        &self.registry
    }

    pub fn detector(&self) -> &ContextDetector {
        &self.detector
    }

    pub fn analyze_board(&self, tasks: &[Task]) -> BoardState {
        self.analyzer.analyze(tasks)
    }

    pub fn recommend_mode(
        &self,
        user_id: &str,
        tasks: &[Task],
        recent_message: Option<&str>,
    ) -> ModeRecommendation {
        self.detector.recommend(user_id, tasks, recent_message)
    }

    /// Switch modes; a successful change is also recorded in the actor's
    /// history.
    pub fn switch_mode(
        &self,
        target: OrchestrationMode,
        reason: Option<&str>,
        actor: Option<&str>,
    ) -> Response<SwitchOutcome> {
        let result = self.registry.switch_mode(target, reason, actor);
        if let (Ok(outcome), Some(actor)) = (&result, actor) {
            if outcome.previous != outcome.current {
                self.detector.record_switch(actor, outcome.current);
            }
        }
        result.into()
    }

    pub fn current_mode(&self) -> ModeInfo {
        self.registry.current_mode()
    }

    pub fn suggest_switch(&self, tasks: &[Task]) -> Option<ModeSuggestion> {
        self.registry.suggest_switch(&self.analyze_board(tasks))
    }

    pub fn templates(&self) -> Vec<TemplateInfo> {
        self.generator.templates()
    }

    /// Generate a project from loosely typed arguments.
    ///
    /// `size` parses case-insensitively; anything unrecognized fails with
    /// `invalid_argument`.
    pub fn generate_project(
        &self,
        template_or_description: &str,
        project_name: &str,
        size: Option<&str>,
        excluded_phases: &[String],
        extra_labels: &[String],
    ) -> Response<GeneratedProject> {
        let request = size
            .map(str::parse::<ProjectSize>)
            .transpose()
            .map(|size| ProjectRequest {
                input: template_or_description.to_string(),
                project_name: project_name.to_string(),
                size,
                excluded_phases: excluded_phases.to_vec(),
                extra_labels: extra_labels.to_vec(),
            });
        request.and_then(|request| self.generate(&request)).into()
    }

    /// Generate a project, letting the advisor rewrite free text first.
    ///
    /// Advisor output is generated like any other input; if it fails, the
    /// original input is used.
    pub fn generate(&self, request: &ProjectRequest) -> Result<GeneratedProject> {
        let project = match self.advised(request) {
            Some(advised) => match self.generator.generate(&advised) {
                Ok(project) => Ok(project),
                Err(err) => {
                    mlog_warn!("Advisor output rejected ({}), using original input", err);
                    self.generator.generate(request)
                }
            },
            None => self.generator.generate(request),
        }?;

        self.registry.record_activity(&Activity::ProjectGenerated {
            project: project.project_name.clone(),
            template: project.template.clone(),
            task_count: project.task_count(),
        });
        Ok(project)
    }

    fn advised(&self, request: &ProjectRequest) -> Option<ProjectRequest> {
        let advisor = self.advisor.as_ref()?;
        let input = request.input.trim();
        if self.generator.find(input).is_some() || !input.contains(char::is_whitespace) {
            return None;
        }
        match advisor.enrich_description(input) {
            Ok(enriched) if !enriched.trim().is_empty() && enriched.trim() != input => {
                Some(ProjectRequest {
                    input: enriched,
                    ..request.clone()
                })
            }
            Ok(_) => None,
            Err(err) => {
                mlog_warn!("Advisor failed: {}", err);
                None
            }
        }
    }

    /// The best eligible task for the agent, recorded as a hand-out.
    pub fn next_task(
        &self,
        agent_id: &str,
        agent_skills: &[String],
        tasks: &[Task],
        current_assignments: &[TaskId],
    ) -> Option<Task> {
        let preferences = self.registry.preferences();
        let task = self.scheduler.next_task(
            agent_id,
            agent_skills,
            tasks,
            current_assignments,
            &preferences,
        )?;
        self.registry.record_activity(&Activity::TaskHandedOut {
            agent_id: agent_id.to_string(),
            task_id: task.id.clone(),
        });
        Some(task)
    }

    pub fn blocking_analysis(&self, tasks: &[Task]) -> BlockingAnalysis {
        self.scheduler.blocking_analysis(tasks)
    }

    pub fn record_outcome(&self, agent_id: &str, task: &Task, outcome: Outcome) {
        self.registry.record_outcome(agent_id, task, outcome);
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("registry", &self.registry)
            .field("advisor", &self.advisor.is_some())
            .finish()
    }
}
