//! Project generation: template or free text in, phase-ordered task graph out.
//!
//! Generation runs in two passes over a name-indexed arena. The first pass
//! materializes every included task, the second resolves dependency names.
//! Names that resolve to nothing (skipped, excluded or unknown templates)
//! are dropped with a warning. The finished graph is validated before
//! anything is returned, so generation is all-or-nothing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use super::templates::{Phase, ProjectSize, ProjectTemplate, TaskTemplate, TemplateInfo, BUILTIN_TEMPLATES};
use crate::core::{Task, TaskGraph, META_PHASE, META_PHASE_ORDER};
use crate::error::{Error, Result};
use crate::keywords::words;
use crate::{mlog, mlog_debug, mlog_warn};

/// Metadata key naming the template that produced a task.
pub const META_TEMPLATE: &str = "template";
/// Metadata key naming the project a task belongs to.
pub const META_PROJECT: &str = "project";
/// Metadata key holding the task template key.
pub const META_TEMPLATE_TASK: &str = "template_task";

const MOBILE_WORDS: &[&str] = &["mobile", "app", "apps", "ios", "android"];
const API_WORDS: &[&str] = &["api", "apis", "service", "services", "endpoint", "endpoints", "backend"];
const MVP_WORDS: &[&str] = &["mvp", "prototype", "quick", "simple"];
const LARGE_WORDS: &[&str] = &["enterprise", "large", "complex"];

/// What to generate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRequest {
    /// A catalog template name or a free-text description.
    pub input: String,
    pub project_name: String,
    /// Overrides any size inferred from the input.
    #[serde(default)]
    pub size: Option<ProjectSize>,
    #[serde(default)]
    pub excluded_phases: Vec<String>,
    /// Added to every generated task.
    #[serde(default)]
    pub extra_labels: Vec<String>,
}

impl ProjectRequest {
    pub fn new(input: &str, project_name: &str) -> Self {
        Self {
            input: input.to_string(),
            project_name: project_name.to_string(),
            ..Self::default()
        }
    }

    pub fn size(mut self, size: ProjectSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn exclude<I, S>(mut self, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_phases.extend(phases.into_iter().map(Into::into));
        self
    }

    pub fn extra_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_labels.extend(labels.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub name: String,
    pub order: u32,
    pub task_count: usize,
    pub hours: f64,
}

/// A dependency name that resolved to no generated task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedDependency {
    pub task: String,
    pub missing: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProject {
    pub project_name: String,
    pub template: String,
    pub size: ProjectSize,
    /// Topological order; template order wherever dependencies allow.
    pub tasks: Vec<Task>,
    pub phases: Vec<PhaseSummary>,
    pub total_hours: f64,
    /// Present when the template was inferred from free text.
    pub suggestion_reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_dependencies: Vec<DroppedDependency>,
}

impl GeneratedProject {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn phase_names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name.as_str()).collect()
    }
}

/// How the input picked a template.
struct Resolution {
    template: &'static ProjectTemplate,
    /// Size implied by free text; None for template names.
    inferred_size: Option<ProjectSize>,
    from_text: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectGenerator {
    catalog: &'static [ProjectTemplate],
}

impl ProjectGenerator {
    /// Generator over the built-in catalog.
    pub fn new() -> Self {
        Self::with_catalog(BUILTIN_TEMPLATES)
    }

    pub fn with_catalog(catalog: &'static [ProjectTemplate]) -> Self {
        Self { catalog }
    }

    pub fn templates(&self) -> Vec<TemplateInfo> {
        self.catalog.iter().map(TemplateInfo::from).collect()
    }

    /// Look up a template by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<&'static ProjectTemplate> {
        let name = name.trim();
        self.catalog
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    fn catalog_names(&self) -> String {
        self.catalog
            .iter()
            .map(|t| t.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn resolve(&self, input: &str) -> Result<Resolution> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidArgument(
                "template name or description is empty".to_string(),
            ));
        }

        if let Some(template) = self.find(input) {
            return Ok(Resolution {
                template,
                inferred_size: None,
                from_text: false,
            });
        }

        if !input.contains(char::is_whitespace) {
            return Err(Error::NotFound(format!(
                "'{}' (available: {})",
                input,
                self.catalog_names()
            )));
        }

        let words = words(input);
        let name = infer_template_name(&words);
        let template = self.find(name).ok_or_else(|| {
            Error::NotFound(format!(
                "inferred '{}' is not in the catalog (available: {})",
                name,
                self.catalog_names()
            ))
        })?;
        Ok(Resolution {
            template,
            inferred_size: Some(infer_size(&words)),
            from_text: true,
        })
    }

    /// Generate a project.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` for an empty input or project name, or an
    ///   unknown excluded phase
    /// - `Error::NotFound` for a single word that names no template
    /// - `Error::InvalidTemplate` when the resulting graph has a backward
    ///   phase edge or a cycle
    pub fn generate(&self, request: &ProjectRequest) -> Result<GeneratedProject> {
        let project_name = request.project_name.trim();
        if project_name.is_empty() {
            return Err(Error::InvalidArgument("project name is empty".to_string()));
        }

        let resolution = self.resolve(&request.input)?;
        let template = resolution.template;
        let size = request
            .size
            .or(resolution.inferred_size)
            .unwrap_or_default();
        let excluded = self.excluded_phases(template, &request.excluded_phases)?;

        let phases: Vec<&Phase> = template
            .phases
            .iter()
            .filter(|p| !excluded.contains(p.name))
            .collect();

        let mut graph = TaskGraph::new();
        let mut included: Vec<&TaskTemplate> = Vec::new();
        for phase in &phases {
            for tt in phase.tasks {
                if !tt.included_at(size) {
                    mlog_debug!("[generator] skipping {} at size {}", tt.key, size);
                    continue;
                }
                let task = materialize(tt, phase, template, project_name, &request.extra_labels, size);
                graph.insert(tt.key, task)?;
                included.push(tt);
            }
        }

        let mut dropped = Vec::new();
        for tt in &included {
            let Some(dependent) = graph.lookup(tt.key) else {
                continue;
            };
            for dep in tt.depends_on {
                match graph.lookup(dep) {
                    Some(prerequisite) => graph.add_dependency(prerequisite, dependent)?,
                    None => {
                        mlog_warn!(
                            "[generator] {} depends on '{}', which was not generated; dropping",
                            tt.key,
                            dep
                        );
                        dropped.push(DroppedDependency {
                            task: tt.key.to_string(),
                            missing: dep.to_string(),
                        });
                    }
                }
            }
        }

        graph.validate()?;
        let tasks = graph.into_ordered_tasks()?;

        let summaries: Vec<PhaseSummary> = phases
            .iter()
            .map(|phase| {
                let in_phase = tasks.iter().filter(|t| t.phase_order() == Some(phase.order));
                let (count, hours) =
                    in_phase.fold((0, 0.0), |(n, h), t| (n + 1, h + t.estimated_hours));
                PhaseSummary {
                    name: phase.name.to_string(),
                    order: phase.order,
                    task_count: count,
                    hours: round_hours(hours),
                }
            })
            .collect();
        let total_hours = round_hours(tasks.iter().map(|t| t.estimated_hours).sum());

        let suggestion_reasoning = resolution.from_text.then(|| {
            if request.size.is_some() {
                format!(
                    "Inferred the '{}' template from the description; size {} was requested",
                    template.name, size
                )
            } else {
                format!(
                    "Inferred the '{}' template and {} size from the description",
                    template.name, size
                )
            }
        });

        mlog!(
            "[generator] project '{}' from '{}' at {}: {} tasks, {:.1}h",
            project_name,
            template.name,
            size,
            tasks.len(),
            total_hours
        );

        Ok(GeneratedProject {
            project_name: project_name.to_string(),
            template: template.name.to_string(),
            size,
            tasks,
            phases: summaries,
            total_hours,
            suggestion_reasoning,
            dropped_dependencies: dropped,
        })
    }

    fn excluded_phases(
        &self,
        template: &ProjectTemplate,
        requested: &[String],
    ) -> Result<BTreeSet<&'static str>> {
        let mut excluded = BTreeSet::new();
        for name in requested {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let phase = template
                .phases
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "template '{}' has no phase '{}'",
                        template.name, name
                    ))
                })?;
            excluded.insert(phase.name);
        }
        if !template.phases.is_empty() && excluded.len() == template.phases.len() {
            return Err(Error::InvalidArgument(
                "every phase is excluded".to_string(),
            ));
        }
        Ok(excluded)
    }
}

impl Default for ProjectGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn materialize(
    tt: &TaskTemplate,
    phase: &Phase,
    template: &ProjectTemplate,
    project: &str,
    extra_labels: &[String],
    size: ProjectSize,
) -> Task {
    let mut task = Task::new(tt.title, tt.description)
        .priority(tt.priority)
        .estimate(round_hours(tt.base_hours * size.multiplier()))
        .labels(tt.labels.iter().copied())
        .labels([phase.name])
        .labels(extra_labels);
    task.metadata
        .insert(META_PHASE.to_string(), Value::from(phase.name));
    task.metadata
        .insert(META_PHASE_ORDER.to_string(), Value::from(phase.order));
    task.metadata
        .insert(META_TEMPLATE.to_string(), Value::from(template.name));
    task.metadata
        .insert(META_PROJECT.to_string(), Value::from(project));
    task.metadata
        .insert(META_TEMPLATE_TASK.to_string(), Value::from(tt.key));
    task
}

fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

fn has_any(words: &[String], vocabulary: &[&str]) -> bool {
    words.iter().any(|w| vocabulary.contains(&w.as_str()))
}

fn infer_template_name(words: &[String]) -> &'static str {
    if has_any(words, MOBILE_WORDS) {
        "mobile"
    } else if has_any(words, API_WORDS) {
        "api"
    } else {
        "web"
    }
}

fn infer_size(words: &[String]) -> ProjectSize {
    if has_any(words, MVP_WORDS) {
        ProjectSize::Mvp
    } else if has_any(words, LARGE_WORDS) {
        ProjectSize::Large
    } else {
        ProjectSize::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::Priority;
    use crate::core::TaskStatus;
    use std::collections::HashMap;

    fn generate(input: &str, size: Option<ProjectSize>) -> GeneratedProject {
        let mut request = ProjectRequest::new(input, "Acme");
        request.size = size;
        ProjectGenerator::new().generate(&request).unwrap()
    }

    fn keys(project: &GeneratedProject) -> Vec<String> {
        project
            .tasks
            .iter()
            .filter_map(|t| t.metadata.get(META_TEMPLATE_TASK))
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_mvp_skips_optional_templates() {
        let project = generate("web", Some(ProjectSize::Mvp));
        let keys = keys(&project);
        for optional in ["web-ci", "web-design-system", "web-analytics", "web-accessibility", "web-status-page"] {
            assert!(!keys.contains(&optional.to_string()), "{} generated", optional);
        }
        assert!(keys.contains(&"web-deploy".to_string()));
        assert!(!keys.contains(&"web-admin".to_string()));
    }

    #[test]
    fn test_min_size_gates_templates() {
        let medium = keys(&generate("web", Some(ProjectSize::Medium)));
        let large = keys(&generate("web", Some(ProjectSize::Large)));
        assert!(!medium.contains(&"web-admin".to_string()));
        assert!(large.contains(&"web-admin".to_string()));
        assert!(large.contains(&"web-load-tests".to_string()));
        assert!(medium.contains(&"web-ci".to_string()));
    }

    #[test]
    fn test_hours_scale_with_size() {
        let project = generate("api", Some(ProjectSize::Large));
        let auth = project
            .tasks
            .iter()
            .find(|t| t.name == "Implement authentication")
            .unwrap();
        assert_eq!(auth.estimated_hours, 12.0);

        let small = generate("api", Some(ProjectSize::Small));
        let scaffold = small
            .tasks
            .iter()
            .find(|t| t.name == "Scaffold API service")
            .unwrap();
        assert_eq!(scaffold.estimated_hours, 2.8);
    }

    #[test]
    fn test_generated_tasks_are_todo_with_metadata_and_labels() {
        let mut request = ProjectRequest::new("WEB", "Storefront").extra_labels(["q3"]);
        request.size = Some(ProjectSize::Medium);
        let project = ProjectGenerator::new().generate(&request).unwrap();
        assert_eq!(project.template, "web");
        assert!(project.suggestion_reasoning.is_none());

        let first = &project.tasks[0];
        assert_eq!(first.status, TaskStatus::Todo);
        assert_eq!(first.name, "Scaffold web project");
        assert_eq!(first.priority, Priority::High);
        assert_eq!(first.labels, vec!["frontend", "setup", "q3"]);
        assert_eq!(first.phase_name(), Some("setup"));
        assert_eq!(first.phase_order(), Some(1));
        assert_eq!(first.metadata[META_PROJECT], "Storefront");
        assert_eq!(first.metadata[META_TEMPLATE], "web");
    }

    #[test]
    fn test_edges_never_point_backwards_and_order_is_topological() {
        for template in ["web", "api", "mobile"] {
            for size in [ProjectSize::Mvp, ProjectSize::Medium, ProjectSize::Enterprise] {
                let project = generate(template, Some(size));
                let position: HashMap<_, _> = project
                    .tasks
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (t.id.clone(), (i, t.phase_order())))
                    .collect();
                for task in &project.tasks {
                    for dep in &task.dependencies {
                        let (dep_pos, dep_order) = position[dep];
                        let (pos, order) = position[&task.id];
                        assert!(dep_order <= order);
                        assert!(dep_pos < pos);
                    }
                }
            }
        }
    }

    #[test]
    fn test_phase_summaries_and_totals() {
        let project = generate("mobile", Some(ProjectSize::Medium));
        assert_eq!(
            project.phase_names(),
            vec!["setup", "design", "development", "testing", "deployment"]
        );
        let summed: usize = project.phases.iter().map(|p| p.task_count).sum();
        assert_eq!(summed, project.task_count());
        let hours: f64 = project.phases.iter().map(|p| p.hours).sum();
        assert!((hours - project.total_hours).abs() < 1e-6);
    }

    #[test]
    fn test_excluded_phases_drop_tasks_and_dependencies() {
        let request = ProjectRequest::new("api", "Orders").exclude(["Testing"]);
        let project = ProjectGenerator::new().generate(&request).unwrap();
        assert!(!project.phase_names().contains(&"testing"));
        assert!(project.tasks.iter().all(|t| t.phase_name() != Some("testing")));
        assert!(project
            .dropped_dependencies
            .iter()
            .any(|d| d.task == "api-deploy" && d.missing == "api-unit-tests"));
    }

    #[test]
    fn test_unknown_or_total_exclusion_rejected() {
        let generator = ProjectGenerator::new();
        let err = generator
            .generate(&ProjectRequest::new("web", "X").exclude(["marketing"]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let all = ["setup", "design", "development", "testing", "deployment"];
        let err = generator
            .generate(&ProjectRequest::new("web", "X").exclude(all))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_free_text_inference() {
        let project = generate("A simple mobile app for runners", None);
        assert_eq!(project.template, "mobile");
        assert_eq!(project.size, ProjectSize::Mvp);
        assert!(project
            .suggestion_reasoning
            .as_deref()
            .unwrap()
            .contains("'mobile' template and mvp size"));

        let project = generate("Complex backend for payments", None);
        assert_eq!(project.template, "api");
        assert_eq!(project.size, ProjectSize::Large);

        let project = generate("Marketing site for a bakery", None);
        assert_eq!(project.template, "web");
        assert_eq!(project.size, ProjectSize::Medium);
    }

    #[test]
    fn test_explicit_size_beats_inference() {
        let project = generate("quick api prototype", Some(ProjectSize::Enterprise));
        assert_eq!(project.size, ProjectSize::Enterprise);
        assert!(project
            .suggestion_reasoning
            .unwrap()
            .contains("size enterprise was requested"));
    }

    #[test]
    fn test_template_names_default_to_medium() {
        assert_eq!(generate("mobile", None).size, ProjectSize::Medium);
    }

    #[test]
    fn test_unknown_single_word_is_not_found() {
        let err = ProjectGenerator::new()
            .generate(&ProjectRequest::new("desktop", "X"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(err.to_string().contains("web, api, mobile"));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let generator = ProjectGenerator::new();
        assert!(matches!(
            generator.generate(&ProjectRequest::new("  ", "X")),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            generator.generate(&ProjectRequest::new("web", " ")),
            Err(Error::InvalidArgument(_))
        ));
    }

    const BACKWARD: &[ProjectTemplate] = &[ProjectTemplate {
        name: "backward",
        description: "deployment before setup",
        phases: &[
            Phase {
                name: "setup",
                order: 1,
                tasks: &[TaskTemplate::new("early", "Early", "", 1.0, Priority::Low, &[], &["late"])],
            },
            Phase {
                name: "deployment",
                order: 5,
                tasks: &[TaskTemplate::new("late", "Late", "", 1.0, Priority::Low, &[], &[])],
            },
        ],
    }];

    const CYCLIC: &[ProjectTemplate] = &[ProjectTemplate {
        name: "cyclic",
        description: "two tasks waiting on each other",
        phases: &[Phase {
            name: "design",
            order: 2,
            tasks: &[
                TaskTemplate::new("x", "X", "", 1.0, Priority::Low, &[], &["y"]),
                TaskTemplate::new("y", "Y", "", 1.0, Priority::Low, &[], &["x"]),
            ],
        }],
    }];

    const DUPLICATE: &[ProjectTemplate] = &[ProjectTemplate {
        name: "duplicate",
        description: "one key used twice",
        phases: &[Phase {
            name: "setup",
            order: 1,
            tasks: &[
                TaskTemplate::new("same", "A", "", 1.0, Priority::Low, &[], &[]),
                TaskTemplate::new("same", "B", "", 1.0, Priority::Low, &[], &[]),
            ],
        }],
    }];

    const DANGLING: &[ProjectTemplate] = &[ProjectTemplate {
        name: "dangling",
        description: "depends on a template that does not exist",
        phases: &[Phase {
            name: "setup",
            order: 1,
            tasks: &[TaskTemplate::new("only", "Only", "", 1.0, Priority::Low, &[], &["ghost"])],
        }],
    }];

    #[test]
    fn test_invalid_templates_rejected() {
        for catalog in [BACKWARD, CYCLIC, DUPLICATE] {
            let name = catalog[0].name;
            let err = ProjectGenerator::with_catalog(catalog)
                .generate(&ProjectRequest::new(name, "X"))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidTemplate(_)), "{}: {}", name, err);
        }
    }

    #[test]
    fn test_unresolved_dependency_dropped() {
        let project = ProjectGenerator::with_catalog(DANGLING)
            .generate(&ProjectRequest::new("dangling", "X"))
            .unwrap();
        assert_eq!(project.task_count(), 1);
        assert!(project.tasks[0].dependencies.is_empty());
        assert_eq!(project.dropped_dependencies[0].missing, "ghost");
    }

    #[test]
    fn test_inference_outside_catalog_is_not_found() {
        let err = ProjectGenerator::with_catalog(DANGLING)
            .generate(&ProjectRequest::new("a mobile app", "X"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
