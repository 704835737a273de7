//! Creator mode: project plans from templates or descriptions.

pub mod generator;
pub mod templates;

pub use generator::{
    DroppedDependency, GeneratedProject, PhaseSummary, ProjectGenerator, ProjectRequest,
};
pub use templates::{
    Phase, ProjectSize, ProjectTemplate, TaskTemplate, TemplateInfo, BUILTIN_TEMPLATES,
};
