//! Built-in project template catalog.
//!
//! Catalog entries are immutable statics. Task descriptions only use the
//! vocabulary of their own phase, so a generated board analyzes back to
//! exactly the phases it was generated with.

use serde::{Deserialize, Serialize};

use crate::core::task::Priority::{self, High, Low, Medium, Urgent};
use crate::error::{Error, Result};

/// Requested project scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectSize {
    Mvp,
    Small,
    #[default]
    Medium,
    Large,
    Enterprise,
}

impl ProjectSize {
    /// Effort multiplier applied to template base hours.
    pub fn multiplier(&self) -> f64 {
        match self {
            ProjectSize::Mvp => 0.5,
            ProjectSize::Small => 0.7,
            ProjectSize::Medium => 1.0,
            ProjectSize::Large => 1.5,
            ProjectSize::Enterprise => 2.0,
        }
    }
}

impl std::fmt::Display for ProjectSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectSize::Mvp => write!(f, "mvp"),
            ProjectSize::Small => write!(f, "small"),
            ProjectSize::Medium => write!(f, "medium"),
            ProjectSize::Large => write!(f, "large"),
            ProjectSize::Enterprise => write!(f, "enterprise"),
        }
    }
}

impl std::str::FromStr for ProjectSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mvp" => Ok(ProjectSize::Mvp),
            "small" => Ok(ProjectSize::Small),
            "medium" => Ok(ProjectSize::Medium),
            "large" => Ok(ProjectSize::Large),
            "enterprise" => Ok(ProjectSize::Enterprise),
            other => Err(Error::InvalidArgument(format!(
                "unknown project size '{}' (expected mvp, small, medium, large or enterprise)",
                other
            ))),
        }
    }
}

/// One task a phase produces.
#[derive(Debug, Clone, Copy)]
pub struct TaskTemplate {
    /// Unique within the project template; dependencies refer to it.
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub base_hours: f64,
    pub priority: Priority,
    pub labels: &'static [&'static str],
    pub optional: bool,
    /// Smallest project size that includes this task.
    pub min_size: Option<ProjectSize>,
    pub depends_on: &'static [&'static str],
}

impl TaskTemplate {
    pub const fn new(
        key: &'static str,
        title: &'static str,
        description: &'static str,
        base_hours: f64,
        priority: Priority,
        labels: &'static [&'static str],
        depends_on: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            title,
            description,
            base_hours,
            priority,
            labels,
            optional: false,
            min_size: None,
            depends_on,
        }
    }

    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub const fn min_size(mut self, size: ProjectSize) -> Self {
        self.min_size = Some(size);
        self
    }

    /// Whether a project of `size` includes this task.
    pub fn included_at(&self, size: ProjectSize) -> bool {
        if size == ProjectSize::Mvp && self.optional {
            return false;
        }
        match self.min_size {
            Some(min) => size >= min,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Phase {
    pub name: &'static str,
    pub order: u32,
    pub tasks: &'static [TaskTemplate],
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub phases: &'static [Phase],
}

impl ProjectTemplate {
    pub fn task_count(&self) -> usize {
        self.phases.iter().map(|p| p.tasks.len()).sum()
    }

    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases.iter().map(|p| p.name).collect()
    }
}

/// Catalog listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub name: String,
    pub description: String,
    pub phases: Vec<String>,
    pub task_templates: usize,
}

impl From<&ProjectTemplate> for TemplateInfo {
    fn from(template: &ProjectTemplate) -> Self {
        Self {
            name: template.name.to_string(),
            description: template.description.to_string(),
            phases: template.phase_names().into_iter().map(str::to_string).collect(),
            task_templates: template.task_count(),
        }
    }
}

const CI_DESCRIPTION: &str = "Configure continuous integration to lint and type-check every pull request.";

pub const WEB: ProjectTemplate = ProjectTemplate {
    name: "web",
    description: "Browser application with authentication and a data layer",
    phases: &[
        Phase {
            name: "setup",
            order: 1,
            tasks: &[
                TaskTemplate::new(
                    "web-scaffold",
                    "Scaffold web project",
                    "Scaffold the repository with the chosen frontend framework, linting and formatting rules.",
                    4.0, High, &["frontend"], &[],
                ),
                TaskTemplate::new(
                    "web-environment",
                    "Set up local environment",
                    "Set up environment variables, package manager and a reproducible local toolchain for every developer.",
                    3.0, Medium, &["infrastructure"], &["web-scaffold"],
                ),
                TaskTemplate::new(
                    "web-ci",
                    "Configure CI pipeline",
                    CI_DESCRIPTION,
                    3.0, Medium, &["infrastructure", "ci"], &["web-scaffold"],
                )
                .optional(),
            ],
        },
        Phase {
            name: "design",
            order: 2,
            tasks: &[
                TaskTemplate::new(
                    "web-architecture",
                    "Design application architecture",
                    "Design routing, state management and the API contract between client and server.",
                    6.0, High, &["architecture", "frontend"], &["web-scaffold"],
                ),
                TaskTemplate::new(
                    "web-wireframes",
                    "Create page wireframes",
                    "Sketch wireframes for the main user journeys and agree on navigation.",
                    5.0, Medium, &["ux", "frontend"], &["web-architecture"],
                ),
                TaskTemplate::new(
                    "web-design-system",
                    "Design system tokens",
                    "Define colors, typography and reusable component styles.",
                    4.0, Low, &["ux", "frontend"], &["web-wireframes"],
                )
                .optional(),
            ],
        },
        Phase {
            name: "development",
            order: 3,
            tasks: &[
                TaskTemplate::new(
                    "web-auth",
                    "Implement authentication",
                    "Implement sign up, sign in and session handling for users.",
                    8.0, High, &["backend", "security"], &["web-architecture"],
                ),
                TaskTemplate::new(
                    "web-core-pages",
                    "Build core pages",
                    "Build the main pages from the approved layouts with responsive styling.",
                    12.0, High, &["frontend"], &["web-wireframes", "web-auth"],
                ),
                TaskTemplate::new(
                    "web-data-layer",
                    "Implement data layer",
                    "Implement API clients, caching and form validation for the pages.",
                    8.0, Medium, &["frontend", "backend"], &["web-architecture"],
                ),
                TaskTemplate::new(
                    "web-admin",
                    "Build admin dashboard",
                    "Build an admin area to manage users, content and permissions.",
                    10.0, Medium, &["frontend", "admin"], &["web-auth", "web-core-pages"],
                )
                .min_size(ProjectSize::Large),
                TaskTemplate::new(
                    "web-analytics",
                    "Implement analytics tracking",
                    "Implement page view and event tracking with a privacy-friendly provider.",
                    4.0, Low, &["frontend", "analytics"], &["web-core-pages"],
                )
                .optional(),
            ],
        },
        Phase {
            name: "testing",
            order: 4,
            tasks: &[
                TaskTemplate::new(
                    "web-unit-tests",
                    "Write unit tests",
                    "Write unit tests for components, hooks and the data layer.",
                    6.0, High, &["qa"], &["web-core-pages", "web-data-layer"],
                ),
                TaskTemplate::new(
                    "web-e2e-tests",
                    "Write end-to-end tests",
                    "Cover sign in and the main user journeys with e2e tests in a headless browser.",
                    6.0, High, &["qa"], &["web-core-pages", "web-auth"],
                ),
                TaskTemplate::new(
                    "web-accessibility",
                    "Audit accessibility",
                    "Verify keyboard navigation, contrast and screen reader labels.",
                    3.0, Medium, &["qa", "accessibility"], &["web-core-pages"],
                )
                .optional(),
                TaskTemplate::new(
                    "web-load-tests",
                    "Run load tests",
                    "Test page load times and server throughput under peak traffic.",
                    5.0, Medium, &["qa", "performance"], &["web-data-layer"],
                )
                .min_size(ProjectSize::Large),
            ],
        },
        Phase {
            name: "deployment",
            order: 5,
            tasks: &[
                TaskTemplate::new(
                    "web-hosting",
                    "Configure hosting",
                    "Configure hosting, domains and TLS certificates for the production site.",
                    3.0, High, &["infrastructure"], &["web-environment"],
                ),
                TaskTemplate::new(
                    "web-deploy",
                    "Deploy to production",
                    "Deploy the site to production and confirm it serves traffic.",
                    2.0, Urgent, &["infrastructure"],
                    &["web-hosting", "web-unit-tests", "web-e2e-tests"],
                ),
                TaskTemplate::new(
                    "web-status-page",
                    "Publish status page",
                    "Publish a public status page for the production site.",
                    2.0, Low, &["infrastructure"], &["web-deploy"],
                )
                .optional(),
            ],
        },
    ],
};

pub const API: ProjectTemplate = ProjectTemplate {
    name: "api",
    description: "Backend service exposing a versioned HTTP API over a relational database",
    phases: &[
        Phase {
            name: "setup",
            order: 1,
            tasks: &[
                TaskTemplate::new(
                    "api-scaffold",
                    "Scaffold API service",
                    "Scaffold the service repository with the web framework, linting and formatting.",
                    4.0, High, &["backend"], &[],
                ),
                TaskTemplate::new(
                    "api-database-setup",
                    "Set up database",
                    "Set up the database server and connection pooling for local work.",
                    3.0, High, &["database"], &["api-scaffold"],
                ),
                TaskTemplate::new(
                    "api-ci",
                    "Configure CI pipeline",
                    CI_DESCRIPTION,
                    3.0, Medium, &["infrastructure", "ci"], &["api-scaffold"],
                )
                .optional(),
            ],
        },
        Phase {
            name: "design",
            order: 2,
            tasks: &[
                TaskTemplate::new(
                    "api-contract",
                    "Design API contract",
                    "Design resources, endpoints and error formats in an OpenAPI document.",
                    6.0, High, &["backend", "architecture"], &["api-scaffold"],
                ),
                TaskTemplate::new(
                    "api-data-model",
                    "Design data model",
                    "Design tables, relations and indexes for the schema.",
                    5.0, High, &["database"], &["api-contract"],
                ),
                TaskTemplate::new(
                    "api-rate-limits",
                    "Design rate limiting",
                    "Design quotas and throttling rules per client.",
                    2.0, Low, &["backend"], &["api-contract"],
                )
                .optional(),
            ],
        },
        Phase {
            name: "development",
            order: 3,
            tasks: &[
                TaskTemplate::new(
                    "api-auth",
                    "Implement authentication",
                    "Implement token issuance, validation and scopes.",
                    8.0, High, &["backend", "security"], &["api-contract"],
                ),
                TaskTemplate::new(
                    "api-endpoints",
                    "Implement endpoints",
                    "Implement the resource endpoints described in the contract.",
                    14.0, High, &["backend"], &["api-contract", "api-data-model", "api-auth"],
                ),
                TaskTemplate::new(
                    "api-migrations",
                    "Write database migrations",
                    "Write schema migrations for every table in the data model.",
                    4.0, Medium, &["database"], &["api-data-model", "api-database-setup"],
                ),
                TaskTemplate::new(
                    "api-background-jobs",
                    "Implement background jobs",
                    "Implement a queue and workers for slow operations.",
                    8.0, Medium, &["backend"], &["api-endpoints"],
                )
                .min_size(ProjectSize::Large),
                TaskTemplate::new(
                    "api-caching",
                    "Implement response caching",
                    "Implement caching for hot read endpoints.",
                    4.0, Low, &["backend", "performance"], &["api-endpoints"],
                )
                .optional(),
            ],
        },
        Phase {
            name: "testing",
            order: 4,
            tasks: &[
                TaskTemplate::new(
                    "api-unit-tests",
                    "Write unit tests",
                    "Write unit tests for handlers and domain logic.",
                    6.0, High, &["qa", "backend"], &["api-endpoints"],
                ),
                TaskTemplate::new(
                    "api-integration-tests",
                    "Write integration tests",
                    "Test endpoints against a real database with seeded data.",
                    6.0, High, &["qa", "backend"], &["api-endpoints", "api-migrations"],
                ),
                TaskTemplate::new(
                    "api-load-tests",
                    "Run load tests",
                    "Test throughput and latency of the busiest endpoints.",
                    5.0, Medium, &["qa", "performance"], &["api-endpoints"],
                )
                .min_size(ProjectSize::Large),
                TaskTemplate::new(
                    "api-security-review",
                    "Review security",
                    "Verify authentication, input validation and dependency audit results.",
                    4.0, Medium, &["qa", "security"], &["api-auth"],
                )
                .optional(),
            ],
        },
        Phase {
            name: "deployment",
            order: 5,
            tasks: &[
                TaskTemplate::new(
                    "api-infrastructure",
                    "Prepare hosting infrastructure",
                    "Prepare containers, managed database and secrets for the production environment.",
                    5.0, High, &["infrastructure"], &["api-database-setup"],
                ),
                TaskTemplate::new(
                    "api-deploy",
                    "Deploy API to production",
                    "Deploy the service to production behind a load balancer.",
                    2.0, Urgent, &["infrastructure", "backend"],
                    &["api-infrastructure", "api-unit-tests", "api-integration-tests"],
                ),
                TaskTemplate::new(
                    "api-docs-portal",
                    "Publish API documentation",
                    "Publish the reference docs alongside the production release.",
                    3.0, Low, &["documentation"], &["api-deploy"],
                )
                .optional(),
            ],
        },
    ],
};

pub const MOBILE: ProjectTemplate = ProjectTemplate {
    name: "mobile",
    description: "Cross-platform iOS and Android app with offline sync",
    phases: &[
        Phase {
            name: "setup",
            order: 1,
            tasks: &[
                TaskTemplate::new(
                    "mobile-scaffold",
                    "Scaffold mobile app",
                    "Scaffold the cross-platform app project for iOS and Android.",
                    4.0, High, &["mobile"], &[],
                ),
                TaskTemplate::new(
                    "mobile-tooling",
                    "Set up device tooling",
                    "Set up simulators, emulators and signing certificates for every developer.",
                    3.0, Medium, &["mobile"], &["mobile-scaffold"],
                ),
                TaskTemplate::new(
                    "mobile-ci",
                    "Configure CI pipeline",
                    "Configure continuous integration to lint and compile each pull request.",
                    3.0, Medium, &["infrastructure", "ci"], &["mobile-scaffold"],
                )
                .optional(),
            ],
        },
        Phase {
            name: "design",
            order: 2,
            tasks: &[
                TaskTemplate::new(
                    "mobile-ux",
                    "Design UX flows",
                    "Design onboarding and the main navigation flows as wireframes.",
                    6.0, High, &["mobile", "ux"], &["mobile-scaffold"],
                ),
                TaskTemplate::new(
                    "mobile-architecture",
                    "Design app architecture",
                    "Design state management, navigation and the offline data strategy.",
                    5.0, High, &["mobile", "architecture"], &["mobile-scaffold"],
                ),
                TaskTemplate::new(
                    "mobile-branding",
                    "Design app branding",
                    "Design the icon, splash screen and color palette.",
                    3.0, Low, &["mobile", "ux"], &["mobile-ux"],
                )
                .optional(),
            ],
        },
        Phase {
            name: "development",
            order: 3,
            tasks: &[
                TaskTemplate::new(
                    "mobile-auth",
                    "Implement authentication",
                    "Implement sign in, secure token storage and session refresh.",
                    8.0, High, &["mobile", "security"], &["mobile-architecture"],
                ),
                TaskTemplate::new(
                    "mobile-screens",
                    "Build core screens",
                    "Build the main screens from the agreed navigation flows.",
                    14.0, High, &["mobile", "frontend"], &["mobile-ux", "mobile-auth"],
                ),
                TaskTemplate::new(
                    "mobile-offline",
                    "Implement offline sync",
                    "Implement local storage and background sync with the server.",
                    8.0, Medium, &["mobile", "backend"], &["mobile-architecture", "mobile-screens"],
                )
                .min_size(ProjectSize::Medium),
                TaskTemplate::new(
                    "mobile-push",
                    "Implement push notifications",
                    "Implement push notification registration and handling.",
                    5.0, Low, &["mobile"], &["mobile-screens"],
                )
                .optional(),
            ],
        },
        Phase {
            name: "testing",
            order: 4,
            tasks: &[
                TaskTemplate::new(
                    "mobile-unit-tests",
                    "Write unit tests",
                    "Write unit tests for view models and the sync logic.",
                    6.0, High, &["mobile", "qa"], &["mobile-screens"],
                ),
                TaskTemplate::new(
                    "mobile-device-tests",
                    "Run device tests",
                    "Test the main flows on a matrix of physical devices and screen sizes.",
                    6.0, High, &["mobile", "qa"], &["mobile-screens", "mobile-auth"],
                ),
                TaskTemplate::new(
                    "mobile-beta",
                    "Run beta program",
                    "Distribute a beta to internal testers and collect feedback.",
                    4.0, Medium, &["mobile", "qa"], &["mobile-device-tests"],
                )
                .optional(),
            ],
        },
        Phase {
            name: "deployment",
            order: 5,
            tasks: &[
                TaskTemplate::new(
                    "mobile-store-listing",
                    "Prepare store listings",
                    "Prepare screenshots, descriptions and privacy details for the app store listings.",
                    3.0, Medium, &["mobile"], &["mobile-scaffold"],
                ),
                TaskTemplate::new(
                    "mobile-release",
                    "Release to app stores",
                    "Submit the release builds for store review and roll out to users.",
                    3.0, Urgent, &["mobile"],
                    &["mobile-store-listing", "mobile-unit-tests", "mobile-device-tests"],
                ),
                TaskTemplate::new(
                    "mobile-crash-reporting",
                    "Enable crash reporting",
                    "Enable crash and performance reporting for the production app.",
                    2.0, Medium, &["mobile", "observability"], &["mobile-release"],
                )
                .min_size(ProjectSize::Large),
            ],
        },
    ],
};

/// Every built-in template, in listing order.
pub static BUILTIN_TEMPLATES: &[ProjectTemplate] = &[WEB, API, MOBILE];
