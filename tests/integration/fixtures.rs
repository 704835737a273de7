//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Coordinators on a manual clock
//! - Predefined task boards
//! - Temporary config and state directories

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use maestro::clock::ManualClock;
use maestro::config::Config;
use maestro::core::task::{Priority, Task, TaskId, TaskStatus};
use maestro::Coordinator;

/// A coordinator together with the clock driving it.
pub struct TestCoordinator {
    pub coordinator: Coordinator,
    pub clock: Arc<ManualClock>,
}

impl TestCoordinator {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let clock = Arc::new(ManualClock::default());
        let coordinator = Coordinator::with_clock(&config, clock.clone())
            .expect("default config is valid");
        Self { coordinator, clock }
    }
}

/// Scratch directory for config and state files.
pub struct TestDir {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestDir {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().to_path_buf();
        Self { temp_dir, path }
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

pub fn skills(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn strings(list: &[&str]) -> Vec<String> {
    skills(list)
}

/// A few bare titles: no descriptions, labels, estimates or dependencies.
pub fn chaotic_board() -> Vec<Task> {
    vec![
        Task::with_id("c1", "stuff", ""),
        Task::with_id("c2", "fix things", ""),
        Task::with_id("c3", "more stuff", ""),
    ]
}

/// A board with every structural signal present.
pub fn structured_board() -> Vec<Task> {
    let design = Task::with_id(
        "s1",
        "Design checkout flow",
        "Wireframes for the cart, address and payment steps of the checkout.",
    )
    .priority(Priority::High)
    .labels(["design", "frontend"])
    .estimate(6.0)
    .status(TaskStatus::Done);
    let build = Task::with_id(
        "s2",
        "Implement checkout API",
        "Endpoints for creating orders and capturing payments from the cart.",
    )
    .priority(Priority::Urgent)
    .labels(["development", "backend"])
    .estimate(12.0)
    .depends_on(&TaskId::from("s1"))
    .expect("valid dependency");
    let verify = Task::with_id(
        "s3",
        "Test checkout API",
        "Integration tests for order creation and payment capture edge cases.",
    )
    .priority(Priority::Medium)
    .labels(["testing", "backend"])
    .estimate(5.0)
    .depends_on(&TaskId::from("s2"))
    .expect("valid dependency");
    let ship = Task::with_id(
        "s4",
        "Deploy checkout to production",
        "Roll the new checkout out behind a flag and watch the error rates.",
    )
    .priority(Priority::Low)
    .labels(["deployment", "devops"])
    .estimate(3.0)
    .depends_on(&TaskId::from("s3"))
    .expect("valid dependency");
    vec![design, build, verify, ship]
}

/// Scenario D board: an unfinished implementation task and a deployment.
pub fn login_release_board() -> Vec<Task> {
    vec![
        Task::with_id("impl", "Implement login API", "").status(TaskStatus::InProgress),
        Task::with_id("deploy", "Deploy to production", "").priority(Priority::Urgent),
    ]
}
