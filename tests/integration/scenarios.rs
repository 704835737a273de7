//! End-to-end scenarios through the coordinator.

use maestro::adaptive::{BlockReason, Outcome};
use maestro::core::task::{Priority, Task, TaskId, TaskStatus};
use maestro::creator::ProjectSize;
use maestro::{ErrorKind, OrchestrationMode};

use crate::fixtures::{
    chaotic_board, login_release_board, skills, strings, structured_board, TestCoordinator,
};

#[test]
fn test_empty_board_recommends_creator() {
    let t = TestCoordinator::new();
    let rec = t.coordinator.recommend_mode("alice", &[], None);
    assert_eq!(rec.mode, OrchestrationMode::Creator);
    assert_eq!(rec.confidence, 0.95);
    assert_eq!(
        rec.alternatives,
        vec![OrchestrationMode::Enricher, OrchestrationMode::Adaptive]
    );
}

#[test]
fn test_enricher_switch_fails_and_leaves_mode() {
    let t = TestCoordinator::new();
    let response = t
        .coordinator
        .switch_mode(OrchestrationMode::Enricher, Some("tidy up"), Some("alice"));

    let failure = response.failure().expect("enricher has no handler");
    assert!(!failure.success);
    assert_eq!(failure.kind, ErrorKind::UnimplementedMode);
    assert_eq!(t.coordinator.current_mode().mode, OrchestrationMode::Adaptive);
    assert!(t.coordinator.registry().switch_history().is_empty());
    assert!(t.coordinator.detector().history("alice").is_empty());
}

#[test]
fn test_mvp_web_project_has_no_optional_tasks() {
    let t = TestCoordinator::new();
    let project = t
        .coordinator
        .generate_project("web", "Storefront", Some("mvp"), &[], &[])
        .ok()
        .expect("web template exists");

    assert_eq!(project.size, ProjectSize::Mvp);
    let full = t
        .coordinator
        .generate_project("web", "Storefront", Some("enterprise"), &[], &[])
        .ok()
        .expect("web template exists");
    assert!(project.task_count() < full.task_count());

    let names: Vec<&str> = project.tasks.iter().map(|t| t.name.as_str()).collect();
    for task in &full.tasks {
        let key = task.metadata["template_task"].as_str().unwrap_or_default();
        if ["web-ci", "web-design-system", "web-analytics", "web-accessibility", "web-status-page"]
            .contains(&key)
        {
            assert!(!names.contains(&task.name.as_str()), "{} generated at mvp", key);
        }
    }
}

#[test]
fn test_deploy_waits_for_unfinished_implementation() {
    let t = TestCoordinator::new();
    let tasks = login_release_board();
    assert!(t
        .coordinator
        .next_task("agent1", &skills(&["devops"]), &tasks, &[])
        .is_none());

    let analysis = t.coordinator.blocking_analysis(&tasks);
    assert_eq!(analysis.blocked.len(), 1);
    assert_eq!(analysis.blocked[0].task_id, TaskId::from("deploy"));
    assert_eq!(
        analysis.blocked[0].blocked_by[0].reason,
        BlockReason::UnfinishedBeforeDeployment
    );

    let mut finished = tasks.clone();
    finished[0] = finished[0].clone().status(TaskStatus::Done);
    let task = t
        .coordinator
        .next_task("agent1", &skills(&["devops"]), &finished, &[])
        .expect("deployment is free once implementation is done");
    assert_eq!(task.id, TaskId::from("deploy"));
}

#[test]
fn test_completed_outcomes_pull_agent_towards_label() {
    let t = TestCoordinator::new();
    let history = Task::with_id("old", "Orders service", "").labels(["backend"]);
    for _ in 0..3 {
        t.coordinator
            .record_outcome("agent1", &history, Outcome::Completed);
    }

    let tasks = vec![
        Task::with_id("fe", "Cart page", "").labels(["frontend"]),
        Task::with_id("be1", "Invoice service", "").labels(["backend"]),
        Task::with_id("be2", "Refund service", "").labels(["backend"]),
    ];
    let first = t
        .coordinator
        .next_task("agent1", &[], &tasks, &[])
        .expect("all tasks are ready");
    assert_eq!(first.id, TaskId::from("be1"));

    let second = t
        .coordinator
        .next_task("agent1", &[], &tasks, &[first.id.clone()])
        .expect("two tasks remain");
    assert_eq!(second.id, TaskId::from("be2"));

    // Without history the frontend task is first in board order.
    let other = t
        .coordinator
        .next_task("agent2", &[], &tasks, &[])
        .expect("all tasks are ready");
    assert_eq!(other.id, TaskId::from("fe"));
}

#[test]
fn test_message_intent_beats_board_state() {
    let t = TestCoordinator::new();
    let rec = t.coordinator.recommend_mode(
        "alice",
        &structured_board(),
        Some("Please clean up this messy board"),
    );
    assert_eq!(rec.mode, OrchestrationMode::Enricher);
    assert_eq!(rec.intent.as_deref(), Some("organize"));
    assert_eq!(rec.confidence, 0.90);
}

#[test]
fn test_board_shape_drives_recommendation() {
    let t = TestCoordinator::new();
    let chaotic = t.coordinator.recommend_mode("alice", &chaotic_board(), None);
    assert_eq!(chaotic.mode, OrchestrationMode::Enricher);
    assert_eq!(chaotic.confidence, 0.85);

    let structured = t
        .coordinator
        .recommend_mode("alice", &structured_board(), None);
    assert_eq!(structured.mode, OrchestrationMode::Adaptive);
    assert_eq!(structured.confidence, 0.90);
}

#[test]
fn test_switches_show_up_in_reasoning() {
    let t = TestCoordinator::new();
    t.coordinator
        .switch_mode(OrchestrationMode::Creator, Some("new project"), Some("alice"));
    t.coordinator
        .switch_mode(OrchestrationMode::Adaptive, Some("plan ready"), Some("alice"));

    let rec = t.coordinator.recommend_mode("alice", &[], None);
    assert!(rec
        .reasoning
        .ends_with(" (recent modes: creator, adaptive)"));
    let other = t.coordinator.recommend_mode("bob", &[], None);
    assert!(!other.reasoning.contains("recent modes"));
}

#[test]
fn test_generated_plan_feeds_the_scheduler() {
    let t = TestCoordinator::new();
    t.coordinator
        .switch_mode(OrchestrationMode::Creator, Some("start"), None);
    let project = t
        .coordinator
        .generate_project("a quick api for invoices", "Billing", None, &[], &strings(&["billing"]))
        .ok()
        .expect("free text resolves to the api template");
    assert_eq!(project.template, "api");
    assert_eq!(project.size, ProjectSize::Mvp);
    assert!(project.tasks.iter().all(|t| t.labels.contains(&"billing".to_string())));

    t.coordinator
        .switch_mode(OrchestrationMode::Adaptive, Some("plan ready"), None);
    let rec = t.coordinator.recommend_mode("alice", &project.tasks, None);
    assert_ne!(rec.mode, OrchestrationMode::Creator);

    // Only tasks without prerequisites can start.
    let first = t
        .coordinator
        .next_task("agent1", &skills(&["backend"]), &project.tasks, &[])
        .expect("setup work is ready");
    assert!(first.dependencies.is_empty());
    assert_eq!(first.phase_name(), Some("setup"));

    let analysis = t.coordinator.blocking_analysis(&project.tasks);
    assert!(analysis
        .ready
        .iter()
        .all(|r| project.tasks.iter().any(|t| t.id == r.task_id && t.dependencies.is_empty())));
    assert!(!analysis.blocked.is_empty());
}

#[test]
fn test_unknown_template_lists_catalog() {
    let t = TestCoordinator::new();
    let response = t
        .coordinator
        .generate_project("desktop", "Editor", None, &[], &[]);
    let failure = response.failure().expect("no desktop template");
    assert_eq!(failure.kind, ErrorKind::NotFound);
    for name in ["web", "api", "mobile"] {
        assert!(failure.error.contains(name));
    }
}

#[test]
fn test_claimed_and_assigned_tasks_are_skipped() {
    let t = TestCoordinator::new();
    let mut assigned = Task::with_id("a", "Write changelog", "").priority(Priority::Urgent);
    assigned.assign("agent2");
    let tasks = vec![
        assigned,
        Task::with_id("b", "Update readme", "").priority(Priority::High),
        Task::with_id("c", "Tag issues", ""),
    ];
    let task = t
        .coordinator
        .next_task("agent1", &[], &tasks, &[TaskId::from("b")])
        .expect("one task remains");
    assert_eq!(task.id, TaskId::from("c"));
}

#[test]
fn test_deploy_waits_for_build_work_that_mentions_deployment() {
    let t = TestCoordinator::new();
    let tasks = vec![
        Task::with_id("impl", "Implement deployment pipeline", ""),
        Task::with_id("deploy", "Deploy to production", "").priority(Priority::Urgent),
    ];
    let first = t
        .coordinator
        .next_task("agent1", &[], &tasks, &[])
        .expect("the pipeline work is ready");
    assert_eq!(first.id, TaskId::from("impl"));

    let analysis = t.coordinator.blocking_analysis(&tasks);
    assert_eq!(analysis.blocked.len(), 1);
    assert_eq!(analysis.blocked[0].task_id, TaskId::from("deploy"));

    let tasks = vec![
        Task::with_id("harness", "Build login test harness", ""),
        Task::with_id("t", "Test login flows", "").priority(Priority::Urgent),
    ];
    let first = t
        .coordinator
        .next_task("agent1", &[], &tasks, &[])
        .expect("the harness is ready");
    assert_eq!(first.id, TaskId::from("harness"));
}
