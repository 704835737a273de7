//! Mode registry persistence, cooldowns and configuration files.

use std::sync::Arc;

use chrono::Duration;

use maestro::adaptive::Outcome;
use maestro::config::{Config, RegistryConfig};
use maestro::core::task::Task;
use maestro::modes::{ModeRegistry, RegistrySnapshot};
use maestro::{Coordinator, ErrorKind, OrchestrationMode};

use crate::fixtures::{TestCoordinator, TestDir};

#[test]
fn test_state_file_round_trip_keeps_mode_history_and_preferences() {
    let dir = TestDir::new();
    let state = dir.file("state.json");

    let t = TestCoordinator::new();
    t.coordinator
        .switch_mode(OrchestrationMode::Creator, Some("new project"), Some("alice"));
    let project = t
        .coordinator
        .generate_project("mobile", "Trails", Some("small"), &[], &[])
        .ok()
        .expect("mobile template exists");
    assert_eq!(project.template, "mobile");
    t.coordinator.record_outcome(
        "agent1",
        &Task::new("Push notifications", "").labels(["mobile"]),
        Outcome::Abandoned,
    );

    let snapshot = t.coordinator.registry().snapshot().expect("snapshot");
    std::fs::write(&state, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();

    let content = std::fs::read_to_string(&state).unwrap();
    let parsed: RegistrySnapshot = serde_json::from_str(&content).unwrap();
    let registry =
        ModeRegistry::from_snapshot(parsed, &RegistryConfig::default(), t.clock.clone())
            .expect("snapshot restores");
    let restored = Coordinator::with_registry(&Config::default(), registry).unwrap();

    let info = restored.current_mode();
    assert_eq!(info.mode, OrchestrationMode::Creator);
    assert_eq!(info.status["projects_generated"], 1);
    assert_eq!(info.status["last_project"], "Trails");

    let history = restored.registry().switch_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].actor.as_deref(), Some("alice"));
    assert_eq!(history[0].reason.as_deref(), Some("new project"));

    let score = restored.registry().preferences().label_score("agent1", "mobile");
    assert!((score - 0.4).abs() < 1e-9);
}

#[test]
fn test_mode_state_survives_a_round_trip_through_another_mode() {
    let t = TestCoordinator::new();
    let tasks = vec![Task::with_id("t1", "Write docs", "")];
    t.coordinator.next_task("agent1", &[], &tasks, &[]);
    assert_eq!(t.coordinator.current_mode().status["total_handouts"], 1);

    t.coordinator
        .switch_mode(OrchestrationMode::Creator, None, None);
    assert!(t.coordinator.current_mode().status.get("total_handouts").is_none());
    // Hand-outs while another mode is active are not recorded.
    t.coordinator.next_task("agent1", &[], &tasks, &[]);

    t.coordinator
        .switch_mode(OrchestrationMode::Adaptive, None, None);
    let status = t.coordinator.current_mode().status;
    assert_eq!(status["total_handouts"], 1);
    assert_eq!(status["handouts_per_agent"]["agent1"], 1);
}

#[test]
fn test_switch_counts_and_noop_switches() {
    let t = TestCoordinator::new();
    let same = t
        .coordinator
        .switch_mode(OrchestrationMode::Adaptive, None, None)
        .ok()
        .expect("switching to the active mode succeeds");
    assert!(same.success);
    assert_eq!(same.previous, same.current);
    assert!(t.coordinator.registry().switch_history().is_empty());

    t.coordinator
        .switch_mode(OrchestrationMode::Creator, None, None);
    t.coordinator
        .switch_mode(OrchestrationMode::Adaptive, None, None);
    t.coordinator
        .switch_mode(OrchestrationMode::Creator, None, None);
    assert_eq!(t.coordinator.current_mode().switch_count, 3);
}

#[test]
fn test_suggestions_wait_out_the_cooldown() {
    let t = TestCoordinator::new();
    assert_eq!(
        t.coordinator.suggest_switch(&[]).map(|s| s.mode),
        Some(OrchestrationMode::Creator)
    );

    t.coordinator
        .switch_mode(OrchestrationMode::Creator, None, None);
    t.coordinator
        .switch_mode(OrchestrationMode::Adaptive, None, None);
    assert!(t.coordinator.suggest_switch(&[]).is_none());

    t.clock.advance(Duration::seconds(299));
    assert!(t.coordinator.suggest_switch(&[]).is_none());
    t.clock.advance(Duration::seconds(1));
    assert!(t.coordinator.suggest_switch(&[]).is_some());
}

#[test]
fn test_config_file_changes_behavior() {
    let dir = TestDir::new();
    let path = dir.file("maestro.toml");
    std::fs::write(
        &path,
        "[registry]\ninitial_mode = \"creator\"\nsuggest_cooldown_secs = 60\n\n[scheduler]\nrelated_overlap = 0.5\n",
    )
    .unwrap();

    let config = Config::load_from(&path).expect("config parses");
    assert_eq!(config.registry.initial_mode, OrchestrationMode::Creator);
    assert_eq!(config.registry.suggest_cooldown_secs, 60);
    assert_eq!(config.scheduler.related_overlap, 0.5);
    assert_eq!(config.scheduler.skill_weight, 0.4);

    let t = TestCoordinator::with_config(config);
    assert_eq!(t.coordinator.current_mode().mode, OrchestrationMode::Creator);
}

#[test]
fn test_config_save_and_reload() {
    let dir = TestDir::new();
    let path = dir.path.join("nested").join("maestro.toml");
    let mut config = Config::default();
    config.detector.history_limit = 3;
    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TestDir::new();
    let path = dir.file("maestro.toml");
    std::fs::write(&path, "[registry]\ninitial_mode = \"enricher\"\n").unwrap();
    let err = Config::load_from(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let mut config = Config::default();
    config.scheduler.skill_weight = -1.0;
    assert!(Coordinator::with_clock(&config, Arc::new(maestro::clock::SystemClock)).is_err());
}
