//! Invariants checked across every template, size and a spread of boards.

use std::collections::{BTreeSet, HashMap};

use maestro::adaptive::{AdaptiveScheduler, PreferenceStore};
use maestro::board::{analyze, BoardState};
use maestro::core::task::{Priority, Task, TaskId, TaskStatus};
use maestro::creator::{ProjectGenerator, ProjectRequest, ProjectSize, BUILTIN_TEMPLATES};

use crate::fixtures::{chaotic_board, login_release_board, skills, structured_board};

const SIZES: [ProjectSize; 5] = [
    ProjectSize::Mvp,
    ProjectSize::Small,
    ProjectSize::Medium,
    ProjectSize::Large,
    ProjectSize::Enterprise,
];

fn generate(template: &str, size: ProjectSize) -> Vec<Task> {
    ProjectGenerator::new()
        .generate(&ProjectRequest::new(template, "Property").size(size))
        .expect("built-in templates generate")
        .tasks
}

#[test]
fn test_generated_dependencies_never_point_backwards() {
    for template in BUILTIN_TEMPLATES {
        for size in SIZES {
            let tasks = generate(template.name, size);
            let by_id: HashMap<&TaskId, &Task> = tasks.iter().map(|t| (&t.id, t)).collect();
            for task in &tasks {
                for dep in &task.dependencies {
                    let prereq = by_id
                        .get(dep)
                        .unwrap_or_else(|| panic!("{} depends on a missing task", task.name));
                    assert!(
                        prereq.phase_order() <= task.phase_order(),
                        "{}/{}: {} depends on later {}",
                        template.name,
                        size,
                        task.name,
                        prereq.name
                    );
                }
            }
        }
    }
}

#[test]
fn test_generated_tasks_come_in_dependency_order() {
    for template in BUILTIN_TEMPLATES {
        for size in SIZES {
            let tasks = generate(template.name, size);
            let position: HashMap<&TaskId, usize> =
                tasks.iter().enumerate().map(|(i, t)| (&t.id, i)).collect();
            for (i, task) in tasks.iter().enumerate() {
                assert!(task.dependencies.iter().all(|dep| position[dep] < i));
            }
        }
    }
}

#[test]
fn test_task_count_grows_with_size() {
    for template in BUILTIN_TEMPLATES {
        let counts: Vec<usize> = SIZES
            .iter()
            .map(|size| generate(template.name, *size).len())
            .collect();
        assert!(counts.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", counts);
    }
}

#[test]
fn test_generated_phases_round_trip_through_analysis() {
    for template in BUILTIN_TEMPLATES {
        let expected: BTreeSet<String> =
            template.phase_names().into_iter().map(String::from).collect();
        let state = analyze(&generate(template.name, ProjectSize::Medium));
        let found: BTreeSet<String> = state.phases.into_iter().collect();
        assert_eq!(found, expected, "{}", template.name);
    }
}

#[test]
fn test_excluded_phases_stay_out_of_analysis() {
    for template in BUILTIN_TEMPLATES {
        for excluded in template.phase_names() {
            let request = ProjectRequest::new(template.name, "Property").exclude([excluded]);
            let project = ProjectGenerator::new()
                .generate(&request)
                .expect("excluding one phase is allowed");
            let state = analyze(&project.tasks);
            assert!(
                !state.phases.iter().any(|p| p == excluded),
                "{} still reports {}",
                template.name,
                excluded
            );
            assert_eq!(state.phases.len(), template.phases.len() - 1);
        }
    }
}

#[test]
fn test_empty_board_state_is_fixed() {
    let state = analyze(&[]);
    assert_eq!(state, BoardState::empty());
    assert_eq!(state, analyze(&Vec::new()));
    assert!(state.phases.is_empty());
    assert!(state.components.is_empty());
}

#[test]
fn test_structure_score_stays_in_unit_range() {
    let mut boards = vec![chaotic_board(), structured_board(), login_release_board()];
    for template in BUILTIN_TEMPLATES {
        boards.push(generate(template.name, ProjectSize::Enterprise));
    }
    let mut noisy = Vec::new();
    for i in 0..40 {
        let priority = match i % 4 {
            0 => Priority::Low,
            1 => Priority::Medium,
            2 => Priority::High,
            _ => Priority::Urgent,
        };
        noisy.push(
            Task::with_id(format!("n{}", i), "Task", &"x".repeat(i * 3))
                .priority(priority)
                .labels(["a", "b", "c"])
                .estimate(i as f64),
        );
    }
    boards.push(noisy);

    for board in &boards {
        let state = analyze(board);
        assert!((0.0..=1.0).contains(&state.structure_score));
        assert_eq!(state.task_count(), board.len());
    }
}

#[test]
fn test_handed_out_task_is_always_ready() {
    let scheduler = AdaptiveScheduler::default();
    let prefs = PreferenceStore::new();
    for template in BUILTIN_TEMPLATES {
        let mut tasks = generate(template.name, ProjectSize::Medium);
        let mut handed = Vec::new();
        // Finish tasks one by one; every hand-out must have its
        // prerequisites done.
        while let Some(task) =
            scheduler.next_task("agent1", &skills(&["backend"]), &tasks, &[], &prefs)
        {
            for dep in &task.dependencies {
                let prereq = tasks.iter().find(|t| &t.id == dep).expect("dependency exists");
                assert_eq!(prereq.status, TaskStatus::Done);
            }
            let slot = tasks
                .iter_mut()
                .find(|t| t.id == task.id)
                .expect("task is on the board");
            slot.complete();
            handed.push(task.id);
        }
        assert_eq!(handed.len(), tasks.len(), "{} stalled", template.name);
    }
}
