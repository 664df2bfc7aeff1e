use std::path::PathBuf;
use std::sync::Arc;

use armflow::ArmflowError;
use armflow::core::model::PlanErrorCode;
use armflow::error::PlanningError;
use armflow::runtime::observability::ObserverEvent;
use armflow::sim::EXPERIENCE_FILE;

use super::sim_harness::{ARM, FailingPlanner, Harness, object_box};

#[test]
fn failing_planner_is_called_exactly_five_times() {
    let planner = Arc::new(FailingPlanner::new(PlanErrorCode::TimedOut));
    let mut h = Harness::builder().planner(planner.clone()).build();

    let err = h
        .manipulation
        .move_to_named_pose(ARM, "ready", true)
        .unwrap_err();

    assert_eq!(planner.calls(), 5);
    match err {
        ArmflowError::Planning(PlanningError::Exhausted { attempts, last }) => {
            assert_eq!(attempts, 5);
            assert_eq!(last, PlanErrorCode::TimedOut);
        }
        other => panic!("unexpected error {other}"),
    }
    let attempts: Vec<u32> = h
        .observer
        .events()
        .iter()
        .filter_map(|event| match event {
            ObserverEvent::PlanAttempt { attempt, .. } => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(attempts, vec![1, 2, 3, 4, 5]);
    assert_eq!(
        h.observer.count(
            |e| matches!(e, ObserverEvent::Error { component, .. } if component == "planning")
        ),
        1
    );
    assert_eq!(h.sim.runtime.dispatch_count(), 0);
}

#[test]
fn blocked_straight_line_exhausts_the_planner() {
    let mut h = Harness::builder()
        .obstacle(object_box("front_wall", [0.15, 0.0, 1.1], 0.03))
        .build();

    let err = h
        .manipulation
        .move_to_named_pose(ARM, "ready", true)
        .unwrap_err();

    assert!(matches!(
        err,
        ArmflowError::Planning(PlanningError::Exhausted {
            attempts: 5,
            last: PlanErrorCode::PlanningFailed
        })
    ));
    assert!((h.joint("gantry_z") - 1.2).abs() < 1e-9);
}

#[test]
fn configured_retry_budget_is_respected() {
    let planner = Arc::new(FailingPlanner::new(PlanErrorCode::PlanningFailed));
    let mut h = Harness::builder()
        .configure(|config| config.planning.max_plan_attempts = 2)
        .planner(planner.clone())
        .build();

    assert!(h.manipulation.move_to_named_pose(ARM, "ready", true).is_err());
    assert_eq!(planner.calls(), 2);
}

#[test]
fn experience_database_is_saved_after_a_successful_plan() {
    let mut h = Harness::builder()
        .configure(|config| {
            config.planning.use_experience = true;
            config.planning.experience_log_path =
                Some(PathBuf::from(&config.package_root).join("logs").join("experience.jsonl"));
        })
        .build();

    h.manipulation
        .move_to_named_pose(ARM, "ready", true)
        .unwrap();
    h.manipulation
        .move_to_named_pose(ARM, "home", true)
        .unwrap();

    let saved = std::fs::read_to_string(h.tmp.path().join(EXPERIENCE_FILE)).unwrap();
    assert!(saved.contains("right_arm"));
    let log = std::fs::read_to_string(h.tmp.path().join("logs").join("experience.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 2);
}
