use std::time::Duration;

use armflow::ArmflowError;
use armflow::core::model::{ExecutionOutcome, PlanErrorCode};
use armflow::error::{ExecutionError, HealthError};
use armflow::execution::persist;
use armflow::runtime::observability::{ObserverEvent, ObserverMetric};

use super::sim_harness::{ARM, Harness};

#[test]
fn failed_outcomes_map_to_codes_and_demote_autonomy() {
    for outcome in [
        ExecutionOutcome::Preempted,
        ExecutionOutcome::TimedOut,
        ExecutionOutcome::ControlFailed,
    ] {
        let mut h = Harness::builder()
            .configure(|config| config.execution.autonomous = true)
            .build();
        h.sim.runtime.script(outcome);

        let err = h
            .manipulation
            .move_to_named_pose(ARM, "ready", true)
            .unwrap_err();

        let ArmflowError::Execution(execution) = err else {
            panic!("expected an execution error for {outcome}");
        };
        assert!(matches!(execution, ExecutionError::Failed(o) if o == outcome));
        assert_eq!(execution.code(), outcome.error_code());
        assert_ne!(execution.code(), PlanErrorCode::Success);
        assert!(!h.manipulation.operator().autonomous());
        assert_eq!(
            h.observer
                .count(|e| matches!(e, ObserverEvent::AutonomyDemoted { .. })),
            1
        );
        assert!((h.joint("gantry_z") - 1.2).abs() < 1e-9, "robot must not move on {outcome}");
    }
}

#[test]
fn successful_dispatch_keeps_autonomy() {
    let mut h = Harness::builder()
        .configure(|config| config.execution.autonomous = true)
        .build();

    h.manipulation
        .move_to_named_pose(ARM, "ready", true)
        .unwrap();

    assert!(h.manipulation.operator().autonomous());
    let finished: Vec<ExecutionOutcome> = h
        .observer
        .events()
        .iter()
        .filter_map(|event| match event {
            ObserverEvent::ExecutionFinished { outcome, .. } => Some(*outcome),
            _ => None,
        })
        .collect();
    assert_eq!(finished, vec![ExecutionOutcome::Succeeded]);
    assert!(
        h.observer
            .metrics()
            .iter()
            .any(|m| matches!(m, ObserverMetric::TrajectoryPoints(n) if *n >= 20))
    );
}

#[test]
fn rejected_push_fails_without_demotion() {
    let mut h = Harness::builder()
        .configure(|config| config.execution.autonomous = true)
        .build();
    h.sim.runtime.set_reject_push(true);

    let err = h
        .manipulation
        .move_to_named_pose(ARM, "ready", true)
        .unwrap_err();

    assert!(matches!(err, ArmflowError::Execution(ExecutionError::PushRejected)));
    assert!(h.manipulation.operator().autonomous());
    assert_eq!(h.sim.runtime.dispatch_count(), 0);
}

#[test]
fn non_autonomous_arm_move_waits_for_operator() {
    let mut h = Harness::builder().attended().build();

    std::thread::scope(|scope| {
        let manipulation = &mut h.manipulation;
        let mover = scope.spawn(move || manipulation.move_to_named_pose(ARM, "ready", true));

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(h.sim.runtime.dispatch_count(), 0);
        // snapshot is written before the confirmation wait
        assert!(persist::trajectory_file(&h.config.trajectory_dir()).exists());

        h.sim.operator.advance();
        let outcome = mover.join().unwrap().unwrap();
        assert!(outcome.executed());
    });

    assert_eq!(h.sim.runtime.dispatch_count(), 1);
    assert_eq!(h.sim.operator.pending_steps(), 0);
}

#[test]
fn gripper_move_never_waits_for_operator() {
    let mut h = Harness::builder().attended().build();

    let outcome = h.manipulation.set_end_effector(ARM, true).unwrap();

    assert!(outcome.executed());
    assert_eq!(h.sim.runtime.dispatch_count(), 1);
}

#[test]
fn autonomous_arm_move_does_not_wait() {
    let mut h = Harness::builder()
        .attended()
        .configure(|config| config.execution.autonomous = true)
        .build();

    h.manipulation
        .move_to_named_pose(ARM, "ready", true)
        .unwrap();

    assert_eq!(h.sim.runtime.dispatch_count(), 1);
}

#[test]
fn unreachable_controller_manager_fails_health_check() {
    let mut h = Harness::new();
    h.sim.controllers.set_unreachable(true);

    let err = h.manipulation.ensure_controllers_healthy().unwrap_err();

    assert!(matches!(
        err,
        ArmflowError::Execution(ExecutionError::Health(HealthError::ServiceUnreachable { .. }))
    ));
}

#[test]
fn stopped_controller_gives_up_after_poll_cap() {
    let mut h = Harness::new();
    h.sim
        .controllers
        .set_state("kinova", "ee_velocity_trajectory_controller", "stopped");

    let err = h
        .manipulation
        .move_to_named_pose(ARM, "ready", true)
        .unwrap_err();

    assert!(matches!(
        err,
        ArmflowError::Execution(ExecutionError::Health(HealthError::Unhealthy { polls: 3, .. }))
    ));
    assert_eq!(h.sim.runtime.dispatch_count(), 0);
    assert_eq!(
        h.observer
            .count(|e| matches!(e, ObserverEvent::ControllerUnhealthy { unit, .. } if unit == "kinova")),
        3
    );
}

#[test]
fn health_is_checked_once_before_first_dispatch() {
    let mut h = Harness::new();

    h.manipulation
        .move_to_named_pose(ARM, "ready", true)
        .unwrap();
    let after_first = h.sim.controllers.query_count();
    h.manipulation
        .move_to_named_pose(ARM, "home", true)
        .unwrap();

    assert_eq!(after_first, 2);
    assert_eq!(h.sim.controllers.query_count(), after_first);
}

#[test]
fn health_check_can_be_disabled() {
    let mut h = Harness::builder()
        .configure(|config| config.execution.check_controller_health = false)
        .build();
    h.sim.controllers.set_unreachable(true);

    h.manipulation
        .move_to_named_pose(ARM, "ready", true)
        .unwrap();

    assert_eq!(h.sim.controllers.query_count(), 0);
}
