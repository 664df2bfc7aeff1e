use armflow::ArmflowError;
use armflow::core::model::CollisionMode;
use armflow::error::MotionError;
use armflow::execution::persist;
use armflow::manipulation::MoveOutcome;
use armflow::runtime::observability::ObserverEvent;
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use super::sim_harness::{ARM, HAND, Harness, object_box};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn move_to_current_configuration_is_a_no_op() {
    let mut h = Harness::new();
    let current = h.manipulation.current_configuration();

    let outcome = h.manipulation.move_to(&current, ARM, 0.2, true).unwrap();

    assert_eq!(outcome, MoveOutcome::AlreadySatisfied);
    assert_eq!(h.sim.runtime.dispatch_count(), 0);
    assert_eq!(h.sim.runtime.clear_count(), 0);
    assert!(!h.trajectory_file().exists());
}

#[test]
fn named_pose_move_dispatches_and_persists_snapshot() {
    let mut h = Harness::new();

    let outcome = h
        .manipulation
        .move_to_named_pose(ARM, "ready", true)
        .unwrap();

    let MoveOutcome::Executed { points } = outcome else {
        panic!("expected a dispatch, got {outcome:?}");
    };
    assert!(points >= 20, "conditioned plan has {points} points");
    assert_eq!(h.sim.runtime.dispatch_count(), 1);
    assert!(close(h.joint("gantry_x"), 0.3));
    assert!(close(h.joint("gantry_z"), 1.0));

    let csv = std::fs::read_to_string(h.trajectory_file()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), points + 1);
    assert!(lines[0].starts_with("time_from_start,gantry_x_pos,gantry_x_vel"));
    let fields = lines[1].split(',').count();
    assert!(fields == 1 + 2 * 5 || fields == 1 + 3 * 5);

    let restored = persist::read(&h.trajectory_file(), ARM).unwrap();
    assert_eq!(restored.len(), points);
    assert_eq!(restored.joint_names(), h.sim.runtime.dispatched()[0].joint_names());
}

#[test]
fn invalid_goal_is_refused_before_planning() {
    let mut h = Harness::builder()
        .obstacle(object_box("product_3", [0.3, 0.0, 1.0], 0.05))
        .build();

    let err = h
        .manipulation
        .move_to_named_pose(ARM, "ready", true)
        .unwrap_err();

    assert!(err.to_string().contains("validity"), "{err}");
    assert_eq!(h.sim.runtime.dispatch_count(), 0);
    assert_eq!(h.observer.count(|e| matches!(e, ObserverEvent::PlanAttempt { .. })), 0);
}

#[test]
fn direct_move_interpolates_without_the_planner() {
    let mut h = Harness::new();
    let goal = h.goal_with(&[("gantry_y", 0.4), ("wrist_roll", 0.5)]);

    let outcome = h.manipulation.execute_state(&goal, ARM, 0.3).unwrap();

    assert!(outcome.executed());
    assert!(close(h.joint("gantry_y"), 0.4));
    assert!(close(h.joint("wrist_roll"), 0.5));
    assert_eq!(h.observer.count(|e| matches!(e, ObserverEvent::PlanAttempt { .. })), 0);
    let dispatched = h.sim.runtime.dispatched();
    let first = dispatched[0].first().unwrap();
    let last = dispatched[0].last().unwrap();
    assert!(first.time_from_start < last.time_from_start);
}

#[test]
fn vertical_and_retreat_paths_move_the_tip() {
    let mut h = Harness::new();

    let lift = h
        .manipulation
        .execute_vertical_path(ARM, 0.1, true, CollisionMode::Full)
        .unwrap();
    assert!(close(lift.achieved, 0.1));
    assert!(close(h.joint("gantry_z"), 1.3));

    let back = h
        .manipulation
        .execute_retreat_path(ARM, 0.05, true, CollisionMode::Full)
        .unwrap();
    assert!(close(back.achieved, 0.05));
    assert!(close(h.joint("gantry_x"), -0.05));

    h.manipulation
        .execute_horizontal_path(ARM, 0.2, true, CollisionMode::Full)
        .unwrap();
    assert!(close(h.joint("gantry_y"), 0.2));
}

#[test]
fn blocked_path_is_accepted_with_a_shortfall_warning() {
    let mut h = Harness::builder()
        .obstacle(object_box("shelf_bottom", [0.0, 0.0, 1.0], 0.12))
        .build();

    let motion = h
        .manipulation
        .execute_vertical_path(ARM, 0.2, false, CollisionMode::Full)
        .unwrap();

    assert!(motion.achieved > 0.0 && motion.achieved < 0.1, "{motion:?}");
    assert!(close(motion.desired, 0.2));
    assert!(h.joint("gantry_z") > 1.12);
    assert_eq!(
        h.observer
            .count(|e| matches!(e, ObserverEvent::CartesianShortfall { .. })),
        1
    );
}

#[test]
fn ignoring_the_world_passes_through_obstacles() {
    let mut h = Harness::builder()
        .obstacle(object_box("shelf_bottom", [0.0, 0.0, 1.0], 0.12))
        .build();

    let motion = h
        .manipulation
        .execute_vertical_path(ARM, 0.2, false, CollisionMode::SelfOnly)
        .unwrap();

    assert!(close(motion.achieved, 0.2));
    assert!(close(h.joint("gantry_z"), 1.0));
}

#[test]
fn stalled_synthesis_exhausts_its_attempts() {
    let mut h = Harness::builder()
        .obstacle(object_box("shelf_top", [0.0, 0.0, 1.205], 0.01))
        .start_at(&[("gantry_z", 1.19)])
        .build();

    let err = h
        .manipulation
        .execute_vertical_path(ARM, 0.1, true, CollisionMode::Full)
        .unwrap_err();

    assert!(err.to_string().contains("10 attempts"), "{err}");
    assert_eq!(h.sim.runtime.dispatch_count(), 0);
}

#[test]
fn approach_path_ends_at_the_grasp() {
    let h = Harness::new();
    let grasp = h.goal_with(&[("gantry_x", 0.5), ("gantry_z", 1.0)]);

    let approach = h
        .manipulation
        .generate_approach_path(&grasp, ARM, Vector3::x(), None)
        .unwrap();

    assert!(close(approach.pre_grasp.position("gantry_x").unwrap(), 0.4));
    let last = approach.trajectory.last().unwrap();
    assert!(close(last.positions[0], 0.5));
    assert!(approach.trajectory.len() >= 20);
    assert_eq!(h.sim.runtime.dispatch_count(), 0);
}

#[test]
fn gripper_moves_never_persist() {
    let mut h = Harness::new();

    let opened = h.manipulation.set_end_effector(ARM, true).unwrap();
    assert!(opened.executed());
    assert!(close(h.joint("finger_1"), 0.04));
    assert_eq!(h.sim.runtime.dispatched()[0].group_name(), HAND);
    assert!(!h.trajectory_file().exists());

    let again = h.manipulation.set_end_effector(ARM, true).unwrap();
    assert_eq!(again, MoveOutcome::AlreadySatisfied);
    assert_eq!(h.sim.runtime.dispatch_count(), 1);
}

fn pose(x: f64, y: f64, z: f64) -> Isometry3<f64> {
    Isometry3::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity())
}

#[test]
fn end_effector_pose_move_solves_ik_then_plans() {
    let mut h = Harness::new();

    let outcome = h
        .manipulation
        .move_end_effector_to_pose(&pose(0.2, -0.1, 1.0), None, 0.2)
        .unwrap();

    assert!(outcome.executed());
    assert_eq!(h.sim.runtime.dispatch_count(), 1);
    assert!(close(h.joint("gantry_x"), 0.2));
    assert!(close(h.joint("gantry_y"), -0.1));
    assert!(close(h.joint("gantry_z"), 1.0));
}

#[test]
fn unreachable_or_blocked_pose_has_no_ik_solution() {
    let mut h = Harness::builder()
        .obstacle(object_box("product_3", [0.3, 0.0, 1.0], 0.05))
        .build();

    for target in [pose(3.0, 0.0, 1.0), pose(0.3, 0.0, 1.0)] {
        let err = h
            .manipulation
            .move_end_effector_to_pose(&target, Some(ARM), 0.2)
            .unwrap_err();
        assert!(matches!(
            err,
            ArmflowError::Motion(MotionError::NoIkSolution { ref group }) if group == ARM
        ));
    }
    assert_eq!(h.sim.runtime.dispatch_count(), 0);
}
