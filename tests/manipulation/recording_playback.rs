use std::sync::Arc;
use std::time::Duration;

use armflow::ArmflowError;
use armflow::core::model::RobotConfiguration;
use armflow::error::{MotionError, PersistenceError};
use armflow::execution::OperatorChannel;
use armflow::manipulation::MoveOutcome;

use super::sim_harness::{ARM, Harness};

fn line(configuration: &RobotConfiguration) -> String {
    configuration
        .positions()
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn write_recording(h: &Harness, name: &str, waypoints: &[&[(&str, f64)]]) -> std::path::PathBuf {
    let path = h.tmp.path().join(name);
    let text: Vec<String> = waypoints
        .iter()
        .map(|joints| line(&h.goal_with(joints)))
        .collect();
    std::fs::write(&path, text.join("\n") + "\n").unwrap();
    path
}

#[test]
fn recording_runs_until_stop_and_resets_the_flag() {
    let h = Harness::new();
    let path = h.tmp.path().join("recordings").join("jog.csv");
    let operator = Arc::clone(&h.sim.operator);

    let samples = std::thread::scope(|scope| {
        scope.spawn(|| {
            std::thread::sleep(Duration::from_millis(30));
            operator.set_stop(true);
        });
        h.manipulation.record_trajectory_to_file(&path).unwrap()
    });

    assert!(samples >= 1);
    assert!(!h.sim.operator.stop_requested());
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), samples);
    for row in text.lines() {
        assert_eq!(row.split(',').count(), 7);
    }
    let loaded = h.manipulation.load_recording(&path).unwrap();
    assert_eq!(loaded[0], h.manipulation.current_configuration());
}

#[test]
fn playback_dispatches_the_whole_recording_at_once() {
    let mut h = Harness::new();
    let path = write_recording(
        &h,
        "pick.csv",
        &[
            &[],
            &[("gantry_x", 0.1), ("gantry_z", 1.1)],
            &[("gantry_x", 0.2), ("gantry_z", 1.0)],
        ],
    );

    let outcome = h
        .manipulation
        .playback_trajectory_from_file(&path, ARM, 0.5)
        .unwrap();

    assert!(matches!(outcome, MoveOutcome::Executed { points } if points >= 20));
    assert_eq!(h.sim.runtime.dispatch_count(), 1);
    assert!((h.joint("gantry_x") - 0.2).abs() < 1e-9);
    assert!((h.joint("gantry_z") - 1.0).abs() < 1e-9);
}

#[test]
fn long_recording_still_gets_an_interpolation_pass() {
    let mut h = Harness::new();
    let samples: Vec<Vec<(&str, f64)>> = (0..25)
        .map(|i| vec![("gantry_x", f64::from(i) * 0.01)])
        .collect();
    let waypoints: Vec<&[(&str, f64)]> = samples.iter().map(Vec::as_slice).collect();
    let path = write_recording(&h, "long.csv", &waypoints);

    let outcome = h
        .manipulation
        .playback_trajectory_from_file(&path, ARM, 0.5)
        .unwrap();

    // 24 segments split into quarters, plus the final sample
    assert!(matches!(outcome, MoveOutcome::Executed { points } if points >= 97));
    assert!((h.joint("gantry_x") - 0.24).abs() < 1e-9);
}

#[test]
fn playback_approaches_the_first_sample_at_the_requested_scale() {
    let mut h = Harness::new();
    let path = write_recording(
        &h,
        "offset.csv",
        &[&[("gantry_x", 0.1)], &[("gantry_x", 0.2)]],
    );

    h.manipulation
        .playback_trajectory_from_file(&path, ARM, 0.25)
        .unwrap();

    let dispatched = h.sim.runtime.dispatched();
    assert_eq!(dispatched.len(), 2);
    // 0.1 of travel at unit max velocity scaled by 0.25
    let approach = dispatched[0].duration().as_secs_f64();
    assert!((approach - 0.4).abs() < 1e-6, "approach took {approach}");
}

#[test]
fn interactive_playback_moves_one_configuration_at_a_time() {
    let mut h = Harness::new();
    let path = write_recording(
        &h,
        "steps.csv",
        &[&[], &[("gantry_y", 0.1)], &[("gantry_y", 0.2)]],
    );

    let reached = h
        .manipulation
        .playback_trajectory_interactive(&path, ARM, 0.5)
        .unwrap();

    assert_eq!(reached, 3);
    assert_eq!(h.sim.runtime.dispatch_count(), 2);
    assert!((h.joint("gantry_y") - 0.2).abs() < 1e-9);
}

#[test]
fn interactive_playback_honours_stop() {
    let mut h = Harness::new();
    let path = write_recording(&h, "steps.csv", &[&[("gantry_y", 0.1)]]);
    h.sim.operator.set_stop(true);

    let err = h
        .manipulation
        .playback_trajectory_interactive(&path, ARM, 0.5)
        .unwrap_err();

    assert!(matches!(err, ArmflowError::Motion(MotionError::Stopped)));
    assert!(!h.sim.operator.stop_requested());
    assert_eq!(h.sim.runtime.dispatch_count(), 0);
}

#[test]
fn malformed_recording_reports_the_line() {
    let h = Harness::new();
    let path = h.tmp.path().join("bad.csv");
    let good = line(&h.manipulation.current_configuration());
    std::fs::write(&path, format!("{good}\n0,0,abc,0,0,0,0\n")).unwrap();

    let err = h.manipulation.load_recording(&path).unwrap_err();

    assert!(matches!(
        err,
        ArmflowError::Persistence(PersistenceError::Parse { line: 2, .. })
    ));
}

#[test]
fn empty_recording_is_rejected() {
    let h = Harness::new();
    let path = h.tmp.path().join("empty.csv");
    std::fs::write(&path, "\n").unwrap();

    let err = h.manipulation.load_recording(&path).unwrap_err();

    assert!(matches!(err, ArmflowError::Motion(MotionError::EmptyRecording(_))));
}

#[test]
fn stationary_robot_settles() {
    let h = Harness::new();
    assert!(h.manipulation.wait_for_robot_to_stop(Duration::from_secs(1)));
}
