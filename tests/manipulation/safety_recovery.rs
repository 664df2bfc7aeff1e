use armflow::ArmflowError;
use armflow::core::model::{BodyKind, CollisionReport, Contact};
use armflow::core::recovery::EscapeMotion;
use armflow::error::RecoveryError;
use armflow::runtime::observability::ObserverEvent;

use super::sim_harness::{ARM, Harness, object_box};

fn tip(h: &Harness) -> [f64; 3] {
    [h.joint("gantry_x"), h.joint("gantry_y"), h.joint("gantry_z")]
}

fn selected(h: &Harness) -> Vec<(Option<String>, EscapeMotion, bool)> {
    h.observer
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ObserverEvent::RecoverySelected {
                object,
                motion,
                randomized,
            } => Some((object, motion, randomized)),
            _ => None,
        })
        .collect()
}

#[test]
fn shelf_contact_retreats_and_demotes() {
    let mut h = Harness::builder()
        .configure(|config| config.execution.autonomous = true)
        .obstacle(object_box("shelf_1", [0.0, 0.0, 1.2], 0.05))
        .build();

    let valid = h.manipulation.fix_current_collision_and_bounds(ARM).unwrap();

    assert!(!valid);
    assert!(!h.manipulation.operator().autonomous());
    assert_eq!(
        selected(&h),
        vec![(Some("shelf_1".to_string()), EscapeMotion::Retreat, false)]
    );
    let [x, y, z] = tip(&h);
    assert!((x + 0.2).abs() < 1e-6 && y.abs() < 1e-9 && (z - 1.2).abs() < 1e-9);
}

#[test]
fn goal_bin_contact_raises() {
    let mut h = Harness::builder()
        .obstacle(object_box("goal_bin", [0.0, 0.0, 1.2], 0.05))
        .build();

    h.manipulation.fix_current_collision_and_bounds(ARM).unwrap();

    assert_eq!(selected(&h)[0].1, EscapeMotion::Raise);
    assert!((h.joint("gantry_z") - 1.4).abs() < 1e-6);
}

#[test]
fn blocked_escape_is_reported() {
    let mut h = Harness::builder()
        .start_at(&[("gantry_z", 2.0)])
        .obstacle(object_box("goal_bin", [0.0, 0.0, 2.0], 0.05))
        .build();

    let err = h.manipulation.fix_current_collision_and_bounds(ARM).unwrap_err();

    assert!(matches!(
        err,
        ArmflowError::Recovery(RecoveryError::EscapeFailed {
            motion: EscapeMotion::Raise,
            ..
        })
    ));
    assert_eq!(
        h.observer.count(
            |e| matches!(e, ObserverEvent::Error { component, .. } if component == "recovery")
        ),
        1
    );
    assert_eq!(h.sim.runtime.dispatch_count(), 0);
}

#[test]
fn unknown_object_gets_a_random_escape_of_fixed_length() {
    let mut h = Harness::builder()
        .obstacle(object_box("crate_7", [0.0, 0.0, 1.2], 0.05))
        .build();

    h.manipulation.fix_current_collision_and_bounds(ARM).unwrap();

    let (object, motion, randomized) = selected(&h).remove(0);
    assert_eq!(object.as_deref(), Some("crate_7"));
    assert!(randomized);
    assert!(EscapeMotion::RANDOM_CHOICES.contains(&motion));
    let [x, y, z] = tip(&h);
    let moved = (x * x + y * y + (z - 1.2) * (z - 1.2)).sqrt();
    assert!((moved - 0.2).abs() < 1e-6, "moved {moved}");
}

#[test]
fn self_contact_returns_home() {
    let mut h = Harness::builder()
        .start_at(&[("gantry_x", 0.3), ("gantry_z", 1.0)])
        .build();
    let report = CollisionReport::new(vec![Contact::new(
        "wrist_link",
        BodyKind::RobotLink,
        "ee_link",
        BodyKind::RobotLink,
    )]);

    let decision = h.manipulation.fix_colliding_state(&report).unwrap();

    assert_eq!(decision.motion, EscapeMotion::ReturnHome);
    assert!(decision.object.is_none());
    let [x, _, z] = tip(&h);
    assert!(x.abs() < 1e-6 && (z - 1.2).abs() < 1e-6);
}

#[test]
fn out_of_bounds_start_is_clamped_and_reported_invalid() {
    let mut h = Harness::builder().start_at(&[("gantry_x", 1.7)]).build();

    let valid = h.manipulation.fix_current_collision_and_bounds(ARM).unwrap();

    assert!(!valid);
    assert!((h.joint("gantry_x") - 1.5).abs() < 1e-9);
    assert_eq!(h.sim.runtime.dispatch_count(), 1);
    assert_eq!(
        h.observer
            .count(|e| matches!(e, ObserverEvent::AutonomyDemoted { .. })),
        1
    );
}

#[test]
fn recovery_is_followed_by_a_bounds_fix() {
    let mut h = Harness::builder()
        .start_at(&[("wrist_pitch", 3.5)])
        .obstacle(object_box("shelf_1", [0.0, 0.0, 1.2], 0.05))
        .build();

    let valid = h.manipulation.fix_current_collision_and_bounds(ARM).unwrap();

    assert!(!valid);
    assert_eq!(selected(&h)[0].1, EscapeMotion::Retreat);
    assert_eq!(h.sim.runtime.dispatch_count(), 2);
    assert!((h.joint("gantry_x") + 0.2).abs() < 1e-6);
    assert!((h.joint("wrist_pitch") - 3.0).abs() < 1e-9);
}

#[test]
fn small_bounds_error_is_tolerated() {
    let mut h = Harness::builder().start_at(&[("gantry_x", 1.55)]).build();

    assert!(h.manipulation.fix_current_collision_and_bounds(ARM).unwrap());
    assert_eq!(h.sim.runtime.dispatch_count(), 0);
}

#[test]
fn validity_report_covers_start_and_goal() {
    let h = Harness::new();
    let start = h.manipulation.current_configuration();
    let goal = h.goal_with(&[("gantry_z", 2.5)]);

    let report = h
        .manipulation
        .check_collision_and_bounds(&start, Some(&goal), ARM)
        .unwrap();

    assert!(report.start_in_bounds);
    assert!(!report.goal_in_bounds);
    assert!(!report.is_valid());
    assert!(report.to_string().contains("goal"));

    let start_only = h
        .manipulation
        .check_collision_and_bounds(&start, None, ARM)
        .unwrap();
    assert!(start_only.is_valid());
}

#[test]
fn finger_touch_allows_object_against_hand_and_structure() {
    let h = Harness::builder()
        .obstacle(object_box("product_2", [0.0, 0.0, 1.2], 0.05))
        .build();
    let current = h.manipulation.current_configuration();
    let before = h
        .manipulation
        .check_collision_and_bounds(&current, None, ARM)
        .unwrap();
    assert!(before.start_collision.is_colliding());

    h.manipulation.allow_finger_touch("product_2", ARM).unwrap();

    {
        let world = h.manipulation.scene().read();
        let acm = world.allowed_collisions();
        for body in ["palm_link", "finger_1_link", "finger_2_link", "shelf_bottom", "goal_bin"] {
            assert!(acm.is_allowed("product_2", body), "{body}");
        }
        assert!(!acm.is_allowed("product_2", "wrist_link"));
    }
    let after = h
        .manipulation
        .check_collision_and_bounds(&current, None, ARM)
        .unwrap();
    assert!(!after.start_collision.is_colliding());
}
