//! Collision recovery: pick one bounded escape motion from a collision report.

use super::model::CollisionReport;
use crate::config::{RecoveryConfig, RecoveryRule};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EscapeMotion {
    /// Back away from the work surface.
    Retreat,
    Raise,
    StrafeLeft,
    StrafeRight,
    /// Planned move to the home pose; used when no world object is involved.
    ReturnHome,
}

impl EscapeMotion {
    /// Motions eligible for the random fallback.
    pub const RANDOM_CHOICES: [Self; 4] = [Self::Retreat, Self::Raise, Self::StrafeLeft, Self::StrafeRight];

    /// World-frame unit direction of the straight-line escape.
    pub fn direction(self) -> Option<Vector3<f64>> {
        match self {
            Self::Retreat => Some(Vector3::new(-1.0, 0.0, 0.0)),
            Self::Raise => Some(Vector3::new(0.0, 0.0, 1.0)),
            Self::StrafeLeft => Some(Vector3::new(0.0, 1.0, 0.0)),
            Self::StrafeRight => Some(Vector3::new(0.0, -1.0, 0.0)),
            Self::ReturnHome => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryDecision {
    /// World object found in the report, if any.
    pub object: Option<String>,
    pub motion: EscapeMotion,
    pub distance: f64,
    /// The motion came from the random fallback.
    pub randomized: bool,
}

pub struct RecoveryPlanner {
    rules: Vec<RecoveryRule>,
    escape_distance: f64,
    rng: Box<dyn RngCore + Send>,
}

impl RecoveryPlanner {
    /// Planner whose random fallback draws from the OS entropy source.
    pub fn new(config: &RecoveryConfig) -> Self {
        Self::with_rng(config, Box::new(StdRng::from_os_rng()))
    }

    pub fn with_seed(config: &RecoveryConfig, seed: u64) -> Self {
        Self::with_rng(config, Box::new(StdRng::seed_from_u64(seed)))
    }

    pub fn with_rng(config: &RecoveryConfig, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            rules: config.rules.clone(),
            escape_distance: config.escape_distance,
            rng,
        }
    }

    /// Escape motion for the first world-object contact in `report`.
    pub fn decide(&mut self, report: &CollisionReport) -> RecoveryDecision {
        match report.first_world_object() {
            Some(object) => {
                let (motion, randomized) = self.classify(object);
                RecoveryDecision {
                    object: Some(object.to_string()),
                    motion,
                    distance: self.escape_distance,
                    randomized,
                }
            }
            None => RecoveryDecision {
                object: None,
                motion: EscapeMotion::ReturnHome,
                distance: 0.0,
                randomized: false,
            },
        }
    }

    /// Motion for a named world object; unmatched names get a uniform draw.
    pub fn classify(&mut self, object: &str) -> (EscapeMotion, bool) {
        if let Some(rule) = self.rules.iter().find(|rule| object.starts_with(&rule.prefix)) {
            return (rule.motion, false);
        }
        let index = self.rng.random_range(0..EscapeMotion::RANDOM_CHOICES.len());
        tracing::debug!(object, index, "unclassified collision object, choosing escape at random");
        (EscapeMotion::RANDOM_CHOICES[index], true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{BodyKind, Contact};
    use std::collections::HashMap;

    fn planner(seed: u64) -> RecoveryPlanner {
        RecoveryPlanner::with_seed(&RecoveryConfig::default(), seed)
    }

    fn report_with(object: &str) -> CollisionReport {
        CollisionReport::new(vec![Contact::new(
            "ee_link",
            BodyKind::RobotLink,
            object,
            BodyKind::WorldObject,
        )])
    }

    #[test]
    fn known_prefixes_map_to_fixed_motions() {
        let mut p = planner(1);
        assert_eq!(p.classify("product_17"), (EscapeMotion::Retreat, false));
        assert_eq!(p.classify("front_wall"), (EscapeMotion::Retreat, false));
        assert_eq!(p.classify("shelf_top"), (EscapeMotion::Retreat, false));
        assert_eq!(p.classify("goal_bin"), (EscapeMotion::Raise, false));
        assert_eq!(p.classify("right_wall_A"), (EscapeMotion::StrafeLeft, false));
        assert_eq!(p.classify("left_wall_B"), (EscapeMotion::StrafeRight, false));
    }

    #[test]
    fn decision_carries_escape_distance() {
        let decision = planner(1).decide(&report_with("product_3"));
        assert_eq!(decision.object.as_deref(), Some("product_3"));
        assert!((decision.distance - 0.2).abs() < f64::EPSILON);
        assert!(!decision.randomized);
    }

    #[test]
    fn self_collision_only_returns_home() {
        let report = CollisionReport::new(vec![Contact::new(
            "link_2",
            BodyKind::RobotLink,
            "link_5",
            BodyKind::RobotLink,
        )]);
        let decision = planner(1).decide(&report);
        assert_eq!(decision.motion, EscapeMotion::ReturnHome);
        assert!(decision.object.is_none());
        assert!(EscapeMotion::ReturnHome.direction().is_none());
    }

    #[test]
    fn same_seed_same_choice() {
        let (mut first, mut second) = (planner(42), planner(42));
        let a: Vec<_> = (0..20).map(|_| first.classify("widget_42")).collect();
        let b: Vec<_> = (0..20).map(|_| second.classify("widget_42")).collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|(_, randomized)| *randomized));
    }

    #[test]
    fn unclassified_objects_spread_over_all_four_motions() {
        let mut p = planner(7);
        let mut counts: HashMap<EscapeMotion, usize> = HashMap::new();
        for _ in 0..1000 {
            *counts.entry(p.classify("widget_42").0).or_default() += 1;
        }
        assert_eq!(counts.len(), 4);
        for motion in EscapeMotion::RANDOM_CHOICES {
            let n = counts[&motion];
            assert!((180..=320).contains(&n), "{motion}: {n}");
        }
    }

    #[test]
    fn directions_are_unit_length() {
        for motion in EscapeMotion::RANDOM_CHOICES {
            let d = motion.direction().unwrap();
            assert!((d.norm() - 1.0).abs() < 1e-12);
        }
    }
}
