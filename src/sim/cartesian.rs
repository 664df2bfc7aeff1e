//! Straight-line Cartesian stepping for gantry groups.

use super::world::tip_position;
use crate::core::interfaces::{CartesianPath, CartesianPathOracle, CartesianRequest};
use crate::core::model::{CartesianTarget, ManipulationGroup, RobotConfiguration};
use nalgebra::{Point3, Vector3};

/// Moves the group's base-translation joints along the requested line. The
/// walk stops at the first step that leaves the joint limits or fails the
/// validity callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearCartesianOracle;

impl LinearCartesianOracle {
    pub fn new() -> Self {
        Self
    }
}

impl CartesianPathOracle for LinearCartesianOracle {
    fn compute_cartesian_path(
        &self,
        start: &RobotConfiguration,
        request: &CartesianRequest<'_>,
        is_valid: &dyn Fn(&RobotConfiguration) -> bool,
    ) -> CartesianPath {
        let group = request.group;
        let Some(tip_joints) = &group.base_joints else {
            tracing::debug!(group = group.name.as_str(), "group has no translation joints");
            return stalled(start);
        };
        let Some(origin) = tip_position(tip_joints, start) else {
            return stalled(start);
        };

        let targets: Vec<Point3<f64>> = match request.target {
            CartesianTarget::Direction {
                direction,
                distance,
            } => vec![origin + direction * *distance],
            CartesianTarget::Waypoints(poses) => poses
                .iter()
                .map(|pose| Point3::from(pose.translation.vector))
                .collect(),
        };
        let total: f64 = polyline_length(origin, &targets);
        if total <= f64::EPSILON {
            return stalled(start);
        }

        let mut configurations = vec![start.clone()];
        let mut travelled = 0.0;
        let mut from = origin;
        'segments: for target in &targets {
            let segment: Vector3<f64> = target - from;
            let length = segment.norm();
            let steps = (length / request.max_step - 1e-9).ceil().max(1.0) as usize;
            for k in 1..=steps {
                let t = (k as f64 / steps as f64).min(1.0);
                let tip = from + segment * t;
                let Some(next) = place_tip(start, group, tip_joints, &tip) else {
                    break 'segments;
                };
                if !is_valid(&next) {
                    break 'segments;
                }
                configurations.push(next);
                travelled += length / steps as f64;
            }
            from = *target;
        }

        let achieved = match request.target {
            CartesianTarget::Direction { .. } => travelled,
            CartesianTarget::Waypoints(_) => (travelled / total).min(1.0),
        };
        if configurations.len() < 2 {
            return stalled(start);
        }
        CartesianPath {
            achieved,
            configurations,
        }
    }
}

fn stalled(start: &RobotConfiguration) -> CartesianPath {
    CartesianPath {
        achieved: 0.0,
        configurations: vec![start.clone()],
    }
}

fn polyline_length(origin: Point3<f64>, points: &[Point3<f64>]) -> f64 {
    let mut from = origin;
    let mut length = 0.0;
    for point in points {
        length += (point - from).norm();
        from = *point;
    }
    length
}

/// `start` with the tip joints moved to `tip`, or `None` outside the limits.
pub(crate) fn place_tip(
    start: &RobotConfiguration,
    group: &ManipulationGroup,
    tip_joints: &[String; 3],
    tip: &Point3<f64>,
) -> Option<RobotConfiguration> {
    let mut next = start.clone();
    for (axis, joint) in tip_joints.iter().enumerate() {
        let value = tip[axis];
        if let Some(spec) = group.joints.iter().find(|j| &j.name == joint)
            && (value < spec.min || value > spec.max)
        {
            return None;
        }
        next = next.with_position(joint, value).ok()?;
    }
    Some(next)
}
