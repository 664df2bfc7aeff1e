use nalgebra::{Isometry3, Vector3};

/// What the tip link should do during a Cartesian motion.
#[derive(Debug, Clone, PartialEq)]
pub enum CartesianTarget {
    /// Straight line along `direction` (world frame) for `distance`.
    Direction {
        direction: Vector3<f64>,
        distance: f64,
    },
    /// Ordered world-frame poses for the tip link.
    Waypoints(Vec<Isometry3<f64>>),
}

/// A single Cartesian motion request, built per task step.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointSpec {
    pub target: CartesianTarget,
    /// Overrides the group's jump threshold when set.
    pub jump_threshold: Option<f64>,
}

impl WaypointSpec {
    pub fn direction(direction: Vector3<f64>, distance: f64) -> Self {
        Self {
            target: CartesianTarget::Direction {
                direction,
                distance,
            },
            jump_threshold: None,
        }
    }

    pub fn waypoints(poses: Vec<Isometry3<f64>>) -> Self {
        Self {
            target: CartesianTarget::Waypoints(poses),
            jump_threshold: None,
        }
    }

    pub fn with_jump_threshold(mut self, threshold: f64) -> Self {
        self.jump_threshold = Some(threshold);
        self
    }

    /// Expected oracle result on full success: the distance for straight
    /// lines, the fraction 1.0 for waypoint lists.
    pub fn desired(&self) -> f64 {
        match &self.target {
            CartesianTarget::Direction { distance, .. } => *distance,
            CartesianTarget::Waypoints(_) => 1.0,
        }
    }
}
