//! Timed joint trajectories for a single group.

use super::configuration::RobotConfiguration;
use super::group::{GRIPPER_JOINT_LIMIT, ManipulationGroup};
use crate::error::ModelError;
use nalgebra::DVector;
use std::time::Duration;

/// One waypoint of a trajectory, in the trajectory's joint order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    pub positions: DVector<f64>,
    pub velocities: Option<DVector<f64>>,
    pub accelerations: Option<DVector<f64>>,
    pub time_from_start: Duration,
}

impl TrajectoryPoint {
    /// Untimed point: no derivatives, zero time.
    pub fn untimed(positions: DVector<f64>) -> Self {
        Self {
            positions,
            velocities: None,
            accelerations: None,
            time_from_start: Duration::ZERO,
        }
    }

    pub fn clear_timing(&mut self) {
        self.velocities = None;
        self.accelerations = None;
        self.time_from_start = Duration::ZERO;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationTrajectory {
    group: String,
    joint_names: Vec<String>,
    points: Vec<TrajectoryPoint>,
}

impl ConfigurationTrajectory {
    pub fn new(group: impl Into<String>, joint_names: Vec<String>) -> Self {
        Self {
            group: group.into(),
            joint_names,
            points: Vec::new(),
        }
    }

    /// Untimed trajectory through `configurations`, restricted to the group.
    pub fn from_configurations(
        group: &ManipulationGroup,
        configurations: &[RobotConfiguration],
    ) -> Result<Self, ModelError> {
        let mut trajectory = Self::new(group.name.clone(), group.joint_names());
        for configuration in configurations {
            trajectory.push_point(TrajectoryPoint::untimed(
                configuration.group_positions(group)?,
            ))?;
        }
        Ok(trajectory)
    }

    pub fn push_point(&mut self, point: TrajectoryPoint) -> Result<(), ModelError> {
        let expected = self.joint_names.len();
        let lengths = [
            Some(point.positions.len()),
            point.velocities.as_ref().map(DVector::len),
            point.accelerations.as_ref().map(DVector::len),
        ];
        if let Some(actual) = lengths.into_iter().flatten().find(|len| *len != expected) {
            return Err(ModelError::DimensionMismatch { expected, actual });
        }
        self.points.push(point);
        Ok(())
    }

    pub fn group_name(&self) -> &str {
        &self.group
    }

    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    pub fn joint_count(&self) -> usize {
        self.joint_names.len()
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [TrajectoryPoint] {
        &mut self.points
    }

    pub fn into_points(self) -> Vec<TrajectoryPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    pub fn is_gripper_sized(&self) -> bool {
        self.joint_count() <= GRIPPER_JOINT_LIMIT
    }

    pub fn has_accelerations(&self) -> bool {
        self.points.iter().any(|p| p.accelerations.is_some())
    }

    pub fn duration(&self) -> Duration {
        self.points
            .last()
            .map_or(Duration::ZERO, |p| p.time_from_start)
    }

    /// Drops velocities, accelerations and timestamps from every point.
    pub fn clear_timing(&mut self) {
        for point in &mut self.points {
            point.clear_timing();
        }
    }

    /// Index of the first point whose timestamp precedes its predecessor's.
    pub fn first_time_regression(&self) -> Option<usize> {
        self.points
            .windows(2)
            .position(|pair| pair[1].time_from_start < pair[0].time_from_start)
            .map(|i| i + 1)
    }

    /// Same trajectory with the point list replaced.
    pub fn with_points(&self, points: Vec<TrajectoryPoint>) -> Self {
        Self {
            group: self.group.clone(),
            joint_names: self.joint_names.clone(),
            points,
        }
    }
}
