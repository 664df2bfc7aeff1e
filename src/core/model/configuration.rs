//! Robot configurations: a full set of joint positions at one instant.

use super::group::ManipulationGroup;
use crate::error::ModelError;
use nalgebra::DVector;
use std::sync::Arc;

/// Per-joint threshold under which two configurations count as the same.
pub const STATES_EQUAL_THRESHOLD: f64 = 0.01;

/// Joint positions for every joint of the robot, keyed by a shared name list.
///
/// Cloning is cheap for the name list (`Arc`) and copies the position vector,
/// so a configuration placed into a trajectory is never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotConfiguration {
    joint_names: Arc<[String]>,
    positions: DVector<f64>,
}

impl RobotConfiguration {
    pub fn new(joint_names: Vec<String>, positions: Vec<f64>) -> Result<Self, ModelError> {
        Self::from_shared(joint_names.into(), DVector::from_vec(positions))
    }

    pub fn from_shared(
        joint_names: Arc<[String]>,
        positions: DVector<f64>,
    ) -> Result<Self, ModelError> {
        if joint_names.len() != positions.len() {
            return Err(ModelError::DimensionMismatch {
                expected: joint_names.len(),
                actual: positions.len(),
            });
        }
        Ok(Self {
            joint_names,
            positions,
        })
    }

    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    pub fn shared_joint_names(&self) -> Arc<[String]> {
        Arc::clone(&self.joint_names)
    }

    pub fn positions(&self) -> &DVector<f64> {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn index_of(&self, joint: &str) -> Option<usize> {
        self.joint_names.iter().position(|name| name == joint)
    }

    pub fn position(&self, joint: &str) -> Option<f64> {
        self.index_of(joint).map(|i| self.positions[i])
    }

    /// Copy of this configuration with one joint moved.
    pub fn with_position(&self, joint: &str, value: f64) -> Result<Self, ModelError> {
        let index = self
            .index_of(joint)
            .ok_or_else(|| ModelError::UnknownJoint(joint.to_string()))?;
        let mut next = self.clone();
        next.positions[index] = value;
        Ok(next)
    }

    /// Positions of the group's joints, in group order.
    pub fn group_positions(&self, group: &ManipulationGroup) -> Result<DVector<f64>, ModelError> {
        let values = group
            .joints
            .iter()
            .map(|joint| {
                self.position(&joint.name)
                    .ok_or_else(|| ModelError::UnknownJoint(joint.name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DVector::from_vec(values))
    }

    /// Copy of this configuration with the group's joints replaced.
    pub fn with_group_positions(
        &self,
        group: &ManipulationGroup,
        values: &DVector<f64>,
    ) -> Result<Self, ModelError> {
        if values.len() != group.dof() {
            return Err(ModelError::DimensionMismatch {
                expected: group.dof(),
                actual: values.len(),
            });
        }
        let mut next = self.clone();
        for (joint, value) in group.joints.iter().zip(values.iter()) {
            let index = next
                .index_of(&joint.name)
                .ok_or_else(|| ModelError::UnknownJoint(joint.name.clone()))?;
            next.positions[index] = *value;
        }
        Ok(next)
    }

    /// Linear interpolation toward `other` at fraction `t`.
    pub fn interpolate(&self, other: &Self, t: f64) -> Result<Self, ModelError> {
        if self.joint_names != other.joint_names {
            return Err(ModelError::LayoutMismatch);
        }
        Ok(Self {
            joint_names: Arc::clone(&self.joint_names),
            positions: self.positions.lerp(&other.positions, t),
        })
    }

    /// Largest absolute joint difference across the group's joints.
    pub fn max_group_deviation(
        &self,
        other: &Self,
        group: &ManipulationGroup,
    ) -> Result<f64, ModelError> {
        let a = self.group_positions(group)?;
        let b = other.group_positions(group)?;
        Ok((a - b).amax())
    }
}

/// Whether every active joint of `group` differs by at most
/// [`STATES_EQUAL_THRESHOLD`].
///
/// Configurations that do not carry all of the group's joints are never equal.
pub fn configurations_equal(
    a: &RobotConfiguration,
    b: &RobotConfiguration,
    group: &ManipulationGroup,
) -> bool {
    a.max_group_deviation(b, group)
        .is_ok_and(|deviation| deviation <= STATES_EQUAL_THRESHOLD)
}
