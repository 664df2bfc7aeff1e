//! Closed-form IK for gantry groups: the tip sits at the translation joints.

use super::cartesian::place_tip;
use crate::core::interfaces::{IkRequest, InverseKinematics};
use crate::core::model::RobotConfiguration;
use nalgebra::Point3;

/// Places the translation joints at the pose's position; orientation is
/// ignored since a gantry tip cannot rotate. Solutions are exact, so the
/// attempt budget only matters for rejected candidates, which are final.
#[derive(Debug, Clone, Copy, Default)]
pub struct GantryIk;

impl GantryIk {
    pub fn new() -> Self {
        Self
    }
}

impl InverseKinematics for GantryIk {
    fn solve(
        &self,
        seed: &RobotConfiguration,
        request: &IkRequest<'_>,
        is_valid: &dyn Fn(&RobotConfiguration) -> bool,
    ) -> Option<RobotConfiguration> {
        let group = request.group;
        let tip_joints = group.base_joints.as_ref()?;
        let target = Point3::from(request.pose.translation.vector);
        let Some(solution) = place_tip(seed, group, tip_joints, &target) else {
            tracing::debug!(group = group.name.as_str(), ?target, "pose outside the gantry limits");
            return None;
        };
        is_valid(&solution).then_some(solution)
    }
}
