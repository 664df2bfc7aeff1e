use super::Manipulation;
use crate::core::model::{
    CollisionMode, ConfigurationTrajectory, ManipulationGroup, RobotConfiguration, WaypointSpec,
    configurations_equal,
};
use crate::core::interfaces::IkRequest;
use crate::core::planning::PlannedMotion;
use crate::core::synthesis::SynthesisOptions;
use crate::error::{ModelError, MotionError, Result};
use nalgebra::{DVector, Isometry3, Vector3};
use std::time::Duration;

const IK_ATTEMPTS: u32 = 3;
const IK_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Goal already held; nothing was planned or dispatched.
    AlreadySatisfied,
    Executed { points: usize },
}

impl MoveOutcome {
    pub fn executed(&self) -> bool {
        matches!(self, Self::Executed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianMotion {
    pub achieved: f64,
    pub desired: f64,
    pub points: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApproachPath {
    /// Timed path from `pre_grasp` to the grasp configuration.
    pub trajectory: ConfigurationTrajectory,
    pub pre_grasp: RobotConfiguration,
}

/// `steps + 1` configurations from `start` to `goal`, spaced `resolution`
/// apart in interpolation parameter.
pub(crate) fn interpolate_states(
    start: &RobotConfiguration,
    goal: &RobotConfiguration,
    resolution: f64,
) -> std::result::Result<Vec<RobotConfiguration>, ModelError> {
    let steps = (1.0 / resolution).round().max(1.0) as usize;
    (0..=steps)
        .map(|k| start.interpolate(goal, k as f64 / steps as f64))
        .collect()
}

impl Manipulation {
    /// Plans to `goal` with the global planner and executes the result.
    /// A goal equal to the current configuration is a no-op success.
    pub fn move_to(
        &mut self,
        goal: &RobotConfiguration,
        group: &str,
        velocity_scale: f64,
        check_validity: bool,
    ) -> Result<MoveOutcome> {
        let group = self.group(group)?;
        let start = self.current_configuration();
        if configurations_equal(&start, goal, &group) {
            tracing::info!(group = group.name.as_str(), "goal equals current configuration, skipping move");
            return Ok(MoveOutcome::AlreadySatisfied);
        }
        if check_validity {
            let report = self.validity_for(&start, Some(goal), &group);
            if !report.is_valid() {
                tracing::warn!(group = group.name.as_str(), %report, "refusing move");
                return Err(MotionError::InvalidStartOrGoal.into());
            }
        }

        let planned = {
            let world = self.scene.read();
            self.planner.plan(&*world, &start, goal, &group, velocity_scale)?
        };
        match planned {
            PlannedMotion::AlreadySatisfied => Ok(MoveOutcome::AlreadySatisfied),
            PlannedMotion::Trajectory(trajectory) => self.dispatch(&trajectory),
        }
    }

    pub fn move_to_named_pose(
        &mut self,
        group: &str,
        pose: &str,
        check_validity: bool,
    ) -> Result<MoveOutcome> {
        let goal = self.named_pose_goal(group, pose)?;
        self.move_to(&goal, group, self.motion.main_velocity_scaling_factor, check_validity)
    }

    pub(crate) fn named_pose_goal(&self, group: &str, pose: &str) -> Result<RobotConfiguration> {
        let group = self.model.group(group)?;
        let values = DVector::from_column_slice(group.named_pose(pose)?);
        Ok(self.current_configuration().with_group_positions(group, &values)?)
    }

    /// Direct move: linear interpolation from the current configuration,
    /// conditioned and dispatched without the global planner.
    pub fn execute_state(
        &mut self,
        goal: &RobotConfiguration,
        group: &str,
        velocity_scale: f64,
    ) -> Result<MoveOutcome> {
        let group = self.group(group)?;
        let start = self.current_configuration();
        if configurations_equal(&start, goal, &group) {
            return Ok(MoveOutcome::AlreadySatisfied);
        }
        let states = interpolate_states(&start, goal, self.motion.direct_move_resolution)?;
        let trajectory = self
            .conditioner
            .condition_configurations(&group, &states, velocity_scale)?;
        self.dispatch(&trajectory)
    }

    /// Straight-line tip motion along `direction` for `distance`.
    pub fn execute_cartesian_path(
        &mut self,
        group: &str,
        direction: Vector3<f64>,
        distance: f64,
        velocity_scale: f64,
        collision_mode: CollisionMode,
    ) -> Result<CartesianMotion> {
        let group = self.group(group)?;
        let options = SynthesisOptions {
            collision_mode,
            ..SynthesisOptions::default()
        };
        self.run_cartesian(
            &group,
            &WaypointSpec::direction(direction, distance),
            velocity_scale,
            options,
        )
    }

    /// Tip motion through world-frame `poses`, in order.
    pub fn execute_waypoint_path(
        &mut self,
        group: &str,
        poses: Vec<Isometry3<f64>>,
        velocity_scale: f64,
    ) -> Result<CartesianMotion> {
        let group = self.group(group)?;
        self.run_cartesian(
            &group,
            &WaypointSpec::waypoints(poses),
            velocity_scale,
            SynthesisOptions::default(),
        )
    }

    /// Solves IK for `pose` on `arm` (or the arm [`Self::choose_arm`] picks
    /// for the pose's y) and plans there with validity checks.
    pub fn move_end_effector_to_pose(
        &mut self,
        pose: &Isometry3<f64>,
        arm: Option<&str>,
        velocity_scale: f64,
    ) -> Result<MoveOutcome> {
        let group = match arm {
            Some(name) => self.group(name)?,
            None => self.choose_arm(pose.translation.vector.y)?.clone(),
        };
        let seed = self.current_configuration();
        let goal = {
            let world = self.scene.read();
            let is_valid = |candidate: &RobotConfiguration| {
                !world
                    .check_collision(candidate, &group, CollisionMode::Full)
                    .is_colliding()
            };
            let request = IkRequest {
                group: &group,
                pose,
                attempts: IK_ATTEMPTS,
                timeout: IK_TIMEOUT,
            };
            self.ik.solve(&seed, &request, &is_valid)
        };
        let Some(goal) = goal else {
            tracing::error!(group = group.name.as_str(), "unable to find arm solution for desired pose");
            return Err(MotionError::NoIkSolution { group: group.name }.into());
        };
        tracing::info!(group = group.name.as_str(), "found IK solution for pose request");
        self.move_to(&goal, &group.name, velocity_scale, true)
    }

    pub fn execute_vertical_path(
        &mut self,
        group: &str,
        distance: f64,
        up: bool,
        collision_mode: CollisionMode,
    ) -> Result<CartesianMotion> {
        let direction = if up { Vector3::z() } else { -Vector3::z() };
        let scale = self.motion.lift_velocity_scaling_factor;
        self.execute_cartesian_path(group, direction, distance, scale, collision_mode)
    }

    pub fn execute_horizontal_path(
        &mut self,
        group: &str,
        distance: f64,
        left: bool,
        collision_mode: CollisionMode,
    ) -> Result<CartesianMotion> {
        let direction = if left { Vector3::y() } else { -Vector3::y() };
        let scale = self.motion.main_velocity_scaling_factor;
        self.execute_cartesian_path(group, direction, distance, scale, collision_mode)
    }

    /// Backs away from (or advances toward) the work surface along x.
    pub fn execute_retreat_path(
        &mut self,
        group: &str,
        distance: f64,
        retreat: bool,
        collision_mode: CollisionMode,
    ) -> Result<CartesianMotion> {
        let (direction, scale) = if retreat {
            (-Vector3::x(), self.motion.retreat_velocity_scaling_factor)
        } else {
            (Vector3::x(), self.motion.approach_velocity_scaling_factor)
        };
        self.execute_cartesian_path(group, direction, distance, scale, collision_mode)
    }

    /// Timed approach ending at `grasp`: synthesized backwards from the grasp
    /// against `direction`, then reversed. Nothing is dispatched.
    pub fn generate_approach_path(
        &self,
        grasp: &RobotConfiguration,
        group: &str,
        direction: Vector3<f64>,
        distance: Option<f64>,
    ) -> Result<ApproachPath> {
        let group = self.group(group)?;
        let spec = WaypointSpec::direction(-direction, distance.unwrap_or(self.approach_distance));
        let path = {
            let world = self.scene.read();
            self.synthesizer
                .synthesize(&*world, grasp, &group, &spec, SynthesisOptions::default().reversed())?
        };
        let trajectory = self.conditioner.condition_configurations(
            &group,
            &path.configurations,
            self.motion.approach_velocity_scaling_factor,
        )?;
        let pre_grasp = path
            .pre_position
            .unwrap_or_else(|| path.configurations[0].clone());
        Ok(ApproachPath {
            trajectory,
            pre_grasp,
        })
    }

    /// Opens or closes the end effector attached to `arm`.
    pub fn set_end_effector(&mut self, arm: &str, open: bool) -> Result<MoveOutcome> {
        let arm = self.model.group(arm)?;
        let hand = self.model.end_effector_of(arm)?.clone();
        let posture = DVector::from_column_slice(hand.named_pose(if open { "open" } else { "closed" })?);
        let start = self.current_configuration();
        let goal = start.with_group_positions(&hand, &posture)?;
        if configurations_equal(&start, &goal, &hand) {
            tracing::debug!(group = hand.name.as_str(), open, "end effector already in posture");
            return Ok(MoveOutcome::AlreadySatisfied);
        }
        let states = interpolate_states(&start, &goal, self.motion.end_effector_resolution)?;
        let trajectory = self.conditioner.condition_configurations(
            &hand,
            &states,
            self.motion.end_effector_velocity_scaling_factor,
        )?;
        self.dispatch(&trajectory)
    }

    pub(crate) fn run_cartesian(
        &mut self,
        group: &ManipulationGroup,
        spec: &WaypointSpec,
        velocity_scale: f64,
        options: SynthesisOptions,
    ) -> Result<CartesianMotion> {
        let start = self.current_configuration();
        let path = {
            let world = self.scene.read();
            self.synthesizer
                .synthesize(&*world, &start, group, spec, options)?
        };
        let trajectory = self.conditioner.condition_configurations(
            group,
            &path.configurations,
            velocity_scale,
        )?;
        self.gate.execute(&trajectory)?;
        Ok(CartesianMotion {
            achieved: path.achieved,
            desired: path.desired,
            points: trajectory.len(),
        })
    }

    pub(crate) fn dispatch(&mut self, trajectory: &ConfigurationTrajectory) -> Result<MoveOutcome> {
        self.gate.execute(trajectory)?;
        Ok(MoveOutcome::Executed {
            points: trajectory.len(),
        })
    }
}
