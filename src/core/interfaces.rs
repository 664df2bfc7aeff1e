//! Collaborators the orchestrator consumes but does not implement.
//!
//! Planning algorithms, IK, collision geometry, time parameterization and the
//! execution runtime all live behind these traits. Every call is synchronous
//! and blocks for at most the budget carried by its request.

use super::model::{
    AllowedCollisionMatrix, CartesianTarget, CollisionMode, CollisionReport,
    ConfigurationTrajectory, ExecutionOutcome, ManipulationGroup, PlanErrorCode,
    RobotConfiguration,
};
use nalgebra::{Isometry3, Point3};
use std::io::Write;
use std::time::Duration;

// ── World model ─────────────────────────────────────────────────────────────

/// Planning scene: latest robot state, collision queries, collision matrix.
pub trait WorldModel: Send + Sync {
    /// Latest measured robot configuration.
    fn current_configuration(&self) -> RobotConfiguration;

    /// Collision check of `configuration` restricted to `group`'s links.
    fn check_collision(
        &self,
        configuration: &RobotConfiguration,
        group: &ManipulationGroup,
        mode: CollisionMode,
    ) -> CollisionReport;

    fn allowed_collisions(&self) -> &AllowedCollisionMatrix;

    fn allowed_collisions_mut(&mut self) -> &mut AllowedCollisionMatrix;
}

pub trait BoundsChecker: Send + Sync {
    fn satisfies_bounds(
        &self,
        configuration: &RobotConfiguration,
        group: &ManipulationGroup,
        tolerance: f64,
    ) -> bool;

    /// Corrected configuration, or `None` when nothing had to change.
    fn fix_bounds(
        &self,
        configuration: &RobotConfiguration,
        group: &ManipulationGroup,
    ) -> Option<RobotConfiguration>;
}

// ── Cartesian stepping ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct CartesianRequest<'a> {
    pub group: &'a ManipulationGroup,
    pub tip_link: &'a str,
    pub target: &'a CartesianTarget,
    /// Maximum Cartesian increment between consecutive configurations.
    pub max_step: f64,
    pub jump_threshold: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartesianPath {
    /// Achieved length for straight lines, fraction in [0, 1] for waypoints.
    pub achieved: f64,
    pub configurations: Vec<RobotConfiguration>,
}

pub trait CartesianPathOracle: Send + Sync {
    /// Steps the tip link toward the target from `start`, stopping at the
    /// first configuration rejected by `is_valid` or by IK.
    fn compute_cartesian_path(
        &self,
        start: &RobotConfiguration,
        request: &CartesianRequest<'_>,
        is_valid: &dyn Fn(&RobotConfiguration) -> bool,
    ) -> CartesianPath;
}

// ── Inverse kinematics ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct IkRequest<'a> {
    pub group: &'a ManipulationGroup,
    /// World-frame pose for the group's IK tip link.
    pub pose: &'a Isometry3<f64>,
    pub attempts: u32,
    pub timeout: Duration,
}

pub trait InverseKinematics: Send + Sync {
    /// `seed` with the group's joints set so the tip link reaches the pose,
    /// or `None` when no solution passes `is_valid` within the budget.
    fn solve(
        &self,
        seed: &RobotConfiguration,
        request: &IkRequest<'_>,
        is_valid: &dyn Fn(&RobotConfiguration) -> bool,
    ) -> Option<RobotConfiguration>;
}

// ── Time parameterization ───────────────────────────────────────────────────

pub trait TimeParameterizer: Send + Sync {
    /// Fills in velocities, accelerations and timestamps in place.
    fn compute_time_stamps(
        &self,
        trajectory: &mut ConfigurationTrajectory,
        velocity_scale: f64,
    ) -> anyhow::Result<()>;
}

// ── Global planning ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct GoalConstraint {
    pub configuration: RobotConfiguration,
    pub position_tolerance: f64,
    pub orientation_tolerance: f64,
}

/// Axis-aligned world box the planner may sample in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkspaceBounds {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl WorkspaceBounds {
    /// ±1 around `center` horizontally, floor at 0, up to `center.z + 1`.
    pub fn around(center: Point3<f64>) -> Self {
        Self {
            min: Point3::new(center.x - 1.0, center.y - 1.0, 0.0),
            max: Point3::new(center.x + 1.0, center.y + 1.0, center.z + 1.0),
        }
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionPlanRequest {
    pub start: RobotConfiguration,
    pub goal: GoalConstraint,
    pub group_name: String,
    pub planner_id: String,
    pub use_experience: bool,
    pub experience_method: String,
    pub num_planning_attempts: u32,
    pub allowed_planning_time: Duration,
    pub workspace: WorkspaceBounds,
    pub max_velocity_scaling_factor: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionPlanResponse {
    pub trajectory: Option<ConfigurationTrajectory>,
    pub code: PlanErrorCode,
}

impl MotionPlanResponse {
    pub fn failure(code: PlanErrorCode) -> Self {
        Self {
            trajectory: None,
            code,
        }
    }
}

/// Database of previously solved plans used by experience-guided planning.
pub trait ExperienceStore: Send + Sync {
    /// Persists the database if it changed; returns whether it wrote.
    fn save_if_changed(&self) -> anyhow::Result<bool>;

    fn write_data_log(&self, out: &mut dyn Write) -> std::io::Result<()>;

    /// One-line human summary (path count, hit rate).
    fn summary(&self) -> String;
}

pub trait MotionPlanner: Send + Sync {
    fn plan(&self, scene: &dyn WorldModel, request: &MotionPlanRequest) -> MotionPlanResponse;

    /// Experience database backing this planner, if it has one.
    fn experience_store(&self) -> Option<&dyn ExperienceStore> {
        None
    }
}

// ── Execution runtime ───────────────────────────────────────────────────────

pub trait ExecutionRuntime: Send {
    fn clear(&mut self);

    /// Queues a trajectory; `false` when the runtime refuses it.
    fn push(&mut self, trajectory: &ConfigurationTrajectory) -> bool;

    fn execute(&mut self);

    /// Blocks until the running trajectory reaches a terminal outcome.
    fn wait_for_execution(&mut self) -> ExecutionOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerInfo {
    pub name: String,
    pub state: String,
}

impl ControllerInfo {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
        }
    }
}

/// Controller-manager query per hardware unit.
pub trait ControllerDirectory: Send + Sync {
    fn list_controllers(&self, unit: &str, timeout: Duration) -> anyhow::Result<Vec<ControllerInfo>>;
}
