//! `Manipulation`: the task-facing entry point that wires synthesis,
//! conditioning, planning, recovery and the execution gate together.
//!
//! Every public operation starts from a fresh pull of the current robot
//! configuration; nothing caches robot state between calls.

mod motion;
mod recording;
mod safety;

pub use motion::{ApproachPath, CartesianMotion, MoveOutcome};
pub use safety::ValidityReport;

use crate::config::{Config, MotionConfig, RecordingConfig};
use crate::core::conditioning::TrajectoryConditioner;
use crate::core::interfaces::{
    BoundsChecker, CartesianPathOracle, ControllerDirectory, ExecutionRuntime, InverseKinematics,
    MotionPlanner, TimeParameterizer,
};
use crate::core::model::{ManipulationGroup, RobotConfiguration, RobotModel};
use crate::core::planning::PlannerAdapter;
use crate::core::recovery::RecoveryPlanner;
use crate::core::scene::SceneMonitor;
use crate::core::synthesis::PathSynthesizer;
use crate::execution::{ControllerHealthMonitor, ExecutionGate, OperatorChannel};
use crate::runtime::observability::Observer;
use std::sync::Arc;

/// External collaborators the orchestrator drives.
pub struct Collaborators {
    pub scene: Arc<SceneMonitor>,
    pub bounds: Arc<dyn BoundsChecker>,
    pub cartesian: Arc<dyn CartesianPathOracle>,
    pub ik: Arc<dyn InverseKinematics>,
    pub planner: Arc<dyn MotionPlanner>,
    pub parameterizer: Arc<dyn TimeParameterizer>,
    pub runtime: Box<dyn ExecutionRuntime>,
    /// Controller manager queried before the first dispatch; `None` skips
    /// the health check.
    pub controllers: Option<Arc<dyn ControllerDirectory>>,
    pub operator: Arc<dyn OperatorChannel>,
}

pub struct Manipulation {
    model: RobotModel,
    scene: Arc<SceneMonitor>,
    bounds: Arc<dyn BoundsChecker>,
    bounds_tolerance: f64,
    ik: Arc<dyn InverseKinematics>,
    synthesizer: PathSynthesizer,
    conditioner: Arc<TrajectoryConditioner>,
    planner: PlannerAdapter,
    recovery: RecoveryPlanner,
    gate: ExecutionGate,
    motion: MotionConfig,
    approach_distance: f64,
    recording: RecordingConfig,
    observer: Arc<dyn Observer>,
}

impl Manipulation {
    pub fn new(config: &Config, collaborators: Collaborators, observer: Arc<dyn Observer>) -> Self {
        let Collaborators {
            scene,
            bounds,
            cartesian,
            ik,
            planner,
            parameterizer,
            runtime,
            controllers,
            operator,
        } = collaborators;

        let conditioner = Arc::new(TrajectoryConditioner::new(parameterizer, &config.conditioning));
        let mut gate = ExecutionGate::new(runtime, operator, Arc::clone(&observer));
        if config.execution.persist_trajectories {
            gate = gate.with_trajectory_dir(config.trajectory_dir());
        }
        if config.execution.check_controller_health
            && let Some(directory) = controllers
        {
            gate = gate.with_health_monitor(ControllerHealthMonitor::new(
                directory,
                &config.execution,
                Arc::clone(&observer),
            ));
        }

        Self {
            model: config.robot.to_model(),
            scene,
            bounds,
            bounds_tolerance: config.bounds.max_bounds_error,
            ik,
            synthesizer: PathSynthesizer::new(cartesian, &config.synthesis, Arc::clone(&observer)),
            planner: PlannerAdapter::new(
                planner,
                Arc::clone(&conditioner),
                &config.planning,
                Arc::clone(&observer),
            ),
            conditioner,
            recovery: RecoveryPlanner::new(&config.recovery),
            gate,
            motion: config.motion.clone(),
            approach_distance: config.synthesis.approach_distance,
            recording: config.recording.clone(),
            observer,
        }
    }

    /// Replaces the recovery classifier's random source with a seeded one.
    pub fn with_recovery_planner(mut self, recovery: RecoveryPlanner) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn model(&self) -> &RobotModel {
        &self.model
    }

    pub fn scene(&self) -> &Arc<SceneMonitor> {
        &self.scene
    }

    pub fn operator(&self) -> &Arc<dyn OperatorChannel> {
        self.gate.operator()
    }

    pub fn current_configuration(&self) -> RobotConfiguration {
        self.scene.current_configuration()
    }

    /// Arm best placed to reach a target at world y `target_y`.
    pub fn choose_arm(&self, target_y: f64) -> crate::error::Result<&ManipulationGroup> {
        Ok(self.model.choose_arm(target_y)?)
    }

    /// Polls controller health now instead of on the first dispatch.
    pub fn ensure_controllers_healthy(&mut self) -> crate::error::Result<()> {
        Ok(self.gate.ensure_controllers()?)
    }

    fn group(&self, name: &str) -> crate::error::Result<ManipulationGroup> {
        Ok(self.model.group(name)?.clone())
    }
}
