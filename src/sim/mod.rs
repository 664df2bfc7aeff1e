//! In-process simulation of the external collaborators: a gantry arm with
//! box obstacles, straight-line planning and instant execution.

pub mod cartesian;
pub mod ik;
pub mod planner;
pub mod runtime;
pub mod timing;
pub mod world;

pub use cartesian::LinearCartesianOracle;
pub use ik::GantryIk;
pub use planner::{ExperienceRecord, InMemoryExperience, StraightLinePlanner};
pub use runtime::{ScriptedRuntime, StaticControllerDirectory};
pub use timing::FiniteDifferenceParameterizer;
pub use world::{BoxObstacle, GantryWorld, SimRobot};

use crate::config::Config;
use crate::core::model::RobotConfiguration;
use crate::core::scene::{JointBoundsChecker, SceneMonitor};
use crate::execution::RemoteControl;
use crate::manipulation::{Collaborators, Manipulation};
use crate::runtime::observability::Observer;
use anyhow::Context;
use nalgebra::DVector;
use std::sync::Arc;

pub const EXPERIENCE_FILE: &str = "experience.json";

/// Simulated robot plus handles that tests and the demo keep after the
/// collaborators are handed to [`Manipulation`].
pub struct Simulation {
    pub robot: SimRobot,
    pub scene: Arc<SceneMonitor>,
    pub runtime: ScriptedRuntime,
    pub controllers: Arc<StaticControllerDirectory>,
    pub operator: Arc<RemoteControl>,
    planner: Arc<StraightLinePlanner>,
}

impl Simulation {
    /// Robot at the home pose of the recovery arm, surrounded by `obstacles`.
    pub fn new(config: &Config, obstacles: Vec<BoxObstacle>) -> anyhow::Result<Self> {
        let model = config.robot.to_model();
        let arm = model.right_arm()?;
        let tip_joints = arm
            .base_joints
            .clone()
            .with_context(|| format!("group {} declares no base_joints", arm.name))?;
        let tip_links = match model.end_effector_of(arm) {
            Ok(hand) if !hand.links.is_empty() => hand.links.clone(),
            _ => arm.links.clone(),
        };

        let robot = SimRobot::new(initial_configuration(config)?);
        let world = GantryWorld::new(robot.clone(), tip_joints, tip_links).with_obstacles(obstacles);

        let mut planner = StraightLinePlanner::new(model.clone());
        if config.planning.use_experience {
            let path = config.package_root_path().join(EXPERIENCE_FILE);
            planner = planner.with_experience(InMemoryExperience::new(Some(path)));
        }

        Ok(Self {
            runtime: ScriptedRuntime::new(robot.clone()),
            robot,
            scene: Arc::new(SceneMonitor::new(world)),
            controllers: Arc::new(StaticControllerDirectory::healthy(&config.execution)),
            operator: Arc::new(RemoteControl::new(config.execution.autonomous)),
            planner: Arc::new(planner),
        })
    }

    /// Operator that confirms every step on its own.
    pub fn unattended(mut self, autonomous: bool) -> Self {
        self.operator = Arc::new(RemoteControl::auto_advancing(autonomous));
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            scene: Arc::clone(&self.scene),
            bounds: Arc::new(JointBoundsChecker::new()),
            cartesian: Arc::new(LinearCartesianOracle::new()),
            ik: Arc::new(GantryIk::new()),
            planner: Arc::clone(&self.planner) as _,
            parameterizer: Arc::new(FiniteDifferenceParameterizer::default()),
            runtime: Box::new(self.runtime.clone()),
            controllers: Some(Arc::clone(&self.controllers) as _),
            operator: Arc::clone(&self.operator) as _,
        }
    }

    pub fn manipulation(&self, config: &Config, observer: Arc<dyn Observer>) -> Manipulation {
        Manipulation::new(config, self.collaborators(), observer)
    }
}

/// Every joint declared by the robot groups, zeroed, with the recovery
/// arm at its home pose when it has one.
fn initial_configuration(config: &Config) -> anyhow::Result<RobotConfiguration> {
    let mut names: Vec<String> = Vec::new();
    for group in &config.robot.groups {
        for joint in &group.joints {
            if !names.contains(&joint.name) {
                names.push(joint.name.clone());
            }
        }
    }
    let zeros = vec![0.0; names.len()];
    let mut configuration = RobotConfiguration::new(names, zeros)?;

    let model = config.robot.to_model();
    let arm = model.recovery_arm()?;
    if let Ok(home) = arm.named_pose(model.home_pose()) {
        configuration = configuration.with_group_positions(arm, &DVector::from_column_slice(home))?;
    }
    Ok(configuration)
}
