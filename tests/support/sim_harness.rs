#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};

use nalgebra::{Point3, Vector3};
use tempfile::TempDir;

use armflow::Config;
use armflow::core::interfaces::{MotionPlanRequest, MotionPlanResponse, MotionPlanner, WorldModel};
use armflow::core::model::{PlanErrorCode, RobotConfiguration};
use armflow::core::recovery::RecoveryPlanner;
use armflow::manipulation::{Collaborators, Manipulation};
use armflow::runtime::observability::{Observer, ObserverEvent, ObserverMetric};
use armflow::sim::{BoxObstacle, Simulation};

pub const ARM: &str = "right_arm";
pub const HAND: &str = "right_hand";
pub const RECOVERY_SEED: u64 = 0x5EED_A2F1;

/// Observer that keeps everything it sees.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
    metrics: Mutex<Vec<ObserverMetric>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn metrics(&self) -> Vec<ObserverMetric> {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, predicate: impl Fn(&ObserverEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }
}

impl Observer for RecordingObserver {
    fn record_event(&self, event: &ObserverEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(metric.clone());
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Planner that answers every request with the same failure code.
pub struct FailingPlanner {
    pub code: PlanErrorCode,
    pub calls: Mutex<u32>,
}

impl FailingPlanner {
    pub fn new(code: PlanErrorCode) -> Self {
        Self {
            code,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MotionPlanner for FailingPlanner {
    fn plan(&self, _scene: &dyn WorldModel, _request: &MotionPlanRequest) -> MotionPlanResponse {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        MotionPlanResponse::failure(self.code)
    }
}

/// Config rooted in a temp dir with fast polling.
pub fn test_config(tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.package_root = tmp.path().display().to_string();
    config.execution.health_poll_interval_ms = 0;
    config.execution.health_max_polls = Some(3);
    config.recording.record_interval_ms = 2;
    config.recording.settle_poll_interval_ms = 1;
    config
}

pub fn object_box(name: &str, center: [f64; 3], half: f64) -> BoxObstacle {
    BoxObstacle::new(
        name,
        Point3::new(center[0], center[1], center[2]),
        Vector3::new(half, half, half),
    )
}

pub struct Harness {
    pub tmp: TempDir,
    pub config: Config,
    pub sim: Simulation,
    pub observer: Arc<RecordingObserver>,
    pub manipulation: Manipulation,
}

pub struct HarnessBuilder {
    tmp: TempDir,
    config: Config,
    obstacles: Vec<BoxObstacle>,
    unattended: bool,
    planner: Option<Arc<dyn MotionPlanner>>,
    initial: Option<RobotConfiguration>,
}

impl HarnessBuilder {
    pub fn configure(mut self, edit: impl FnOnce(&mut Config)) -> Self {
        edit(&mut self.config);
        self
    }

    pub fn obstacle(mut self, obstacle: BoxObstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Operator confirms nothing on its own.
    pub fn attended(mut self) -> Self {
        self.unattended = false;
        self
    }

    pub fn planner(mut self, planner: Arc<dyn MotionPlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Places the simulated robot at `joints` before the orchestrator starts.
    pub fn start_at(mut self, joints: &[(&str, f64)]) -> Self {
        let mut configuration = Simulation::new(&self.config, Vec::new())
            .unwrap()
            .robot
            .configuration();
        for (joint, value) in joints {
            configuration = configuration.with_position(joint, *value).unwrap();
        }
        self.initial = Some(configuration);
        self
    }

    pub fn build(self) -> Harness {
        let mut sim = Simulation::new(&self.config, self.obstacles).unwrap();
        if self.unattended {
            sim = sim.unattended(self.config.execution.autonomous);
        }
        if let Some(initial) = self.initial {
            sim.robot.set_configuration(initial);
        }
        let observer = Arc::new(RecordingObserver::default());
        let mut collaborators: Collaborators = sim.collaborators();
        if let Some(planner) = self.planner {
            collaborators.planner = planner;
        }
        let manipulation = Manipulation::new(&self.config, collaborators, observer.clone())
            .with_recovery_planner(RecoveryPlanner::with_seed(&self.config.recovery, RECOVERY_SEED));
        Harness {
            tmp: self.tmp,
            config: self.config,
            sim,
            observer,
            manipulation,
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        HarnessBuilder {
            tmp,
            config,
            obstacles: Vec::new(),
            unattended: true,
            planner: None,
            initial: None,
        }
    }

    /// Unattended, non-autonomous, no obstacles.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn joint(&self, name: &str) -> f64 {
        self.sim.robot.configuration().position(name).unwrap()
    }

    pub fn goal_with(&self, joints: &[(&str, f64)]) -> RobotConfiguration {
        let mut goal = self.sim.robot.configuration();
        for (joint, value) in joints {
            goal = goal.with_position(joint, *value).unwrap();
        }
        goal
    }

    pub fn trajectory_file(&self) -> std::path::PathBuf {
        armflow::execution::persist::trajectory_file(&self.config.trajectory_dir())
    }
}
