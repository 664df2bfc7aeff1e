//! Scripted execution runtime and a static controller directory.

use super::world::SimRobot;
use crate::config::ExecutionConfig;
use crate::core::interfaces::{ControllerDirectory, ControllerInfo, ExecutionRuntime};
use crate::core::model::{ConfigurationTrajectory, ExecutionOutcome};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs trajectories instantly. Outcomes are popped from a script and
/// default to success; a successful run leaves the robot at the final point.
///
/// Clones share all state, so a test can keep one clone as a probe after
/// boxing another into the orchestrator.
#[derive(Debug, Clone)]
pub struct ScriptedRuntime {
    robot: SimRobot,
    outcomes: Arc<Mutex<VecDeque<ExecutionOutcome>>>,
    pending: Arc<Mutex<Option<ConfigurationTrajectory>>>,
    last_outcome: Arc<Mutex<Option<ExecutionOutcome>>>,
    dispatched: Arc<Mutex<Vec<ConfigurationTrajectory>>>,
    clears: Arc<AtomicUsize>,
    reject_push: Arc<AtomicBool>,
}

impl ScriptedRuntime {
    pub fn new(robot: SimRobot) -> Self {
        Self {
            robot,
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            pending: Arc::new(Mutex::new(None)),
            last_outcome: Arc::new(Mutex::new(None)),
            dispatched: Arc::new(Mutex::new(Vec::new())),
            clears: Arc::new(AtomicUsize::new(0)),
            reject_push: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queues the outcome of a future execution.
    pub fn script(&self, outcome: ExecutionOutcome) {
        lock(&self.outcomes).push_back(outcome);
    }

    pub fn set_reject_push(&self, reject: bool) {
        self.reject_push.store(reject, Ordering::SeqCst);
    }

    /// Every trajectory that reached `execute`, oldest first.
    pub fn dispatched(&self) -> Vec<ConfigurationTrajectory> {
        lock(&self.dispatched).clone()
    }

    pub fn dispatch_count(&self) -> usize {
        lock(&self.dispatched).len()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl ExecutionRuntime for ScriptedRuntime {
    fn clear(&mut self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        *lock(&self.pending) = None;
    }

    fn push(&mut self, trajectory: &ConfigurationTrajectory) -> bool {
        if self.reject_push.load(Ordering::SeqCst) {
            return false;
        }
        *lock(&self.pending) = Some(trajectory.clone());
        true
    }

    fn execute(&mut self) {
        let Some(trajectory) = lock(&self.pending).take() else {
            *lock(&self.last_outcome) = Some(ExecutionOutcome::ControlFailed);
            return;
        };
        let outcome = lock(&self.outcomes)
            .pop_front()
            .unwrap_or(ExecutionOutcome::Succeeded);
        if outcome.is_success()
            && let Some(last) = trajectory.last()
        {
            let values: Vec<f64> = last.positions.iter().copied().collect();
            self.robot.set_joints(trajectory.joint_names(), &values);
        }
        tracing::debug!(group = trajectory.group_name(), points = trajectory.len(), %outcome, "simulated execution");
        lock(&self.dispatched).push(trajectory);
        *lock(&self.last_outcome) = Some(outcome);
    }

    fn wait_for_execution(&mut self) -> ExecutionOutcome {
        lock(&self.last_outcome)
            .take()
            .unwrap_or(ExecutionOutcome::ControlFailed)
    }
}

/// Controller lists per hardware unit, editable while shared.
#[derive(Debug, Default)]
pub struct StaticControllerDirectory {
    units: Mutex<BTreeMap<String, Vec<ControllerInfo>>>,
    unreachable: AtomicBool,
    queries: AtomicUsize,
}

impl StaticControllerDirectory {
    /// Every configured unit reports its controllers as running.
    pub fn healthy(config: &ExecutionConfig) -> Self {
        let units = config
            .hardware_units
            .iter()
            .map(|unit| {
                let mut controllers =
                    vec![ControllerInfo::new(config.trajectory_controller.as_str(), "running")];
                if unit.has_end_effector {
                    controllers.push(ControllerInfo::new(
                        config.end_effector_controller.as_str(),
                        "running",
                    ));
                }
                (unit.name.clone(), controllers)
            })
            .collect();
        Self {
            units: Mutex::new(units),
            ..Self::default()
        }
    }

    /// Sets one controller's state, adding it if missing.
    pub fn set_state(&self, unit: &str, controller: &str, state: &str) {
        let mut units = lock(&self.units);
        let list = units.entry(unit.to_string()).or_default();
        match list.iter_mut().find(|c| c.name == controller) {
            Some(info) => info.state = state.to_string(),
            None => list.push(ControllerInfo::new(controller, state)),
        }
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl ControllerDirectory for StaticControllerDirectory {
    fn list_controllers(&self, unit: &str, timeout: Duration) -> anyhow::Result<Vec<ControllerInfo>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            anyhow::bail!("controller manager for {unit} did not answer within {timeout:?}");
        }
        Ok(lock(&self.units).get(unit).cloned().unwrap_or_default())
    }
}
