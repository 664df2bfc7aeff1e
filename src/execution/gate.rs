//! Execution gate: persist, confirm, dispatch, await, map the outcome.

use super::health::ControllerHealthMonitor;
use super::operator::OperatorChannel;
use super::persist;
use crate::core::conditioning::MIN_DISPATCH_POINTS;
use crate::core::interfaces::ExecutionRuntime;
use crate::core::model::ConfigurationTrajectory;
use crate::error::ExecutionError;
use crate::runtime::observability::{Observer, ObserverEvent, ObserverMetric};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

pub struct ExecutionGate {
    runtime: Box<dyn ExecutionRuntime>,
    operator: Arc<dyn OperatorChannel>,
    health: Option<ControllerHealthMonitor>,
    health_verified: bool,
    trajectory_dir: Option<PathBuf>,
    observer: Arc<dyn Observer>,
}

impl ExecutionGate {
    pub fn new(
        runtime: Box<dyn ExecutionRuntime>,
        operator: Arc<dyn OperatorChannel>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            runtime,
            operator,
            health: None,
            health_verified: false,
            trajectory_dir: None,
            observer,
        }
    }

    /// Check controllers once before the first dispatch.
    pub fn with_health_monitor(mut self, monitor: ControllerHealthMonitor) -> Self {
        self.health = Some(monitor);
        self
    }

    /// Directory receiving `trajectory.csv` for every arm dispatch.
    pub fn with_trajectory_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.trajectory_dir = Some(dir.into());
        self
    }

    pub fn operator(&self) -> &Arc<dyn OperatorChannel> {
        &self.operator
    }

    /// Sets autonomy to false so the next arm dispatch waits for the operator.
    pub fn demote(&self, reason: &str) {
        if self.operator.autonomous() {
            tracing::warn!(reason, "autonomy demoted, operator confirmation required");
        }
        self.operator.set_autonomous(false);
        self.observer.record_event(&ObserverEvent::AutonomyDemoted {
            reason: reason.to_string(),
        });
    }

    /// Polls controller health until every unit is ready. A no-op without a
    /// monitor or after one successful pass.
    pub fn ensure_controllers(&mut self) -> Result<(), ExecutionError> {
        if self.health_verified {
            return Ok(());
        }
        if let Some(monitor) = &self.health {
            let operator = Arc::clone(&self.operator);
            let polls = monitor.wait_until_healthy(&|| !operator.stop_requested())?;
            tracing::info!(polls, "controllers healthy");
        }
        self.health_verified = true;
        Ok(())
    }

    /// Dispatches `trajectory` and blocks until the runtime reports a
    /// terminal outcome. Any non-success outcome demotes autonomy.
    pub fn execute(&mut self, trajectory: &ConfigurationTrajectory) -> Result<(), ExecutionError> {
        if trajectory.len() < MIN_DISPATCH_POINTS {
            return Err(ExecutionError::TrajectoryTooShort {
                points: trajectory.len(),
            });
        }
        self.ensure_controllers()?;

        let group = trajectory.group_name();
        if !trajectory.is_gripper_sized() {
            self.persist(trajectory);
            if !self.operator.autonomous() {
                tracing::info!(group, "waiting for operator to confirm next step");
                self.operator.wait_for_next_step();
            }
        }

        self.runtime.clear();
        if !self.runtime.push(trajectory) {
            tracing::error!(group, "execution runtime rejected trajectory");
            return Err(ExecutionError::PushRejected);
        }
        self.observer.record_event(&ObserverEvent::TrajectoryDispatched {
            group: group.to_string(),
            points: trajectory.len(),
            duration: trajectory.duration(),
        });
        self.observer
            .record_metric(&ObserverMetric::TrajectoryPoints(trajectory.len() as u64));

        let started = Instant::now();
        self.runtime.execute();
        let outcome = self.runtime.wait_for_execution();
        self.observer.record_event(&ObserverEvent::ExecutionFinished {
            group: group.to_string(),
            outcome,
            elapsed: started.elapsed(),
        });

        if outcome.is_success() {
            return Ok(());
        }
        tracing::error!(group, %outcome, "trajectory execution failed");
        self.demote(&format!("execution ended with {outcome}"));
        Err(ExecutionError::Failed(outcome))
    }

    fn persist(&self, trajectory: &ConfigurationTrajectory) {
        let Some(dir) = &self.trajectory_dir else {
            return;
        };
        let path = persist::trajectory_file(dir);
        if let Err(e) = persist::write(&path, trajectory) {
            tracing::warn!(path = %path.display(), "failed to save trajectory: {e}");
        }
    }
}
