//! Global planner adapter: bounded re-planning plus experience persistence.

use super::conditioning::TrajectoryConditioner;
use super::interfaces::{
    ExperienceStore, GoalConstraint, MotionPlanRequest, MotionPlanner, WorkspaceBounds, WorldModel,
};
use super::model::{ConfigurationTrajectory, ManipulationGroup, PlanErrorCode, RobotConfiguration};
use crate::config::PlanningConfig;
use crate::error::PlanningError;
use crate::runtime::observability::{Observer, ObserverEvent, ObserverMetric};
use anyhow::Context;
use nalgebra::Point3;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a successful planning call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedMotion {
    Trajectory(ConfigurationTrajectory),
    /// The planner reported success without a path: the goal already holds.
    AlreadySatisfied,
}

pub struct PlannerAdapter {
    planner: Arc<dyn MotionPlanner>,
    conditioner: Arc<TrajectoryConditioner>,
    config: PlanningConfig,
    observer: Arc<dyn Observer>,
}

impl PlannerAdapter {
    pub fn new(
        planner: Arc<dyn MotionPlanner>,
        conditioner: Arc<TrajectoryConditioner>,
        config: &PlanningConfig,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            planner,
            conditioner,
            config: config.clone(),
            observer,
        }
    }

    pub fn use_experience(&self) -> bool {
        self.config.use_experience
    }

    pub fn build_request(
        &self,
        start: &RobotConfiguration,
        goal: &RobotConfiguration,
        group: &ManipulationGroup,
        velocity_scale: f64,
    ) -> MotionPlanRequest {
        MotionPlanRequest {
            start: start.clone(),
            goal: GoalConstraint {
                configuration: goal.clone(),
                position_tolerance: self.config.goal_tolerance,
                orientation_tolerance: self.config.goal_tolerance,
            },
            group_name: group.name.clone(),
            planner_id: self.config.planner_id.clone(),
            use_experience: self.config.use_experience,
            experience_method: self.config.experience_method.clone(),
            num_planning_attempts: self.config.planning_attempts(),
            allowed_planning_time: Duration::from_secs_f64(self.config.allowed_planning_time_secs),
            workspace: WorkspaceBounds::around(workspace_anchor(start, group)),
            max_velocity_scaling_factor: velocity_scale,
        }
    }

    /// Plans from `start` to `goal`, re-issuing the full request up to
    /// `max_plan_attempts` times. No backoff between attempts.
    pub fn plan(
        &self,
        scene: &dyn WorldModel,
        start: &RobotConfiguration,
        goal: &RobotConfiguration,
        group: &ManipulationGroup,
        velocity_scale: f64,
    ) -> Result<PlannedMotion, PlanningError> {
        let request = self.build_request(start, goal, group, velocity_scale);
        let max_attempts = self.config.max_plan_attempts.max(1);
        let mut last = PlanErrorCode::UnknownFailure;
        let mut failures = Vec::new();

        for attempt in 1..=max_attempts {
            let started = Instant::now();
            let response = self.planner.plan(scene, &request);
            self.observer
                .record_metric(&ObserverMetric::PlanLatency(started.elapsed()));
            self.observer.record_event(&ObserverEvent::PlanAttempt {
                group: group.name.clone(),
                attempt,
                max_attempts,
                code: response.code,
            });

            if response.code.is_success() {
                if attempt > 1 {
                    tracing::info!(group = group.name.as_str(), attempt, "planner recovered after retries");
                }
                self.persist_experience();
                return self.finish(response.trajectory, velocity_scale);
            }

            last = response.code;
            let empty = response.trajectory.as_ref().is_none_or(ConfigurationTrajectory::is_empty);
            failures.push(format!(
                "attempt {attempt}/{max_attempts}: {}",
                last.description(empty)
            ));
            if attempt < max_attempts {
                tracing::warn!(
                    group = group.name.as_str(),
                    attempt,
                    max_attempts,
                    code = %last,
                    "planning failed, retrying"
                );
            }
        }

        tracing::error!(
            group = group.name.as_str(),
            failures = failures.join("; "),
            "planning failed on every attempt"
        );
        self.observer.record_event(&ObserverEvent::Error {
            component: "planning".into(),
            message: format!("{} gave up after {max_attempts} attempts: {last}", group.name),
        });
        Err(PlanningError::Exhausted {
            attempts: max_attempts,
            last,
        })
    }

    fn finish(
        &self,
        trajectory: Option<ConfigurationTrajectory>,
        velocity_scale: f64,
    ) -> Result<PlannedMotion, PlanningError> {
        let Some(mut trajectory) = trajectory.filter(|t| !t.is_empty()) else {
            tracing::info!("{}", PlanErrorCode::Success.description(true));
            return Ok(PlannedMotion::AlreadySatisfied);
        };
        match trajectory.len() {
            1 => Err(PlanningError::InvalidMotionPlan { points: 1 }),
            2 => {
                tracing::debug!("planner returned 2 points, conditioning before dispatch");
                trajectory.clear_timing();
                let conditioned = self.conditioner.condition(trajectory, velocity_scale)?;
                Ok(PlannedMotion::Trajectory(conditioned))
            }
            _ => Ok(PlannedMotion::Trajectory(trajectory)),
        }
    }

    /// Saves and logs the experience database. Failures only warn.
    fn persist_experience(&self) {
        if !self.config.use_experience {
            return;
        }
        let Some(store) = self.planner.experience_store() else {
            tracing::debug!("planner exposes no experience store");
            return;
        };
        match store.save_if_changed() {
            Ok(true) => tracing::info!("experience database saved"),
            Ok(false) => tracing::debug!("experience database unchanged"),
            Err(e) => tracing::warn!("failed to save experience database: {e:#}"),
        }
        if let Some(path) = &self.config.experience_log_path
            && let Err(e) = append_data_log(store, path)
        {
            tracing::warn!(path = %path.display(), "failed to write experience data log: {e:#}");
        }
        tracing::info!(summary = %store.summary(), "experience planning");
    }
}

fn append_data_log(store: &dyn ExperienceStore, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context("Failed to create data log directory")?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    store.write_data_log(&mut file).context("Failed to write data log")?;
    file.flush().context("Failed to flush data log")?;
    Ok(())
}

/// World x/y/z of the group's base-translation joints, or the origin.
fn workspace_anchor(start: &RobotConfiguration, group: &ManipulationGroup) -> Point3<f64> {
    match &group.base_joints {
        Some([x, y, z]) => Point3::new(
            start.position(x).unwrap_or(0.0),
            start.position(y).unwrap_or(0.0),
            start.position(z).unwrap_or(0.0),
        ),
        None => Point3::origin(),
    }
}
