//! Cartesian path synthesis with bounded IK retry.

use super::interfaces::{CartesianPathOracle, CartesianRequest, WorldModel};
use super::model::{CartesianTarget, CollisionMode, ManipulationGroup, RobotConfiguration, WaypointSpec};
use crate::config::SynthesisConfig;
use crate::error::SynthesisError;
use crate::runtime::observability::{Observer, ObserverEvent, ObserverMetric};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Reverse the path and report its new first element as pre-position.
    pub reverse: bool,
    pub collision_mode: CollisionMode,
}

impl SynthesisOptions {
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn ignoring_world(mut self) -> Self {
        self.collision_mode = CollisionMode::SelfOnly;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedPath {
    pub configurations: Vec<RobotConfiguration>,
    pub achieved: f64,
    pub desired: f64,
    pub attempts: u32,
    /// Start of a reversed path, e.g. the pre-grasp pose of an approach.
    pub pre_position: Option<RobotConfiguration>,
}

impl SynthesizedPath {
    pub fn achieved_ratio(&self) -> f64 {
        if self.desired > 0.0 {
            self.achieved / self.desired
        } else {
            0.0
        }
    }
}

pub struct PathSynthesizer {
    oracle: Arc<dyn CartesianPathOracle>,
    max_step: f64,
    max_attempts: u32,
    shortfall_ratio: f64,
    observer: Arc<dyn Observer>,
}

impl PathSynthesizer {
    pub fn new(
        oracle: Arc<dyn CartesianPathOracle>,
        config: &SynthesisConfig,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            oracle,
            max_step: config.max_step,
            max_attempts: config.max_attempts.max(1),
            shortfall_ratio: config.shortfall_warning_ratio,
            observer,
        }
    }

    /// Dense, collision-validated configurations for `spec` starting at
    /// `start`. Any non-zero achieved value is accepted; zero is retried up to
    /// the attempt budget.
    pub fn synthesize(
        &self,
        scene: &dyn WorldModel,
        start: &RobotConfiguration,
        group: &ManipulationGroup,
        spec: &WaypointSpec,
        options: SynthesisOptions,
    ) -> Result<SynthesizedPath, SynthesisError> {
        let target = self.normalized_target(&spec.target)?;
        let desired = spec.desired();
        let is_valid = |candidate: &RobotConfiguration| {
            !scene
                .check_collision(candidate, group, options.collision_mode)
                .is_colliding()
        };
        let request = CartesianRequest {
            group,
            tip_link: &group.ik_tip_link,
            target: &target,
            max_step: self.max_step,
            jump_threshold: spec.jump_threshold.unwrap_or(group.jump_threshold),
        };

        let mut failures = Vec::new();
        for attempt in 1..=self.max_attempts {
            let path = self.oracle.compute_cartesian_path(start, &request, &is_valid);

            if !(path.achieved > 0.0) || path.configurations.len() < 2 {
                failures.push(format!(
                    "attempt {attempt}/{}: achieved {} over {} configurations",
                    self.max_attempts,
                    path.achieved,
                    path.configurations.len()
                ));
                tracing::warn!(
                    group = group.name.as_str(),
                    attempt,
                    max_attempts = self.max_attempts,
                    "cartesian path made no progress, retrying"
                );
                continue;
            }

            if path.achieved <= desired * self.shortfall_ratio {
                tracing::warn!(
                    group = group.name.as_str(),
                    achieved = path.achieved,
                    desired,
                    "cartesian path fell short of the requested distance, accepting anyway"
                );
                self.observer.record_event(&ObserverEvent::CartesianShortfall {
                    group: group.name.clone(),
                    achieved: path.achieved,
                    desired,
                });
            }
            if attempt > 1 {
                tracing::info!(group = group.name.as_str(), attempt, "cartesian path recovered after retries");
            }
            self.observer
                .record_metric(&ObserverMetric::SynthesisAttempts(attempt));

            let mut configurations = path.configurations;
            let pre_position = if options.reverse {
                configurations.reverse();
                configurations.first().cloned()
            } else {
                None
            };
            return Ok(SynthesizedPath {
                configurations,
                achieved: path.achieved,
                desired,
                attempts: attempt,
                pre_position,
            });
        }

        tracing::error!(
            group = group.name.as_str(),
            failures = failures.join("; "),
            "no cartesian path found"
        );
        Err(SynthesisError::Exhausted {
            attempts: self.max_attempts,
        })
    }

    fn normalized_target(&self, target: &CartesianTarget) -> Result<CartesianTarget, SynthesisError> {
        match target {
            CartesianTarget::Direction {
                direction,
                distance,
            } => {
                let norm = direction.norm();
                if !norm.is_finite() || norm <= f64::EPSILON {
                    return Err(SynthesisError::InvalidDirection);
                }
                if !(*distance >= self.max_step) {
                    return Err(SynthesisError::DistanceBelowResolution {
                        desired: *distance,
                        max_step: self.max_step,
                    });
                }
                Ok(CartesianTarget::Direction {
                    direction: direction / norm,
                    distance: *distance,
                })
            }
            CartesianTarget::Waypoints(poses) if poses.is_empty() => {
                Err(SynthesisError::EmptyWaypoints)
            }
            CartesianTarget::Waypoints(_) => Ok(target.clone()),
        }
    }
}
