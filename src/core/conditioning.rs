//! Trajectory conditioning: densify sparse paths, then time-parameterize.

use super::interfaces::TimeParameterizer;
use super::model::{ConfigurationTrajectory, ManipulationGroup, RobotConfiguration, TrajectoryPoint};
use crate::config::ConditioningConfig;
use crate::error::ConditioningError;
use nalgebra::DVector;
use std::sync::Arc;

/// Smallest trajectory the execution runtime accepts.
pub const MIN_DISPATCH_POINTS: usize = 3;

pub struct TrajectoryConditioner {
    parameterizer: Arc<dyn TimeParameterizer>,
    min_density: usize,
    discretization: f64,
}

impl TrajectoryConditioner {
    pub fn new(parameterizer: Arc<dyn TimeParameterizer>, config: &ConditioningConfig) -> Self {
        Self {
            parameterizer,
            min_density: config.min_density,
            discretization: config.discretization,
        }
    }

    pub fn discretization(&self) -> f64 {
        self.discretization
    }

    /// Conditions a sequence of full robot configurations for `group`.
    pub fn condition_configurations(
        &self,
        group: &ManipulationGroup,
        configurations: &[RobotConfiguration],
        velocity_scale: f64,
    ) -> Result<ConfigurationTrajectory, ConditioningError> {
        if configurations.len() < 2 {
            return Err(ConditioningError::TooFewWaypoints {
                count: configurations.len(),
            });
        }
        let trajectory = ConfigurationTrajectory::from_configurations(group, configurations)?;
        self.condition(trajectory, velocity_scale)
    }

    /// Densifies below the density threshold, parameterizes, and guarantees
    /// at least [`MIN_DISPATCH_POINTS`] waypoints with non-decreasing
    /// timestamps and quiescent endpoints.
    pub fn condition(
        &self,
        trajectory: ConfigurationTrajectory,
        velocity_scale: f64,
    ) -> Result<ConfigurationTrajectory, ConditioningError> {
        if !(velocity_scale > 0.0 && velocity_scale <= 1.0) {
            return Err(ConditioningError::InvalidVelocityScale(velocity_scale));
        }
        if trajectory.len() < 2 {
            return Err(ConditioningError::TooFewWaypoints {
                count: trajectory.len(),
            });
        }

        let mut trajectory = if trajectory.len() < self.min_density {
            let dense = densify_to(&trajectory, self.min_density, self.discretization);
            tracing::debug!(
                group = trajectory.group_name(),
                before = trajectory.len(),
                after = dense.len(),
                "densified trajectory"
            );
            dense
        } else {
            trajectory
        };

        self.parameterize(&mut trajectory, velocity_scale)?;

        if trajectory.len() < MIN_DISPATCH_POINTS {
            tracing::warn!(
                points = trajectory.len(),
                "trajectory too short after parameterization, re-densifying"
            );
            trajectory.clear_timing();
            trajectory = densify(&trajectory, self.discretization);
            self.parameterize(&mut trajectory, velocity_scale)?;
            if trajectory.len() < MIN_DISPATCH_POINTS {
                return Err(ConditioningError::TooFewWaypoints {
                    count: trajectory.len(),
                });
            }
        }

        if let Some(index) = trajectory.first_time_regression() {
            return Err(ConditioningError::NonMonotonicTimestamps { index });
        }
        quiesce_endpoints(&mut trajectory);
        Ok(trajectory)
    }

    fn parameterize(
        &self,
        trajectory: &mut ConfigurationTrajectory,
        velocity_scale: f64,
    ) -> Result<(), ConditioningError> {
        self.parameterizer
            .compute_time_stamps(trajectory, velocity_scale)
            .map_err(|e| ConditioningError::Parameterization(format!("{e:#}")))
    }
}

/// One densification pass: between every consecutive pair insert points at
/// fractions `step, 2*step, ...` strictly below 1. The result is untimed.
pub fn densify(trajectory: &ConfigurationTrajectory, step: f64) -> ConfigurationTrajectory {
    let points = trajectory.points();
    if points.len() < 2 || !(step > 0.0 && step < 1.0) {
        let mut untimed = trajectory.clone();
        untimed.clear_timing();
        return untimed;
    }

    let mut dense = Vec::with_capacity(points.len() * 4);
    for pair in points.windows(2) {
        let (a, b) = (&pair[0].positions, &pair[1].positions);
        dense.push(TrajectoryPoint::untimed(a.clone()));
        let mut k = 1u32;
        loop {
            let t = f64::from(k) * step;
            if t >= 1.0 - 1e-9 {
                break;
            }
            dense.push(TrajectoryPoint::untimed(a.lerp(b, t)));
            k += 1;
        }
    }
    if let Some(last) = points.last() {
        dense.push(TrajectoryPoint::untimed(last.positions.clone()));
    }
    trajectory.with_points(dense)
}

/// Repeats [`densify`] until the trajectory has at least `min_points`.
pub fn densify_to(
    trajectory: &ConfigurationTrajectory,
    min_points: usize,
    step: f64,
) -> ConfigurationTrajectory {
    let mut current = densify(trajectory, step);
    while current.len() < min_points {
        let next = densify(&current, step);
        if next.len() == current.len() {
            break;
        }
        current = next;
    }
    current
}

fn quiesce_endpoints(trajectory: &mut ConfigurationTrajectory) {
    let dof = trajectory.joint_count();
    let points = trajectory.points_mut();
    let last = points.len().saturating_sub(1);
    for index in [0, last] {
        let Some(point) = points.get_mut(index) else {
            continue;
        };
        point.velocities = Some(DVector::zeros(dof));
        if point.accelerations.is_some() {
            point.accelerations = Some(DVector::zeros(dof));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Uniform 0.1 s spacing with constant velocity, recording input lengths.
    struct UniformClock {
        seen: Mutex<Vec<usize>>,
        drop_to: Option<usize>,
    }

    impl UniformClock {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                drop_to: None,
            }
        }
    }

    impl TimeParameterizer for UniformClock {
        fn compute_time_stamps(
            &self,
            trajectory: &mut ConfigurationTrajectory,
            _velocity_scale: f64,
        ) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(trajectory.len());
            let dof = trajectory.joint_count();
            for (i, point) in trajectory.points_mut().iter_mut().enumerate() {
                point.time_from_start = Duration::from_millis(100 * i as u64);
                point.velocities = Some(DVector::from_element(dof, 0.5));
                point.accelerations = Some(DVector::from_element(dof, 0.1));
            }
            if let Some(keep) = self.drop_to {
                let kept: Vec<_> = trajectory.points().iter().take(keep).cloned().collect();
                *trajectory = trajectory.with_points(kept);
            }
            Ok(())
        }
    }

    fn conditioner(clock: Arc<UniformClock>, min_density: usize) -> TrajectoryConditioner {
        TrajectoryConditioner::new(
            clock,
            &ConditioningConfig {
                min_density,
                discretization: 0.25,
            },
        )
    }

    fn line(n: usize) -> ConfigurationTrajectory {
        let mut trajectory = ConfigurationTrajectory::new("arm", vec!["a".into(), "b".into()]);
        for i in 0..n {
            let x = i as f64;
            trajectory
                .push_point(TrajectoryPoint::untimed(DVector::from_row_slice(&[x, -x])))
                .unwrap();
        }
        trajectory
    }

    #[test]
    fn single_pass_inserts_three_points_per_segment() {
        assert_eq!(densify(&line(2), 0.25).len(), 5);
        assert_eq!(densify(&line(5), 0.25).len(), 17);
    }

    #[test]
    fn densify_keeps_endpoints() {
        let dense = densify(&line(2), 0.25);
        assert_eq!(dense.first().unwrap().positions.as_slice(), &[0.0, 0.0]);
        assert_eq!(dense.last().unwrap().positions.as_slice(), &[1.0, -1.0]);
        assert!((dense.points()[1].positions[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn densify_to_reaches_threshold() {
        assert_eq!(densify_to(&line(2), 20, 0.25).len(), 65);
        assert!(densify_to(&line(19), 20, 0.25).len() >= 20);
    }

    #[test]
    fn non_terminating_step_is_ignored() {
        assert_eq!(densify_to(&line(2), 20, 1.5).len(), 2);
    }

    #[test]
    fn two_points_are_expanded_before_parameterization() {
        let clock = Arc::new(UniformClock::new());
        let out = conditioner(Arc::clone(&clock), 20).condition(line(2), 0.5).unwrap();
        assert!(out.len() >= 20);
        let seen = clock.seen.lock().unwrap();
        assert!(seen[0] >= 3);
    }

    #[test]
    fn long_inputs_are_not_densified() {
        let clock = Arc::new(UniformClock::new());
        let out = conditioner(Arc::clone(&clock), 20).condition(line(25), 0.5).unwrap();
        assert_eq!(out.len(), 25);
    }

    #[test]
    fn endpoints_are_quiescent() {
        let clock = Arc::new(UniformClock::new());
        let out = conditioner(clock, 20).condition(line(3), 0.5).unwrap();
        let first = out.first().unwrap();
        let last = out.last().unwrap();
        assert_eq!(first.velocities.as_ref().unwrap().amax(), 0.0);
        assert_eq!(last.accelerations.as_ref().unwrap().amax(), 0.0);
        assert!(out.points()[1].velocities.as_ref().unwrap().amax() > 0.0);
    }

    #[test]
    fn short_parameterized_output_is_redensified() {
        let clock = Arc::new(UniformClock {
            seen: Mutex::new(Vec::new()),
            drop_to: Some(2),
        });
        let err = conditioner(Arc::clone(&clock), 2).condition(line(2), 0.5).unwrap_err();
        assert!(matches!(err, ConditioningError::TooFewWaypoints { count: 2 }));
        assert_eq!(clock.seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn rejects_bad_inputs() {
        let c = conditioner(Arc::new(UniformClock::new()), 20);
        assert!(matches!(
            c.condition(line(1), 0.5),
            Err(ConditioningError::TooFewWaypoints { count: 1 })
        ));
        assert!(matches!(
            c.condition(line(4), 0.0),
            Err(ConditioningError::InvalidVelocityScale(_))
        ));
        assert!(matches!(
            c.condition(line(4), 1.5),
            Err(ConditioningError::InvalidVelocityScale(_))
        ));
    }

    #[test]
    fn timestamps_non_decreasing() {
        let out = conditioner(Arc::new(UniformClock::new()), 20)
            .condition(line(4), 1.0)
            .unwrap();
        assert!(out.first_time_regression().is_none());
        assert!(out.len() >= MIN_DISPATCH_POINTS);
    }
}
