//! Velocity-limited time parameterization by finite differences.

use crate::core::interfaces::TimeParameterizer;
use crate::core::model::ConfigurationTrajectory;
use nalgebra::DVector;
use std::time::Duration;

/// Shortest segment duration handed out, so repeated points still advance.
const MIN_SEGMENT_SECS: f64 = 0.001;

/// Each segment takes as long as its largest joint change needs at
/// `max_velocity * velocity_scale`; velocities and accelerations are
/// central differences with quiescent endpoints.
#[derive(Debug, Clone, Copy)]
pub struct FiniteDifferenceParameterizer {
    max_velocity: f64,
}

impl FiniteDifferenceParameterizer {
    pub fn new(max_velocity: f64) -> Self {
        Self { max_velocity }
    }
}

impl Default for FiniteDifferenceParameterizer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl TimeParameterizer for FiniteDifferenceParameterizer {
    fn compute_time_stamps(
        &self,
        trajectory: &mut ConfigurationTrajectory,
        velocity_scale: f64,
    ) -> anyhow::Result<()> {
        if trajectory.is_empty() {
            anyhow::bail!("cannot time an empty trajectory");
        }
        let limit = self.max_velocity * velocity_scale;
        if !(limit > 0.0) {
            anyhow::bail!("velocity limit must be positive, got {limit}");
        }

        let dof = trajectory.joint_count();
        let points = trajectory.points_mut();
        let mut times = vec![0.0_f64; points.len()];
        for i in 1..points.len() {
            let step = (&points[i].positions - &points[i - 1].positions).amax();
            times[i] = times[i - 1] + (step / limit).max(MIN_SEGMENT_SECS);
        }

        let velocities: Vec<DVector<f64>> = (0..points.len())
            .map(|i| {
                if i == 0 || i + 1 == points.len() {
                    DVector::zeros(dof)
                } else {
                    (&points[i + 1].positions - &points[i - 1].positions)
                        / (times[i + 1] - times[i - 1])
                }
            })
            .collect();
        let accelerations: Vec<DVector<f64>> = (0..points.len())
            .map(|i| {
                if i == 0 || i + 1 == points.len() {
                    DVector::zeros(dof)
                } else {
                    (&velocities[i + 1] - &velocities[i - 1]) / (times[i + 1] - times[i - 1])
                }
            })
            .collect();

        for (i, point) in points.iter_mut().enumerate() {
            point.time_from_start = Duration::from_secs_f64(times[i]);
            point.velocities = Some(velocities[i].clone());
            point.accelerations = Some(accelerations[i].clone());
        }
        Ok(())
    }
}
