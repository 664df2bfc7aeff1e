use super::Manipulation;
use super::motion::MoveOutcome;
use crate::core::conditioning::densify;
use crate::core::model::{ConfigurationTrajectory, RobotConfiguration};
use crate::error::{MotionError, PersistenceError, Result};
use nalgebra::DVector;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

impl Manipulation {
    /// Samples the current configuration every record interval until the
    /// operator raises the stop flag, one comma-separated line per sample.
    /// The stop flag is lowered again on return.
    pub fn record_trajectory_to_file(&self, path: &Path) -> Result<usize> {
        let operator = self.operator();
        let interval = Duration::from_millis(self.recording.record_interval_ms);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(PersistenceError::from)?;
        }
        let file = std::fs::File::create(path).map_err(PersistenceError::from)?;
        let mut out = BufWriter::new(file);

        let mut samples = 0;
        while !operator.stop_requested() {
            let configuration = self.current_configuration();
            let line = configuration
                .positions()
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            writeln!(out, "{line}").map_err(PersistenceError::from)?;
            samples += 1;
            std::thread::sleep(interval);
        }
        out.flush().map_err(PersistenceError::from)?;
        operator.set_stop(false);
        tracing::info!(path = %path.display(), samples, "recording finished");
        Ok(samples)
    }

    /// Reads a recording made by [`Self::record_trajectory_to_file`].
    pub fn load_recording(&self, path: &Path) -> Result<Vec<RobotConfiguration>> {
        let text = std::fs::read_to_string(path).map_err(PersistenceError::from)?;
        let template = self.current_configuration();
        let mut configurations = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let values = line
                .split(',')
                .map(|field| field.trim().parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| PersistenceError::Parse {
                    line: index + 1,
                    message: e.to_string(),
                })?;
            let configuration =
                RobotConfiguration::from_shared(template.shared_joint_names(), DVector::from_vec(values))
                    .map_err(|e| PersistenceError::Parse {
                        line: index + 1,
                        message: e.to_string(),
                    })?;
            configurations.push(configuration);
        }
        if configurations.is_empty() {
            return Err(MotionError::EmptyRecording(path.display().to_string()).into());
        }
        Ok(configurations)
    }

    /// Plans to the first recorded configuration, then dispatches the whole
    /// recording as one conditioned trajectory. The recording always gets one
    /// interpolation pass at the conditioning discretization, however long
    /// it is.
    pub fn playback_trajectory_from_file(
        &mut self,
        path: &Path,
        group: &str,
        velocity_scale: f64,
    ) -> Result<MoveOutcome> {
        let recorded = self.load_recording(path)?;
        self.move_to(&recorded[0], group, velocity_scale, true)?;
        if recorded.len() < 2 {
            return Ok(MoveOutcome::AlreadySatisfied);
        }
        let group = self.group(group)?;
        let sampled = ConfigurationTrajectory::from_configurations(&group, &recorded)?;
        let dense = densify(&sampled, self.conditioner.discretization());
        tracing::debug!(recorded = sampled.len(), dense = dense.len(), "interpolated recording");
        let trajectory = self.conditioner.condition(dense, velocity_scale)?;
        self.dispatch(&trajectory)
    }

    /// Dispatches each recorded configuration as its own direct move,
    /// checking the stop flag between moves. Returns the number of
    /// configurations reached.
    pub fn playback_trajectory_interactive(
        &mut self,
        path: &Path,
        group: &str,
        velocity_scale: f64,
    ) -> Result<usize> {
        let recorded = self.load_recording(path)?;
        let mut reached = 0;
        for configuration in &recorded {
            if self.operator().stop_requested() {
                self.operator().set_stop(false);
                tracing::info!(reached, total = recorded.len(), "playback stopped by operator");
                return Err(MotionError::Stopped.into());
            }
            self.execute_state(configuration, group, velocity_scale)?;
            reached += 1;
        }
        Ok(reached)
    }

    /// Polls until the configuration stops changing, or `timeout` passes.
    pub fn wait_for_robot_to_stop(&self, timeout: Duration) -> bool {
        let poll = Duration::from_millis(self.recording.settle_poll_interval_ms);
        let deadline = Instant::now() + timeout;
        let mut previous = self.current_configuration();
        let mut still_passes = 0u32;
        while Instant::now() < deadline {
            std::thread::sleep(poll);
            let current = self.current_configuration();
            let moved = if current.len() == previous.len() {
                (current.positions() - previous.positions()).amax()
            } else {
                f64::INFINITY
            };
            if moved < self.recording.settle_threshold {
                still_passes += 1;
            } else {
                still_passes = 0;
            }
            if still_passes > self.recording.settle_passes {
                return true;
            }
            previous = current;
        }
        tracing::warn!(?timeout, "robot did not settle in time");
        false
    }
}
