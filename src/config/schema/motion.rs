use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Velocity scaling factors per motion kind, each in (0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    #[serde(default = "default_main_velocity")]
    pub main_velocity_scaling_factor: f64,

    #[serde(default = "default_slow_velocity")]
    pub approach_velocity_scaling_factor: f64,

    #[serde(default = "default_slow_velocity")]
    pub lift_velocity_scaling_factor: f64,

    #[serde(default = "default_slow_velocity")]
    pub retreat_velocity_scaling_factor: f64,

    #[serde(default = "default_slow_velocity")]
    pub end_effector_velocity_scaling_factor: f64,

    /// Interpolation step for direct (non-planned) state moves.
    #[serde(default = "default_direct_resolution")]
    pub direct_move_resolution: f64,

    /// Interpolation step for end-effector open/close trajectories.
    #[serde(default = "default_direct_resolution")]
    pub end_effector_resolution: f64,
}

fn default_main_velocity() -> f64 {
    0.2
}

fn default_slow_velocity() -> f64 {
    0.1
}

fn default_direct_resolution() -> f64 {
    0.1
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            main_velocity_scaling_factor: default_main_velocity(),
            approach_velocity_scaling_factor: default_slow_velocity(),
            lift_velocity_scaling_factor: default_slow_velocity(),
            retreat_velocity_scaling_factor: default_slow_velocity(),
            end_effector_velocity_scaling_factor: default_slow_velocity(),
            direct_move_resolution: default_direct_resolution(),
            end_effector_resolution: default_direct_resolution(),
        }
    }
}

pub(crate) fn validate_scale(label: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        anyhow::bail!("{label} must be in (0.0, 1.0], got {value}");
    }
    Ok(())
}

pub(crate) fn validate_fraction_step(label: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        anyhow::bail!("{label} must be in (0.0, 1.0), got {value}");
    }
    Ok(())
}

impl MotionConfig {
    pub fn validate(&self) -> Result<()> {
        validate_scale(
            "motion.main_velocity_scaling_factor",
            self.main_velocity_scaling_factor,
        )?;
        validate_scale(
            "motion.approach_velocity_scaling_factor",
            self.approach_velocity_scaling_factor,
        )?;
        validate_scale(
            "motion.lift_velocity_scaling_factor",
            self.lift_velocity_scaling_factor,
        )?;
        validate_scale(
            "motion.retreat_velocity_scaling_factor",
            self.retreat_velocity_scaling_factor,
        )?;
        validate_scale(
            "motion.end_effector_velocity_scaling_factor",
            self.end_effector_velocity_scaling_factor,
        )?;
        validate_fraction_step("motion.direct_move_resolution", self.direct_move_resolution)?;
        validate_fraction_step("motion.end_effector_resolution", self.end_effector_resolution)?;
        Ok(())
    }
}

/// Joint-bounds tolerance for pre-flight checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundsConfig {
    #[serde(default = "default_max_bounds_error")]
    pub max_bounds_error: f64,
}

fn default_max_bounds_error() -> f64 {
    0.1
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            max_bounds_error: default_max_bounds_error(),
        }
    }
}

impl BoundsConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_bounds_error >= 0.0) {
            anyhow::bail!("bounds.max_bounds_error must be >= 0.0");
        }
        Ok(())
    }
}

/// Recording, playback and robot-settling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(default = "default_record_interval_ms")]
    pub record_interval_ms: u64,

    #[serde(default = "default_settle_poll_ms")]
    pub settle_poll_interval_ms: u64,

    /// Max joint change between polls for the robot to count as still.
    #[serde(default = "default_settle_threshold")]
    pub settle_threshold: f64,

    /// Consecutive still polls required, strictly exceeded.
    #[serde(default = "default_settle_passes")]
    pub settle_passes: u32,
}

fn default_record_interval_ms() -> u64 {
    250
}

fn default_settle_poll_ms() -> u64 {
    100
}

fn default_settle_threshold() -> f64 {
    0.002
}

fn default_settle_passes() -> u32 {
    2
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            record_interval_ms: default_record_interval_ms(),
            settle_poll_interval_ms: default_settle_poll_ms(),
            settle_threshold: default_settle_threshold(),
            settle_passes: default_settle_passes(),
        }
    }
}

impl RecordingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.settle_threshold > 0.0) {
            anyhow::bail!("recording.settle_threshold must be > 0.0");
        }
        Ok(())
    }
}
