use super::super::{
    BoundsConfig, ConditioningConfig, ExecutionConfig, MotionConfig, ObservabilityConfig,
    PlanningConfig, RecordingConfig, RecoveryConfig, RobotConfig, SynthesisConfig,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed on load, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Root for persisted trajectories and recordings; `~` is expanded.
    #[serde(default = "default_package_root")]
    pub package_root: String,

    #[serde(default)]
    pub robot: RobotConfig,

    #[serde(default)]
    pub motion: MotionConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub conditioning: ConditioningConfig,

    #[serde(default)]
    pub planning: PlanningConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub recovery: RecoveryConfig,

    #[serde(default)]
    pub bounds: BoundsConfig,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_package_root() -> String {
    "~/.armflow".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            package_root: default_package_root(),
            robot: RobotConfig::default(),
            motion: MotionConfig::default(),
            synthesis: SynthesisConfig::default(),
            conditioning: ConditioningConfig::default(),
            planning: PlanningConfig::default(),
            execution: ExecutionConfig::default(),
            recovery: RecoveryConfig::default(),
            bounds: BoundsConfig::default(),
            recording: RecordingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn package_root_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.package_root).as_ref())
    }

    /// Directory holding `trajectory.csv`.
    pub fn trajectory_dir(&self) -> PathBuf {
        self.package_root_path().join("trajectories")
    }

    pub fn validate(&self) -> Result<()> {
        if self.package_root.trim().is_empty() {
            anyhow::bail!("package_root must not be empty");
        }
        self.robot.validate()?;
        self.motion.validate()?;
        self.synthesis.validate()?;
        self.conditioning.validate()?;
        self.planning.validate()?;
        self.execution.validate()?;
        self.recovery.validate()?;
        self.bounds.validate()?;
        self.recording.validate()?;
        match self.observability.backend.as_str() {
            "log" | "none" | "noop" => Ok(()),
            other => anyhow::bail!("observability.backend {other} is not supported"),
        }
    }
}
