use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A hardware unit whose controller manager is polled before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareUnitConfig {
    pub name: String,
    #[serde(default)]
    pub has_end_effector: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Start with autonomy on (no operator confirmation).
    #[serde(default)]
    pub autonomous: bool,

    /// Write each dispatched arm trajectory under `<package_root>/trajectories`.
    #[serde(default = "default_true")]
    pub persist_trajectories: bool,

    #[serde(default = "default_true")]
    pub check_controller_health: bool,

    #[serde(default = "default_units")]
    pub hardware_units: Vec<HardwareUnitConfig>,

    #[serde(default = "default_main_controller")]
    pub trajectory_controller: String,

    #[serde(default = "default_ee_controller")]
    pub end_effector_controller: String,

    #[serde(default = "default_poll_interval_ms")]
    pub health_poll_interval_ms: u64,

    /// Give up after this many unhealthy polls; unbounded when unset.
    #[serde(default)]
    pub health_max_polls: Option<u32>,

    #[serde(default = "default_service_timeout_ms")]
    pub health_service_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_units() -> Vec<HardwareUnitConfig> {
    vec![
        HardwareUnitConfig {
            name: "zaber".into(),
            has_end_effector: false,
        },
        HardwareUnitConfig {
            name: "kinova".into(),
            has_end_effector: true,
        },
    ]
}

fn default_main_controller() -> String {
    "velocity_trajectory_controller".into()
}

fn default_ee_controller() -> String {
    "ee_velocity_trajectory_controller".into()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_service_timeout_ms() -> u64 {
    1000
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            autonomous: false,
            persist_trajectories: true,
            check_controller_health: true,
            hardware_units: default_units(),
            trajectory_controller: default_main_controller(),
            end_effector_controller: default_ee_controller(),
            health_poll_interval_ms: default_poll_interval_ms(),
            health_max_polls: None,
            health_service_timeout_ms: default_service_timeout_ms(),
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.check_controller_health && self.hardware_units.is_empty() {
            anyhow::bail!("execution.hardware_units must not be empty when health checks are on");
        }
        if self.trajectory_controller.trim().is_empty() {
            anyhow::bail!("execution.trajectory_controller must not be empty");
        }
        if self.health_max_polls == Some(0) {
            anyhow::bail!("execution.health_max_polls must be >= 1 when set");
        }
        Ok(())
    }

    pub fn health_poll_interval(&self) -> Duration {
        Duration::from_millis(self.health_poll_interval_ms)
    }

    pub fn health_service_timeout(&self) -> Duration {
        Duration::from_millis(self.health_service_timeout_ms)
    }
}
