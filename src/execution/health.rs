//! Controller health: every hardware unit must report its trajectory
//! controllers as running before the first dispatch.

use crate::config::{ExecutionConfig, HardwareUnitConfig};
use crate::core::interfaces::ControllerDirectory;
use crate::error::HealthError;
use crate::runtime::observability::{Observer, ObserverEvent, ObserverMetric};
use std::sync::Arc;
use std::time::Duration;

const RUNNING: &str = "running";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitHealth {
    Healthy,
    ControllerMissing { controller: String },
    ControllerNotRunning { controller: String, state: String },
}

impl std::fmt::Display for UnitHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::ControllerMissing { controller } => write!(f, "{controller} not loaded"),
            Self::ControllerNotRunning { controller, state } => {
                write!(f, "{controller} is {state}")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub problems: Vec<(String, UnitHealth)>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn summary(&self) -> String {
        self.problems
            .iter()
            .map(|(unit, health)| format!("{unit}: {health}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub struct ControllerHealthMonitor {
    directory: Arc<dyn ControllerDirectory>,
    units: Vec<HardwareUnitConfig>,
    trajectory_controller: String,
    end_effector_controller: String,
    poll_interval: Duration,
    max_polls: Option<u32>,
    service_timeout: Duration,
    observer: Arc<dyn Observer>,
}

impl ControllerHealthMonitor {
    pub fn new(
        directory: Arc<dyn ControllerDirectory>,
        config: &ExecutionConfig,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            directory,
            units: config.hardware_units.clone(),
            trajectory_controller: config.trajectory_controller.clone(),
            end_effector_controller: config.end_effector_controller.clone(),
            poll_interval: config.health_poll_interval(),
            max_polls: config.health_max_polls,
            service_timeout: config.health_service_timeout(),
            observer,
        }
    }

    pub fn check_unit(&self, unit: &HardwareUnitConfig) -> Result<UnitHealth, HealthError> {
        let controllers = self
            .directory
            .list_controllers(&unit.name, self.service_timeout)
            .map_err(|e| HealthError::ServiceUnreachable {
                unit: unit.name.clone(),
                message: format!("{e:#}"),
            })?;

        let mut required = vec![self.trajectory_controller.as_str()];
        if unit.has_end_effector {
            required.push(self.end_effector_controller.as_str());
        }
        for name in required {
            match controllers.iter().find(|c| c.name == name) {
                None => {
                    return Ok(UnitHealth::ControllerMissing {
                        controller: name.to_string(),
                    });
                }
                Some(info) if info.state != RUNNING => {
                    return Ok(UnitHealth::ControllerNotRunning {
                        controller: info.name.clone(),
                        state: info.state.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(UnitHealth::Healthy)
    }

    /// One pass over every unit. An unreachable controller manager aborts.
    pub fn check_once(&self) -> Result<HealthReport, HealthError> {
        let mut report = HealthReport::default();
        for unit in &self.units {
            let health = self.check_unit(unit)?;
            if health != UnitHealth::Healthy {
                report.problems.push((unit.name.clone(), health));
            }
        }
        Ok(report)
    }

    /// Polls until healthy, the poll cap is hit, or `is_alive` turns false.
    /// Returns the number of polls taken.
    pub fn wait_until_healthy(&self, is_alive: &dyn Fn() -> bool) -> Result<u32, HealthError> {
        let mut polls = 0u32;
        loop {
            polls += 1;
            let report = self.check_once()?;
            if report.is_healthy() {
                self.observer
                    .record_metric(&ObserverMetric::HealthPolls(polls));
                return Ok(polls);
            }

            for (unit, health) in &report.problems {
                self.observer.record_event(&ObserverEvent::ControllerUnhealthy {
                    unit: unit.clone(),
                    reason: health.to_string(),
                });
            }
            if let Some(max) = self.max_polls
                && polls >= max
            {
                return Err(HealthError::Unhealthy {
                    polls,
                    reason: report.summary(),
                });
            }
            if !is_alive() {
                return Err(HealthError::Cancelled { polls });
            }
            tracing::warn!(polls, problems = %report.summary(), "controllers not ready, polling again");
            std::thread::sleep(self.poll_interval);
        }
    }
}
