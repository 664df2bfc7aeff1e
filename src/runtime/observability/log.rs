use super::traits::{Observer, ObserverEvent, ObserverMetric};
use tracing::{info, warn};

/// Observer that forwards events to tracing
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::PlanAttempt {
                group,
                attempt,
                max_attempts,
                code,
            } => {
                info!(group = %group, attempt, max_attempts, code = %code, "plan.attempt");
            }
            ObserverEvent::CartesianShortfall {
                group,
                achieved,
                desired,
            } => {
                warn!(group = %group, achieved, desired, "cartesian.shortfall");
            }
            ObserverEvent::TrajectoryDispatched {
                group,
                points,
                duration,
            } => {
                info!(group = %group, points, duration_ms = millis(*duration), "trajectory.dispatched");
            }
            ObserverEvent::ExecutionFinished {
                group,
                outcome,
                elapsed,
            } => {
                info!(group = %group, outcome = %outcome, elapsed_ms = millis(*elapsed), "execution.finished");
            }
            ObserverEvent::AutonomyDemoted { reason } => {
                warn!(reason = %reason, "autonomy.demoted");
            }
            ObserverEvent::RecoverySelected {
                object,
                motion,
                randomized,
            } => {
                info!(object = ?object, motion = %motion, randomized, "recovery.selected");
            }
            ObserverEvent::ControllerUnhealthy { unit, reason } => {
                warn!(unit = %unit, reason = %reason, "controller.unhealthy");
            }
            ObserverEvent::Error { component, message } => {
                info!(component = %component, error = %message, "error");
            }
        }
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        match metric {
            ObserverMetric::PlanLatency(d) => {
                info!(latency_ms = millis(*d), "metric.plan_latency");
            }
            ObserverMetric::SynthesisAttempts(n) => {
                info!(attempts = n, "metric.synthesis_attempts");
            }
            ObserverMetric::TrajectoryPoints(n) => {
                info!(points = n, "metric.trajectory_points");
            }
            ObserverMetric::HealthPolls(n) => {
                info!(polls = n, "metric.health_polls");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
