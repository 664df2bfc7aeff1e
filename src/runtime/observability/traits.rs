use crate::core::model::{ExecutionOutcome, PlanErrorCode};
use crate::core::recovery::EscapeMotion;
use std::time::Duration;

/// Events the observer can record
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    PlanAttempt {
        group: String,
        attempt: u32,
        max_attempts: u32,
        code: PlanErrorCode,
    },
    CartesianShortfall {
        group: String,
        achieved: f64,
        desired: f64,
    },
    TrajectoryDispatched {
        group: String,
        points: usize,
        duration: Duration,
    },
    ExecutionFinished {
        group: String,
        outcome: ExecutionOutcome,
        elapsed: Duration,
    },
    AutonomyDemoted {
        reason: String,
    },
    RecoverySelected {
        object: Option<String>,
        motion: EscapeMotion,
        randomized: bool,
    },
    ControllerUnhealthy {
        unit: String,
        reason: String,
    },
    Error {
        component: String,
        message: String,
    },
}

/// Numeric metrics
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverMetric {
    PlanLatency(Duration),
    SynthesisAttempts(u32),
    TrajectoryPoints(u64),
    HealthPolls(u32),
}

/// Sink for orchestration events and metrics
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &ObserverEvent);

    /// Record a numeric metric
    fn record_metric(&self, metric: &ObserverMetric);

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
