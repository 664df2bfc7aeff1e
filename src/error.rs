use crate::core::model::{ExecutionOutcome, PlanErrorCode};
use crate::core::recovery::EscapeMotion;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `armflow`.
///
/// Each orchestration stage defines its own error variant. Callers match on
/// these to decide whether to re-attempt a task step, trigger recovery or hand
/// control back to the operator; configuration and CLI code keeps using
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum ArmflowError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Robot model ─────────────────────────────────────────────────────
    #[error("model: {0}")]
    Model(#[from] ModelError),

    // ── Cartesian synthesis ─────────────────────────────────────────────
    #[error("synthesis: {0}")]
    Synthesis(#[from] SynthesisError),

    // ── Conditioning ────────────────────────────────────────────────────
    #[error("conditioning: {0}")]
    Conditioning(#[from] ConditioningError),

    // ── Global planning ─────────────────────────────────────────────────
    #[error("planning: {0}")]
    Planning(#[from] PlanningError),

    // ── Execution / dispatch ────────────────────────────────────────────
    #[error("execution: {0}")]
    Execution(#[from] ExecutionError),

    // ── Controller health ───────────────────────────────────────────────
    #[error("health: {0}")]
    Health(#[from] HealthError),

    // ── Collision recovery ──────────────────────────────────────────────
    #[error("recovery: {0}")]
    Recovery(#[from] RecoveryError),

    // ── Persistence ─────────────────────────────────────────────────────
    #[error("persistence: {0}")]
    Persistence(#[from] PersistenceError),

    // ── Motion pre-flight ───────────────────────────────────────────────
    #[error("motion: {0}")]
    Motion(#[from] MotionError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Robot model errors ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("unknown joint {0}")]
    UnknownJoint(String),

    #[error("unknown group {0}")]
    UnknownGroup(String),

    #[error("group {group} has no named pose {pose}")]
    UnknownNamedPose { group: String, pose: String },

    #[error("expected {expected} joint values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("configurations do not share the same joint layout")]
    LayoutMismatch,
}

// ─── Synthesis errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("desired distance {desired} is below the cartesian resolution {max_step}")]
    DistanceBelowResolution { desired: f64, max_step: f64 },

    #[error("direction vector has zero length")]
    InvalidDirection,

    #[error("waypoint list is empty")]
    EmptyWaypoints,

    #[error("no cartesian path found after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error(transparent)]
    Model(#[from] ModelError),
}

// ─── Conditioning errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConditioningError {
    #[error("trajectory needs at least 2 configurations, got {count}")]
    TooFewWaypoints { count: usize },

    #[error("velocity scaling factor {0} is outside (0, 1]")]
    InvalidVelocityScale(f64),

    #[error("timestamps decrease at waypoint {index}")]
    NonMonotonicTimestamps { index: usize },

    #[error("time parameterization failed: {0}")]
    Parameterization(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

// ─── Planning errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("planner failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: PlanErrorCode },

    #[error("planner returned an unusable trajectory with {points} points")]
    InvalidMotionPlan { points: usize },

    #[error(transparent)]
    Conditioning(#[from] ConditioningError),
}

impl PlanningError {
    /// Error code as reported to the task layer.
    pub fn code(&self) -> PlanErrorCode {
        match self {
            Self::Exhausted { last, .. } => *last,
            Self::InvalidMotionPlan { .. } | Self::Conditioning(_) => {
                PlanErrorCode::InvalidMotionPlan
            }
        }
    }
}

// ─── Execution errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("trajectory has {points} waypoints, at least 3 are required for dispatch")]
    TrajectoryTooShort { points: usize },

    #[error("execution runtime rejected the trajectory")]
    PushRejected,

    #[error("trajectory execution ended with {0}")]
    Failed(ExecutionOutcome),

    #[error(transparent)]
    Health(#[from] HealthError),
}

impl ExecutionError {
    pub fn code(&self) -> PlanErrorCode {
        match self {
            Self::Failed(outcome) => outcome.error_code(),
            Self::TrajectoryTooShort { .. } => PlanErrorCode::InvalidMotionPlan,
            Self::PushRejected | Self::Health(_) => PlanErrorCode::ControlFailed,
        }
    }
}

// ─── Controller health errors ────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("unable to reach controller manager for {unit}: {message}")]
    ServiceUnreachable { unit: String, message: String },

    #[error("controllers still unhealthy after {polls} polls: {reason}")]
    Unhealthy { polls: u32, reason: String },

    #[error("health check cancelled after {polls} polls")]
    Cancelled { polls: u32 },
}

// ─── Recovery errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("escape motion {motion} failed: {source}")]
    EscapeFailed {
        motion: EscapeMotion,
        #[source]
        source: Box<ArmflowError>,
    },
}

// ─── Persistence errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("no trajectory points available to save")]
    EmptyTrajectory,

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Motion pre-flight errors ────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("start or goal configuration failed validity checks")]
    InvalidStartOrGoal,

    #[error("joint bounds were auto-fixed; the original configuration is invalid")]
    BoundsAutoFixed,

    #[error("stopped by operator")]
    Stopped,

    #[error("recording {0} contains no configurations")]
    EmptyRecording(String),

    #[error("no valid IK solution for {group} at the requested pose")]
    NoIkSolution { group: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ArmflowError>;
