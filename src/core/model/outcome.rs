//! Result codes shared by planning and execution.

use serde::{Deserialize, Serialize};

/// Result code of a planning or execution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanErrorCode {
    Success,
    PlanningFailed,
    InvalidMotionPlan,
    ControlFailed,
    TimedOut,
    Preempted,
    InvalidGoalConstraints,
    InvalidGroupName,
    InvalidObjectName,
    EnvironmentChanged,
    UnknownFailure,
}

impl PlanErrorCode {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Operator-facing explanation; `trajectory_empty` distinguishes
    /// "nothing to do" from "found a plan" for the success and planning codes.
    pub fn description(self, trajectory_empty: bool) -> &'static str {
        match self {
            Self::Success if trajectory_empty => {
                "Requested path and goal constraints are already met."
            }
            Self::Success => "Solution was found and executed.",
            Self::InvalidGroupName => "Must specify group in motion plan request",
            Self::PlanningFailed | Self::InvalidMotionPlan if trajectory_empty => {
                "No motion plan found. No execution attempted."
            }
            Self::PlanningFailed | Self::InvalidMotionPlan => {
                "Motion plan was found but it seems to be invalid (possibly due to postprocessing). Not executing."
            }
            Self::EnvironmentChanged => {
                "Solution found but the environment changed during execution and the path was aborted"
            }
            Self::ControlFailed => "Solution found but controller failed during execution",
            Self::TimedOut => "Timeout reached",
            Self::Preempted => "Preempted",
            Self::InvalidGoalConstraints => "Invalid goal constraints",
            Self::InvalidObjectName => "Invalid object name",
            Self::UnknownFailure => "Unknown event",
        }
    }
}

/// Terminal result of one dispatched trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Succeeded,
    Preempted,
    TimedOut,
    ControlFailed,
}

impl ExecutionOutcome {
    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }

    pub fn error_code(self) -> PlanErrorCode {
        match self {
            Self::Succeeded => PlanErrorCode::Success,
            Self::Preempted => PlanErrorCode::Preempted,
            Self::TimedOut => PlanErrorCode::TimedOut,
            Self::ControlFailed => PlanErrorCode::ControlFailed,
        }
    }
}
