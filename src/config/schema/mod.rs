mod core;
mod execution;
mod motion;
mod observability;
mod planning;
mod recovery;
mod robot;

pub use core::Config;
pub use execution::{ExecutionConfig, HardwareUnitConfig};
pub use motion::{BoundsConfig, MotionConfig, RecordingConfig};
pub use observability::ObservabilityConfig;
pub use planning::{ConditioningConfig, PlanningConfig, SynthesisConfig};
pub use recovery::{RecoveryConfig, RecoveryRule};
pub use robot::RobotConfig;
