pub mod schema;

pub use schema::{
    BoundsConfig, ConditioningConfig, Config, ExecutionConfig, HardwareUnitConfig, MotionConfig,
    ObservabilityConfig, PlanningConfig, RecordingConfig, RecoveryConfig, RecoveryRule,
    RobotConfig, SynthesisConfig,
};
