pub mod gate;
pub mod health;
pub mod operator;
pub mod persist;

pub use gate::ExecutionGate;
pub use health::{ControllerHealthMonitor, HealthReport, UnitHealth};
pub use operator::{OperatorChannel, RemoteControl};
