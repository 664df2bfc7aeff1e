pub mod collision;
pub mod configuration;
pub mod group;
pub mod outcome;
pub mod trajectory;
pub mod waypoint;

pub use collision::{AllowedCollisionMatrix, BodyKind, CollisionMode, CollisionReport, Contact};
pub use configuration::{RobotConfiguration, STATES_EQUAL_THRESHOLD, configurations_equal};
pub use group::{GRIPPER_JOINT_LIMIT, JointSpec, ManipulationGroup, RobotModel};
pub use outcome::{ExecutionOutcome, PlanErrorCode};
pub use trajectory::{ConfigurationTrajectory, TrajectoryPoint};
pub use waypoint::{CartesianTarget, WaypointSpec};
