//! Shared world model access and joint-bounds checking.

use super::interfaces::{BoundsChecker, WorldModel};
use super::model::{ManipulationGroup, RobotConfiguration};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lock around the planning scene.
///
/// Queries take a scoped read guard; collision-matrix edits take a scoped
/// write guard. Both are released on every exit path when the guard drops.
pub struct SceneMonitor<W: WorldModel + ?Sized = dyn WorldModel> {
    world: RwLock<W>,
}

impl<W: WorldModel> SceneMonitor<W> {
    pub fn new(world: W) -> Self {
        Self {
            world: RwLock::new(world),
        }
    }
}

impl<W: WorldModel + ?Sized> SceneMonitor<W> {
    pub fn read(&self) -> RwLockReadGuard<'_, W> {
        self.world.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, W> {
        self.world.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh pull of the latest robot configuration.
    pub fn current_configuration(&self) -> RobotConfiguration {
        self.read().current_configuration()
    }
}

/// Bounds checker driven by the group's declared joint limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct JointBoundsChecker;

impl JointBoundsChecker {
    pub fn new() -> Self {
        Self
    }
}

impl BoundsChecker for JointBoundsChecker {
    fn satisfies_bounds(
        &self,
        configuration: &RobotConfiguration,
        group: &ManipulationGroup,
        tolerance: f64,
    ) -> bool {
        group.joints.iter().all(|joint| {
            configuration
                .position(&joint.name)
                .is_some_and(|value| value >= joint.min - tolerance && value <= joint.max + tolerance)
        })
    }

    fn fix_bounds(
        &self,
        configuration: &RobotConfiguration,
        group: &ManipulationGroup,
    ) -> Option<RobotConfiguration> {
        let mut fixed = configuration.clone();
        let mut changed = false;
        for joint in &group.joints {
            let Some(value) = fixed.position(&joint.name) else {
                continue;
            };
            let clamped = value.clamp(joint.min, joint.max);
            if (clamped - value).abs() > f64::EPSILON {
                fixed = fixed.with_position(&joint.name, clamped).ok()?;
                changed = true;
            }
        }
        changed.then_some(fixed)
    }
}
