//! Gantry world: the tip sits at the three base-translation joints and
//! collides with axis-aligned boxes.

use crate::core::interfaces::WorldModel;
use crate::core::model::{
    AllowedCollisionMatrix, BodyKind, CollisionMode, CollisionReport, Contact, ManipulationGroup,
    RobotConfiguration,
};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared handle on the simulated joint state.
#[derive(Debug, Clone)]
pub struct SimRobot {
    state: Arc<Mutex<RobotConfiguration>>,
}

impl SimRobot {
    pub fn new(initial: RobotConfiguration) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RobotConfiguration> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn configuration(&self) -> RobotConfiguration {
        self.lock().clone()
    }

    pub fn set_configuration(&self, configuration: RobotConfiguration) {
        *self.lock() = configuration;
    }

    /// Moves the named joints, ignoring names the robot does not have.
    pub fn set_joints(&self, names: &[String], values: &[f64]) {
        let mut state = self.lock();
        let mut next = state.clone();
        for (name, value) in names.iter().zip(values) {
            if let Ok(moved) = next.with_position(name, *value) {
                next = moved;
            }
        }
        *state = next;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxObstacle {
    pub name: String,
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoxObstacle {
    pub fn new(name: impl Into<String>, center: Point3<f64>, half_extents: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

pub struct GantryWorld {
    robot: SimRobot,
    tip_joints: [String; 3],
    /// Links carried at the tip, checked in order against each obstacle.
    tip_links: Vec<String>,
    obstacles: Vec<BoxObstacle>,
    acm: AllowedCollisionMatrix,
}

impl GantryWorld {
    pub fn new(robot: SimRobot, tip_joints: [String; 3], tip_links: Vec<String>) -> Self {
        Self {
            robot,
            tip_joints,
            tip_links,
            obstacles: Vec::new(),
            acm: AllowedCollisionMatrix::default(),
        }
    }

    pub fn with_obstacles(mut self, obstacles: Vec<BoxObstacle>) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn tip_position(&self, configuration: &RobotConfiguration) -> Option<Point3<f64>> {
        tip_position(&self.tip_joints, configuration)
    }
}

pub(crate) fn tip_position(
    tip_joints: &[String; 3],
    configuration: &RobotConfiguration,
) -> Option<Point3<f64>> {
    Some(Point3::new(
        configuration.position(&tip_joints[0])?,
        configuration.position(&tip_joints[1])?,
        configuration.position(&tip_joints[2])?,
    ))
}

impl WorldModel for GantryWorld {
    fn current_configuration(&self) -> RobotConfiguration {
        self.robot.configuration()
    }

    fn check_collision(
        &self,
        configuration: &RobotConfiguration,
        _group: &ManipulationGroup,
        mode: CollisionMode,
    ) -> CollisionReport {
        // The gantry cannot reach itself.
        if mode == CollisionMode::SelfOnly {
            return CollisionReport::clear();
        }
        let Some(tip) = self.tip_position(configuration) else {
            return CollisionReport::clear();
        };
        let contacts = self
            .obstacles
            .iter()
            .filter(|obstacle| obstacle.contains(&tip))
            .filter_map(|obstacle| {
                self.tip_links
                    .iter()
                    .find(|link| !self.acm.is_allowed(link, &obstacle.name))
                    .map(|link| {
                        Contact::new(
                            link.as_str(),
                            BodyKind::RobotLink,
                            obstacle.name.as_str(),
                            BodyKind::WorldObject,
                        )
                    })
            })
            .collect();
        CollisionReport::new(contacts)
    }

    fn allowed_collisions(&self) -> &AllowedCollisionMatrix {
        &self.acm
    }

    fn allowed_collisions_mut(&mut self) -> &mut AllowedCollisionMatrix {
        &mut self.acm
    }
}
