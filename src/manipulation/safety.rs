use super::Manipulation;
use crate::core::model::{CollisionMode, CollisionReport, ManipulationGroup, RobotConfiguration, WaypointSpec};
use crate::core::recovery::RecoveryDecision;
use crate::core::synthesis::SynthesisOptions;
use crate::error::{ArmflowError, RecoveryError, Result};
use crate::runtime::observability::ObserverEvent;
use std::fmt;

/// Pre-flight collision and bounds status of a start and optional goal.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityReport {
    pub start_collision: CollisionReport,
    pub start_in_bounds: bool,
    pub goal_collision: Option<CollisionReport>,
    pub goal_in_bounds: bool,
}

impl ValidityReport {
    pub fn is_valid(&self) -> bool {
        !self.start_collision.is_colliding()
            && self.start_in_bounds
            && self
                .goal_collision
                .as_ref()
                .is_none_or(|report| !report.is_colliding())
            && self.goal_in_bounds
    }
}

impl fmt::Display for ValidityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let describe = |report: &CollisionReport| {
            report
                .contacts()
                .iter()
                .map(|c| format!("{}<->{}", c.body_1, c.body_2))
                .collect::<Vec<_>>()
                .join(" ")
        };
        write!(
            f,
            "start: collision [{}] in_bounds {}",
            describe(&self.start_collision),
            self.start_in_bounds
        )?;
        if let Some(goal) = &self.goal_collision {
            write!(
                f,
                "; goal: collision [{}] in_bounds {}",
                describe(goal),
                self.goal_in_bounds
            )?;
        }
        Ok(())
    }
}

impl Manipulation {
    /// Collision and joint-bounds status of `start` and, if given, `goal`.
    pub fn check_collision_and_bounds(
        &self,
        start: &RobotConfiguration,
        goal: Option<&RobotConfiguration>,
        group: &str,
    ) -> Result<ValidityReport> {
        let group = self.model.group(group)?;
        Ok(self.validity_for(start, goal, group))
    }

    pub(crate) fn validity_for(
        &self,
        start: &RobotConfiguration,
        goal: Option<&RobotConfiguration>,
        group: &ManipulationGroup,
    ) -> ValidityReport {
        let world = self.scene.read();
        let tolerance = self.bounds_tolerance;
        ValidityReport {
            start_collision: world.check_collision(start, group, CollisionMode::Full),
            start_in_bounds: self.bounds.satisfies_bounds(start, group, tolerance),
            goal_collision: goal.map(|g| world.check_collision(g, group, CollisionMode::Full)),
            goal_in_bounds: goal.is_none_or(|g| self.bounds.satisfies_bounds(g, group, tolerance)),
        }
    }

    /// Lets `object` touch the hand of `arm` and every containing
    /// structure part, e.g. while it is being grasped.
    pub fn allow_finger_touch(&self, object: &str, arm: &str) -> Result<()> {
        let hand = self.model.end_effector_of(self.model.group(arm)?)?;
        let mut world = self.scene.write();
        let acm = world.allowed_collisions_mut();
        for link in &hand.links {
            acm.allow(object, link);
        }
        for part in self.model.structure_parts() {
            acm.allow(object, part);
        }
        tracing::debug!(object, hand = hand.name.as_str(), "allowed finger touch");
        Ok(())
    }

    /// Runs one escape motion for `report`. Autonomy is demoted first, so
    /// the escape itself waits for operator confirmation.
    pub fn fix_colliding_state(&mut self, report: &CollisionReport) -> Result<RecoveryDecision> {
        self.gate.demote("collision recovery");
        let decision = self.recovery.decide(report);
        tracing::warn!(
            object = decision.object.as_deref().unwrap_or("<none>"),
            motion = %decision.motion,
            randomized = decision.randomized,
            "recovering from collision"
        );
        self.observer.record_event(&ObserverEvent::RecoverySelected {
            object: decision.object.clone(),
            motion: decision.motion,
            randomized: decision.randomized,
        });

        let escaped = self.escape(&decision);
        match escaped {
            Ok(()) => Ok(decision),
            Err(source) => {
                self.observer.record_event(&ObserverEvent::Error {
                    component: "recovery".into(),
                    message: format!("{} escape failed: {source}", decision.motion),
                });
                Err(RecoveryError::EscapeFailed {
                    motion: decision.motion,
                    source: Box::new(source),
                }
                .into())
            }
        }
    }

    fn escape(&mut self, decision: &RecoveryDecision) -> std::result::Result<(), ArmflowError> {
        let arm = self.model.recovery_arm()?.clone();
        match decision.motion.direction() {
            Some(direction) => {
                let spec = WaypointSpec::direction(direction, decision.distance);
                let scale = self.motion.retreat_velocity_scaling_factor;
                self.run_cartesian(&arm, &spec, scale, SynthesisOptions::default().ignoring_world())?;
            }
            None => {
                let home = self.model.home_pose().to_string();
                self.move_to_named_pose(&arm.name, &home, false)?;
            }
        }
        Ok(())
    }

    /// Recovers the current configuration if it collides, then auto-fixes
    /// wherever that leaves it if it violates joint bounds. Returns `true`
    /// only when the configuration was already valid; any corrective motion
    /// reports `false`.
    pub fn fix_current_collision_and_bounds(&mut self, group: &str) -> Result<bool> {
        let group = self.group(group)?;
        let mut current = self.current_configuration();
        let report = self
            .scene
            .read()
            .check_collision(&current, &group, CollisionMode::Full);
        let collided = report.is_colliding();
        if collided {
            self.fix_colliding_state(&report)?;
            current = self.current_configuration();
        }

        if self
            .bounds
            .satisfies_bounds(&current, &group, self.bounds_tolerance)
        {
            return Ok(!collided);
        }
        match self.bounds.fix_bounds(&current, &group) {
            Some(fixed) => {
                self.gate.demote("joint bounds auto-fixed");
                tracing::warn!(group = group.name.as_str(), "configuration out of bounds, moving to clamped configuration");
                let scale = self.motion.main_velocity_scaling_factor;
                self.execute_state(&fixed, &group.name, scale)?;
            }
            None => {
                tracing::error!(group = group.name.as_str(), "configuration out of bounds and could not be fixed");
            }
        }
        Ok(false)
    }
}
