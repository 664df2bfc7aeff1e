//! Kinematic groups and the robot model built from them.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trajectories over at most this many joints are gripper-sized: they are
/// neither persisted nor gated on operator confirmation.
pub const GRIPPER_JOINT_LIMIT: usize = 3;

/// A single joint of a group with its position limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointSpec {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl JointSpec {
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }
}

/// A kinematic chain: arm, dual-arm or end-effector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManipulationGroup {
    pub name: String,
    pub joints: Vec<JointSpec>,
    /// Link whose pose the Cartesian oracle steps.
    #[serde(default)]
    pub ik_tip_link: String,
    /// Joint-space jump threshold for Cartesian paths; 0 disables the check.
    #[serde(default)]
    pub jump_threshold: f64,
    /// Name of the end-effector group mounted on this arm.
    #[serde(default)]
    pub end_effector: Option<String>,
    /// Links that belong to this group (fingers, palm) for collision edits.
    #[serde(default)]
    pub links: Vec<String>,
    /// Joints whose values give the world x/y/z anchor of the workspace box.
    #[serde(default)]
    pub base_joints: Option<[String; 3]>,
    #[serde(default)]
    pub named_poses: BTreeMap<String, Vec<f64>>,
}

impl ManipulationGroup {
    pub fn new(name: impl Into<String>, joints: Vec<JointSpec>, ik_tip_link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            joints,
            ik_tip_link: ik_tip_link.into(),
            jump_threshold: 0.0,
            end_effector: None,
            links: Vec::new(),
            base_joints: None,
            named_poses: BTreeMap::new(),
        }
    }

    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    pub fn joint_names(&self) -> Vec<String> {
        self.joints.iter().map(|j| j.name.clone()).collect()
    }

    pub fn is_gripper_sized(&self) -> bool {
        self.dof() <= GRIPPER_JOINT_LIMIT
    }

    pub fn named_pose(&self, pose: &str) -> Result<&[f64], ModelError> {
        self.named_poses
            .get(pose)
            .map(Vec::as_slice)
            .ok_or_else(|| ModelError::UnknownNamedPose {
                group: self.name.clone(),
                pose: pose.to_string(),
            })
    }
}

/// Read-only robot description: groups plus which of them are the arms.
#[derive(Debug, Clone)]
pub struct RobotModel {
    groups: BTreeMap<String, ManipulationGroup>,
    right_arm: String,
    left_arm: Option<String>,
    both_arms: Option<String>,
    dual_arm: bool,
    home_pose: String,
    structure_parts: Vec<String>,
}

impl RobotModel {
    pub fn new(groups: Vec<ManipulationGroup>, right_arm: impl Into<String>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.name.clone(), g)).collect(),
            right_arm: right_arm.into(),
            left_arm: None,
            both_arms: None,
            dual_arm: false,
            home_pose: "home".to_string(),
            structure_parts: Vec::new(),
        }
    }

    pub fn with_dual_arm(mut self, left_arm: impl Into<String>, both_arms: impl Into<String>) -> Self {
        self.left_arm = Some(left_arm.into());
        self.both_arms = Some(both_arms.into());
        self.dual_arm = true;
        self
    }

    pub fn with_home_pose(mut self, pose: impl Into<String>) -> Self {
        self.home_pose = pose.into();
        self
    }

    pub fn with_structure_parts(mut self, parts: Vec<String>) -> Self {
        self.structure_parts = parts;
        self
    }

    pub fn group(&self, name: &str) -> Result<&ManipulationGroup, ModelError> {
        self.groups
            .get(name)
            .ok_or_else(|| ModelError::UnknownGroup(name.to_string()))
    }

    pub fn groups(&self) -> impl Iterator<Item = &ManipulationGroup> {
        self.groups.values()
    }

    pub fn is_dual_arm(&self) -> bool {
        self.dual_arm
    }

    pub fn right_arm(&self) -> Result<&ManipulationGroup, ModelError> {
        self.group(&self.right_arm)
    }

    /// Group used for whole-robot checks: both arms on dual-arm robots.
    pub fn primary_group(&self) -> Result<&ManipulationGroup, ModelError> {
        match (&self.both_arms, self.dual_arm) {
            (Some(both), true) => self.group(both),
            _ => self.right_arm(),
        }
    }

    /// Arm that performs collision escapes: the left arm on dual-arm robots.
    pub fn recovery_arm(&self) -> Result<&ManipulationGroup, ModelError> {
        match (&self.left_arm, self.dual_arm) {
            (Some(left), true) => self.group(left),
            _ => self.right_arm(),
        }
    }

    /// Arm best placed to reach a target at world y `target_y`.
    pub fn choose_arm(&self, target_y: f64) -> Result<&ManipulationGroup, ModelError> {
        match (&self.left_arm, self.dual_arm) {
            (Some(left), true) if target_y >= 0.0 => self.group(left),
            _ => self.right_arm(),
        }
    }

    pub fn end_effector_of(&self, arm: &ManipulationGroup) -> Result<&ManipulationGroup, ModelError> {
        let name = arm
            .end_effector
            .as_deref()
            .ok_or_else(|| ModelError::UnknownGroup(format!("{}/end_effector", arm.name)))?;
        self.group(name)
    }

    pub fn home_pose(&self) -> &str {
        &self.home_pose
    }

    pub fn structure_parts(&self) -> &[String] {
        &self.structure_parts
    }
}
