use crate::core::model::{JointSpec, ManipulationGroup, RobotModel};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Robot description: kinematic groups and which of them act as arms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    pub groups: Vec<ManipulationGroup>,

    #[serde(default = "default_right_arm")]
    pub right_arm: String,

    #[serde(default)]
    pub left_arm: Option<String>,

    /// Combined group spanning both arms, used for whole-robot checks.
    #[serde(default)]
    pub both_arms: Option<String>,

    #[serde(default)]
    pub dual_arm: bool,

    /// Named pose on the recovery arm used as the return-to-home target.
    #[serde(default = "default_home_pose")]
    pub home_pose: String,

    /// Shelf/bin parts a grasped object may touch.
    #[serde(default)]
    pub structure_parts: Vec<String>,
}

fn default_right_arm() -> String {
    "right_arm".into()
}

fn default_home_pose() -> String {
    "home".into()
}

impl Default for RobotConfig {
    /// Gantry arm with a two-finger hand, matching the bundled simulator.
    fn default() -> Self {
        let arm = ManipulationGroup {
            jump_threshold: 0.0,
            end_effector: Some("right_hand".into()),
            links: vec!["wrist_link".into(), "ee_link".into()],
            base_joints: Some(["gantry_x".into(), "gantry_y".into(), "gantry_z".into()]),
            named_poses: BTreeMap::from([
                ("home".into(), vec![0.0, 0.0, 1.2, 0.0, 0.0]),
                ("ready".into(), vec![0.3, 0.0, 1.0, 0.0, 0.0]),
            ]),
            ..ManipulationGroup::new(
                "right_arm",
                vec![
                    JointSpec::new("gantry_x", -1.5, 1.5),
                    JointSpec::new("gantry_y", -1.5, 1.5),
                    JointSpec::new("gantry_z", 0.0, 2.0),
                    JointSpec::new("wrist_pitch", -3.0, 3.0),
                    JointSpec::new("wrist_roll", -3.0, 3.0),
                ],
                "ee_link",
            )
        };
        let hand = ManipulationGroup {
            links: vec![
                "palm_link".into(),
                "finger_1_link".into(),
                "finger_2_link".into(),
            ],
            named_poses: BTreeMap::from([
                ("open".into(), vec![0.04, 0.04]),
                ("closed".into(), vec![0.0, 0.0]),
            ]),
            ..ManipulationGroup::new(
                "right_hand",
                vec![
                    JointSpec::new("finger_1", 0.0, 0.04),
                    JointSpec::new("finger_2", 0.0, 0.04),
                ],
                "palm_link",
            )
        };
        Self {
            groups: vec![arm, hand],
            right_arm: default_right_arm(),
            left_arm: None,
            both_arms: None,
            dual_arm: false,
            home_pose: default_home_pose(),
            structure_parts: vec!["shelf_bottom".into(), "shelf_top".into(), "goal_bin".into()],
        }
    }
}

impl RobotConfig {
    pub fn to_model(&self) -> RobotModel {
        let mut model = RobotModel::new(self.groups.clone(), self.right_arm.clone())
            .with_home_pose(self.home_pose.clone())
            .with_structure_parts(self.structure_parts.clone());
        if self.dual_arm
            && let (Some(left), Some(both)) = (&self.left_arm, &self.both_arms)
        {
            model = model.with_dual_arm(left.clone(), both.clone());
        }
        model
    }

    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            anyhow::bail!("robot.groups must declare at least one group");
        }
        let mut names = HashSet::new();
        for group in &self.groups {
            if !names.insert(group.name.as_str()) {
                anyhow::bail!("robot.groups has duplicate group {}", group.name);
            }
            if group.joints.is_empty() {
                anyhow::bail!("robot.groups.{} has no joints", group.name);
            }
            for joint in &group.joints {
                if joint.min.is_nan() || joint.max.is_nan() || joint.min > joint.max {
                    anyhow::bail!(
                        "robot.groups.{}.{} must have min <= max",
                        group.name,
                        joint.name
                    );
                }
            }
            for (pose, values) in &group.named_poses {
                if values.len() != group.dof() {
                    anyhow::bail!(
                        "robot.groups.{}.named_poses.{pose} has {} values, expected {}",
                        group.name,
                        values.len(),
                        group.dof()
                    );
                }
            }
        }

        let known = |name: &str| names.contains(name);
        if !known(self.right_arm.as_str()) {
            anyhow::bail!("robot.right_arm references unknown group {}", self.right_arm);
        }
        for (label, group) in [("left_arm", &self.left_arm), ("both_arms", &self.both_arms)] {
            if let Some(name) = group
                && !known(name.as_str())
            {
                anyhow::bail!("robot.{label} references unknown group {name}");
            }
        }
        if self.dual_arm && (self.left_arm.is_none() || self.both_arms.is_none()) {
            anyhow::bail!("robot.dual_arm requires left_arm and both_arms");
        }
        for group in &self.groups {
            if let Some(ee) = &group.end_effector
                && !known(ee.as_str())
            {
                anyhow::bail!("robot.groups.{}.end_effector references unknown group {ee}", group.name);
            }
        }
        Ok(())
    }
}
