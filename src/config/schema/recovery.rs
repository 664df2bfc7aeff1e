use crate::core::recovery::EscapeMotion;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Maps world-object name prefixes to escape motions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryRule {
    pub prefix: String,
    pub motion: EscapeMotion,
}

impl RecoveryRule {
    pub fn new(prefix: impl Into<String>, motion: EscapeMotion) -> Self {
        Self {
            prefix: prefix.into(),
            motion,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default = "default_escape_distance")]
    pub escape_distance: f64,

    /// First matching prefix wins.
    #[serde(default = "default_rules")]
    pub rules: Vec<RecoveryRule>,
}

fn default_escape_distance() -> f64 {
    0.2
}

fn default_rules() -> Vec<RecoveryRule> {
    vec![
        RecoveryRule::new("product", EscapeMotion::Retreat),
        RecoveryRule::new("front_w", EscapeMotion::Retreat),
        RecoveryRule::new("shelf", EscapeMotion::Retreat),
        RecoveryRule::new("goal_bin", EscapeMotion::Raise),
        RecoveryRule::new("right_w", EscapeMotion::StrafeLeft),
        RecoveryRule::new("left_w", EscapeMotion::StrafeRight),
    ]
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            escape_distance: default_escape_distance(),
            rules: default_rules(),
        }
    }
}

impl RecoveryConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.escape_distance > 0.0) {
            anyhow::bail!("recovery.escape_distance must be > 0.0");
        }
        for rule in &self.rules {
            if rule.prefix.is_empty() {
                anyhow::bail!("recovery.rules entries need a non-empty prefix");
            }
            if rule.motion == EscapeMotion::ReturnHome {
                anyhow::bail!(
                    "recovery.rules.{} cannot map to return_home; it is reserved for contacts without a world object",
                    rule.prefix
                );
            }
        }
        Ok(())
    }
}
