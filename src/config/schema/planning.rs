use super::motion::validate_fraction_step;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Cartesian path synthesis limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Max Cartesian increment between consecutive IK solutions.
    #[serde(default = "default_max_step")]
    pub max_step: f64,

    #[serde(default = "default_synthesis_attempts")]
    pub max_attempts: u32,

    /// Achieved/desired ratio at or below which a shortfall is reported.
    #[serde(default = "default_shortfall_ratio")]
    pub shortfall_warning_ratio: f64,

    /// Straight-line distance for generated approach paths.
    #[serde(default = "default_approach_distance")]
    pub approach_distance: f64,
}

fn default_max_step() -> f64 {
    0.01
}

fn default_synthesis_attempts() -> u32 {
    10
}

fn default_shortfall_ratio() -> f64 {
    0.5
}

fn default_approach_distance() -> f64 {
    0.1
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_step: default_max_step(),
            max_attempts: default_synthesis_attempts(),
            shortfall_warning_ratio: default_shortfall_ratio(),
            approach_distance: default_approach_distance(),
        }
    }
}

impl SynthesisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_step > 0.0) {
            anyhow::bail!("synthesis.max_step must be > 0.0");
        }
        if self.max_attempts == 0 {
            anyhow::bail!("synthesis.max_attempts must be >= 1");
        }
        if !(0.0..=1.0).contains(&self.shortfall_warning_ratio) {
            anyhow::bail!("synthesis.shortfall_warning_ratio must be in [0.0, 1.0]");
        }
        if self.approach_distance < self.max_step {
            anyhow::bail!("synthesis.approach_distance must be >= synthesis.max_step");
        }
        Ok(())
    }
}

/// Densification before time parameterization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditioningConfig {
    #[serde(default = "default_min_density")]
    pub min_density: usize,

    #[serde(default = "default_discretization")]
    pub discretization: f64,
}

fn default_min_density() -> usize {
    20
}

fn default_discretization() -> f64 {
    0.25
}

impl Default for ConditioningConfig {
    fn default() -> Self {
        Self {
            min_density: default_min_density(),
            discretization: default_discretization(),
        }
    }
}

impl ConditioningConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_density < 3 {
            anyhow::bail!("conditioning.min_density must be >= 3");
        }
        validate_fraction_step("conditioning.discretization", self.discretization)
    }
}

/// Global planner request parameters and retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    #[serde(default = "default_planner_id")]
    pub planner_id: String,

    #[serde(default)]
    pub use_experience: bool,

    #[serde(default = "default_experience_method")]
    pub experience_method: String,

    /// Full plan calls before the failure is surfaced.
    #[serde(default = "default_plan_retries")]
    pub max_plan_attempts: u32,

    /// Planner-internal attempts per call with experience enabled.
    #[serde(default = "default_experience_attempts")]
    pub experience_planning_attempts: u32,

    #[serde(default = "default_standard_attempts")]
    pub standard_planning_attempts: u32,

    #[serde(default = "default_planning_time")]
    pub allowed_planning_time_secs: f64,

    #[serde(default = "default_goal_tolerance")]
    pub goal_tolerance: f64,

    /// Append experience data logs here after each experience-guided plan.
    #[serde(default)]
    pub experience_log_path: Option<PathBuf>,
}

fn default_planner_id() -> String {
    "RRTConnectkConfigDefault".into()
}

fn default_experience_method() -> String {
    "lightning".into()
}

fn default_plan_retries() -> u32 {
    5
}

fn default_experience_attempts() -> u32 {
    1
}

fn default_standard_attempts() -> u32 {
    3
}

fn default_planning_time() -> f64 {
    30.0
}

fn default_goal_tolerance() -> f64 {
    1e-4
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            planner_id: default_planner_id(),
            use_experience: false,
            experience_method: default_experience_method(),
            max_plan_attempts: default_plan_retries(),
            experience_planning_attempts: default_experience_attempts(),
            standard_planning_attempts: default_standard_attempts(),
            allowed_planning_time_secs: default_planning_time(),
            goal_tolerance: default_goal_tolerance(),
            experience_log_path: None,
        }
    }
}

impl PlanningConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_plan_attempts == 0 {
            anyhow::bail!("planning.max_plan_attempts must be >= 1");
        }
        if self.experience_planning_attempts == 0 || self.standard_planning_attempts == 0 {
            anyhow::bail!("planning attempt budgets must be >= 1");
        }
        if !(self.allowed_planning_time_secs > 0.0) {
            anyhow::bail!("planning.allowed_planning_time_secs must be > 0.0");
        }
        if !(self.goal_tolerance > 0.0) {
            anyhow::bail!("planning.goal_tolerance must be > 0.0");
        }
        if self.planner_id.trim().is_empty() {
            anyhow::bail!("planning.planner_id must not be empty");
        }
        Ok(())
    }

    pub fn planning_attempts(&self) -> u32 {
        if self.use_experience {
            self.experience_planning_attempts
        } else {
            self.standard_planning_attempts
        }
    }
}
