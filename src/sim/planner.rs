//! Straight-line joint-space planner with an in-memory experience store.

use crate::core::interfaces::{
    ExperienceStore, MotionPlanRequest, MotionPlanResponse, MotionPlanner, WorldModel,
};
use crate::core::model::{
    CollisionMode, ConfigurationTrajectory, PlanErrorCode, RobotModel, configurations_equal,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Collision samples taken along each candidate line.
const LINE_SAMPLES: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRecord {
    pub group: String,
    pub start: Vec<f64>,
    pub goal: Vec<f64>,
}

#[derive(Debug, Default)]
struct ExperienceState {
    records: Vec<ExperienceRecord>,
    dirty: bool,
    flushed: usize,
}

/// Remembers solved queries; `save_if_changed` writes them as JSON.
#[derive(Debug, Default)]
pub struct InMemoryExperience {
    path: Option<PathBuf>,
    state: Mutex<ExperienceState>,
}

impl InMemoryExperience {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            state: Mutex::new(ExperienceState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ExperienceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, record: ExperienceRecord) {
        let mut state = self.lock();
        state.records.push(record);
        state.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExperienceStore for InMemoryExperience {
    fn save_if_changed(&self) -> anyhow::Result<bool> {
        let mut state = self.lock();
        if !state.dirty {
            return Ok(false);
        }
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).context("Failed to create experience directory")?;
            }
            let json = serde_json::to_vec_pretty(&state.records)
                .context("Failed to serialize experience database")?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        state.dirty = false;
        Ok(true)
    }

    /// One JSON line per record added since the previous call.
    fn write_data_log(&self, out: &mut dyn Write) -> std::io::Result<()> {
        let mut state = self.lock();
        for record in &state.records[state.flushed..] {
            let line = serde_json::to_string(record).map_err(std::io::Error::other)?;
            writeln!(out, "{line}")?;
        }
        state.flushed = state.records.len();
        Ok(())
    }

    fn summary(&self) -> String {
        format!("{} stored paths", self.len())
    }
}

pub struct StraightLinePlanner {
    model: RobotModel,
    experience: Option<InMemoryExperience>,
}

impl StraightLinePlanner {
    pub fn new(model: RobotModel) -> Self {
        Self {
            model,
            experience: None,
        }
    }

    pub fn with_experience(mut self, experience: InMemoryExperience) -> Self {
        self.experience = Some(experience);
        self
    }
}

impl MotionPlanner for StraightLinePlanner {
    fn plan(&self, scene: &dyn WorldModel, request: &MotionPlanRequest) -> MotionPlanResponse {
        let Ok(group) = self.model.group(&request.group_name) else {
            return MotionPlanResponse::failure(PlanErrorCode::InvalidGroupName);
        };
        let goal = &request.goal.configuration;
        if goal.joint_names() != request.start.joint_names() {
            return MotionPlanResponse::failure(PlanErrorCode::InvalidGoalConstraints);
        }
        if configurations_equal(&request.start, goal, group) {
            return MotionPlanResponse {
                trajectory: None,
                code: PlanErrorCode::Success,
            };
        }

        for k in 1..=LINE_SAMPLES {
            let t = k as f64 / LINE_SAMPLES as f64;
            let Ok(sample) = request.start.interpolate(goal, t) else {
                return MotionPlanResponse::failure(PlanErrorCode::InvalidGoalConstraints);
            };
            if scene
                .check_collision(&sample, group, CollisionMode::Full)
                .is_colliding()
            {
                return MotionPlanResponse::failure(PlanErrorCode::PlanningFailed);
            }
        }

        let Ok(trajectory) =
            ConfigurationTrajectory::from_configurations(group, &[request.start.clone(), goal.clone()])
        else {
            return MotionPlanResponse::failure(PlanErrorCode::InvalidGroupName);
        };
        if request.use_experience
            && let Some(store) = &self.experience
        {
            store.record(ExperienceRecord {
                group: group.name.clone(),
                start: request.start.positions().iter().copied().collect(),
                goal: goal.positions().iter().copied().collect(),
            });
        }
        MotionPlanResponse {
            trajectory: Some(trajectory),
            code: PlanErrorCode::Success,
        }
    }

    fn experience_store(&self) -> Option<&dyn ExperienceStore> {
        self.experience.as_ref().map(|e| e as &dyn ExperienceStore)
    }
}
