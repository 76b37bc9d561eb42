use crate::errors::{AppError, AppResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One ordered operation of a job's route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteStep {
    #[serde(default)]
    pub id: i64,
    pub order: i32,
    pub name: String,
    pub base_duration_seconds: i64,
}

impl RouteStep {
    pub fn new(order: i32, name: &str, base_duration_seconds: i64) -> Self {
        Self {
            id: 0,
            order,
            name: name.to_string(),
            base_duration_seconds,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    pub id: i64,
    pub name: String,
    pub planned_start: NaiveDateTime,
    pub route_steps: Vec<RouteStep>,
    /// Empty means "use all active shifts".
    pub allowed_shift_ids: Vec<i64>,
    pub include_weekends: bool,
    pub station_count: i32,
    pub kit_quantity: i32,
}

impl Job {
    pub fn new(id: i64, name: &str, planned_start: NaiveDateTime) -> Self {
        Self {
            id,
            name: name.to_string(),
            planned_start,
            route_steps: Vec::new(),
            allowed_shift_ids: Vec::new(),
            include_weekends: false,
            station_count: 1,
            kit_quantity: 0,
        }
    }

    pub fn with_steps(mut self, steps: Vec<RouteStep>) -> Self {
        self.route_steps = steps;
        self
    }

    pub fn with_shifts(mut self, ids: Vec<i64>) -> Self {
        self.allowed_shift_ids = ids;
        self
    }

    pub fn with_weekends(mut self, include: bool) -> Self {
        self.include_weekends = include;
        self
    }

    pub fn total_step_seconds(&self) -> i64 {
        self.route_steps.iter().map(|s| s.base_duration_seconds).sum()
    }

    /// Preconditions checked before any timeline computation.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(format!("job {} has an empty name", self.id)));
        }
        if self.station_count < 1 {
            return Err(AppError::Validation(format!(
                "job '{}' must plan at least one station (got {})",
                self.name, self.station_count
            )));
        }

        let mut last: Option<i32> = None;
        for step in &self.route_steps {
            if step.order < 1 {
                return Err(AppError::Validation(format!(
                    "step '{}' of job '{}' has order {}; orders start at 1",
                    step.name, self.name, step.order
                )));
            }
            if last.is_some_and(|prev| step.order <= prev) {
                return Err(AppError::Validation(format!(
                    "route of job '{}' is not strictly ordered at step {}",
                    self.name, step.order
                )));
            }
            if step.base_duration_seconds < 0 {
                return Err(AppError::Validation(format!(
                    "step '{}' of job '{}' has a negative duration",
                    step.name, self.name
                )));
            }
            last = Some(step.order);
        }
        Ok(())
    }
}

/// Partial set of job fields, as stored in `scenario_changes.change_data`
/// and `original_data`. Absent fields mean "unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_start: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_steps: Option<Vec<RouteStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_shift_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_weekends: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_quantity: Option<i32>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Full snapshot of a job, used for DELETE `original_data`.
    pub fn from_job(job: &Job) -> Self {
        Self {
            name: Some(job.name.clone()),
            planned_start: Some(job.planned_start),
            route_steps: Some(job.route_steps.clone()),
            allowed_shift_ids: Some(job.allowed_shift_ids.clone()),
            include_weekends: Some(job.include_weekends),
            station_count: Some(job.station_count),
            kit_quantity: Some(job.kit_quantity),
        }
    }

    /// Values the job currently holds for exactly the fields this patch touches.
    pub fn snapshot_of(&self, job: &Job) -> Self {
        Self {
            name: self.name.as_ref().map(|_| job.name.clone()),
            planned_start: self.planned_start.map(|_| job.planned_start),
            route_steps: self.route_steps.as_ref().map(|_| job.route_steps.clone()),
            allowed_shift_ids: self
                .allowed_shift_ids
                .as_ref()
                .map(|_| job.allowed_shift_ids.clone()),
            include_weekends: self.include_weekends.map(|_| job.include_weekends),
            station_count: self.station_count.map(|_| job.station_count),
            kit_quantity: self.kit_quantity.map(|_| job.kit_quantity),
        }
    }

    /// Overwrite only the fields present in the patch.
    pub fn apply_to(&self, job: &mut Job) {
        if let Some(name) = &self.name {
            job.name = name.clone();
        }
        if let Some(start) = self.planned_start {
            job.planned_start = start;
        }
        if let Some(steps) = &self.route_steps {
            job.route_steps = steps.clone();
        }
        if let Some(ids) = &self.allowed_shift_ids {
            job.allowed_shift_ids = ids.clone();
        }
        if let Some(include) = self.include_weekends {
            job.include_weekends = include;
        }
        if let Some(count) = self.station_count {
            job.station_count = count;
        }
        if let Some(qty) = self.kit_quantity {
            job.kit_quantity = qty;
        }
    }

    /// Build a brand-new job from an ADD change. `name` and `planned_start` are required.
    pub fn to_new_job(&self, id: i64) -> AppResult<Job> {
        let name = self.name.as_deref().ok_or_else(|| {
            AppError::Validation("ADD change requires a job name".to_string())
        })?;
        let start = self.planned_start.ok_or_else(|| {
            AppError::Validation(format!("ADD change for '{}' requires planned_start", name))
        })?;

        let mut job = Job::new(id, name, start);
        self.apply_to(&mut job);
        Ok(job)
    }
}
