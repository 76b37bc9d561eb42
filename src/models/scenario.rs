use super::job::JobPatch;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ChangeOperation {
    Add,
    Modify,
    Delete,
}

impl ChangeOperation {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ChangeOperation::Add => "ADD",
            ChangeOperation::Modify => "MODIFY",
            ChangeOperation::Delete => "DELETE",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "ADD" => Some(ChangeOperation::Add),
            "MODIFY" => Some(ChangeOperation::Modify),
            "DELETE" => Some(ChangeOperation::Delete),
            _ => None,
        }
    }
}

/// Job id used inside a scenario for a job created by an ADD change.
/// Negative, so it never collides with a persisted job id.
pub fn synthetic_job_id(change_id: i64) -> i64 {
    -change_id
}

pub fn is_synthetic_job_id(job_id: i64) -> bool {
    job_id < 0
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScenarioChange {
    pub id: i64,
    pub scenario_id: i64,
    pub job_id: Option<i64>, // NULL for ADD
    pub operation: ChangeOperation,
    pub change_data: JobPatch,
    pub original_data: Option<JobPatch>,
    pub created_at: NaiveDateTime,
}

impl ScenarioChange {
    /// Job this change acts on inside the replay working set.
    pub fn target_job_id(&self) -> Option<i64> {
        match self.operation {
            ChangeOperation::Add => Some(synthetic_job_id(self.id)),
            _ => self.job_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Scenario {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub committed_at: Option<NaiveDateTime>,
    /// Ordered by insertion.
    pub changes: Vec<ScenarioChange>,
}
