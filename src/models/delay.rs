use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Extra named duration inserted into a job's step sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobDelay {
    pub id: i64,
    /// `None` = production delay; `Some` = scoped to one scenario.
    pub scenario_id: Option<i64>,
    pub job_id: i64,
    pub name: String,
    pub duration_seconds: i64,
    /// Step order the delay follows; 0 = before the first step.
    pub insert_after: i32,
    pub created_at: NaiveDateTime,
}

impl JobDelay {
    pub fn is_production(&self) -> bool {
        self.scenario_id.is_none()
    }

    /// Production delays always apply; scoped delays only inside their scenario.
    pub fn applies_to(&self, job_id: i64, scenario_id: Option<i64>) -> bool {
        self.job_id == job_id
            && match self.scenario_id {
                None => true,
                Some(sid) => scenario_id == Some(sid),
            }
    }
}
