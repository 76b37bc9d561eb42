use chrono::NaiveDateTime;
use serde::Serialize;

/// Per-job execution counters (one row per job).
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct JobProgress {
    pub job_id: i64,
    /// Number of stations currently open for the job.
    pub next_station_number: u32,
    pub completed_kits_total: u64,
}

/// One completed kit, append-only.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KitExecution {
    pub id: i64,
    pub job_id: i64,
    pub station_number: u32,
    pub station_name: String,
    pub completed_at: NaiveDateTime,
}
