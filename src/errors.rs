//! Crate-wide error type.
//! Scheduling, scenario and station failures are reported to the caller
//! as dedicated variants; nothing is swallowed.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Parsing / validation errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // ---------------------------
    // Scheduling / scenario errors
    // ---------------------------
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid operation sequence: {0}")]
    InvalidOperationSequence(String),

    #[error("Station counter underflow for job {job_id}: no open station to release")]
    CounterUnderflow { job_id: i64 },

    #[error("Commit of scenario {scenario_id} failed and was rolled back: {reason}")]
    CommitFailure { scenario_id: i64, reason: String },

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;
