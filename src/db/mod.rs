pub mod delays;
pub mod initialize;
pub mod jobs;
pub mod log;
pub mod migrate;
pub mod pool;
pub mod progress;
pub mod rows;
pub mod scenarios;
pub mod shifts;
