pub mod calendar;
pub mod delays;
pub mod jobs;
pub mod overlay;
pub mod progress;
pub mod scenario;
pub mod schedule;
pub mod stations;
