pub mod delay;
pub mod job;
pub mod progress;
pub mod scenario;
pub mod shift;
pub mod timeline;
