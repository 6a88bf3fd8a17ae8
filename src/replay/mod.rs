//! Timed replay of recordings.

pub mod config;
pub mod scheduler;

pub use config::{ReplayConfig, ReplayMode};
pub use scheduler::{ReplayProgress, ReplayScheduler, ReplayStatus};
