//! Frame capture and diffing.
//!
//! Full grid snapshots go in, sparse per-cell changes with persistence come out.

pub mod frame;
pub mod change;
pub mod tracker;
pub mod differ;

pub use frame::GenerationFrame;
pub use change::{BlockChange, PERMANENT};
pub use tracker::ChangeTracker;
pub use differ::{DiffLog, FrameDiffer};
