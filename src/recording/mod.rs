//! Durable change-log recordings.
//!
//! A recording is a palette, a grid size and one change list per frame.
//! On disk each frame is a string of `x y z value` integer quadruples;
//! persistence is recomputed whenever a recording is loaded.

pub mod model;
pub mod builder;
pub mod store;

pub use model::{Recording, RecordingFile, RecordingPaletteEntry};
pub use builder::RecordingBuilder;
pub use store::{recording_name, RecordingStore};
