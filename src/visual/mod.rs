//! Visualization sink boundary.
//!
//! The crate never renders; it hands batches of positioned, colored,
//! time-limited block instances to a [`VisualizationSink`].

pub mod instance;
pub mod sink;

pub use instance::{frame_instances, world_offset, BlockInstance, Lifetime, VisualBatch};
pub use sink::{CollectingSink, LogSink, VisualizationSink};
