//! Voxreel - frame capture, diff recording and timed replay for step-wise
//! voxel generators

pub mod core;
pub mod palette;
pub mod frame;
pub mod recording;
pub mod visual;
pub mod generation;
pub mod replay;
