//! Contract of the external generation process.

use crate::core::{GridSize, Result};
use crate::frame::GenerationFrame;

/// One snapshot as produced by a generator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorStep {
    /// Legend indices, flat `x + y*SX + z*SX*SY`
    pub values: Vec<u8>,
    /// Symbol per value index; index 0 is the empty symbol
    pub legend: Vec<char>,
    pub size: GridSize,
    pub step_count: u32,
}

impl GeneratorStep {
    pub fn to_frame(&self) -> Result<GenerationFrame> {
        GenerationFrame::from_indexed(&self.values, &self.legend, self.size, self.step_count)
    }
}

/// Lazy, finite, non-restartable sequence of snapshots
pub type StepIter = Box<dyn Iterator<Item = GeneratorStep> + Send>;

/// A procedural model that can be run once per seed.
pub trait GenerationModel: Send + Sync {
    /// Identifier used to name recordings
    fn name(&self) -> &str;

    /// Start a fresh run. With `animated` unset only the final state is yielded.
    fn run(&self, seed: i32, steps: u32, animated: bool) -> StepIter;
}
