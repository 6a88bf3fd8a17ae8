//! Incremental recording of a live generation run.

use crate::core::Result;
use crate::frame::{BlockChange, DiffLog, FrameDiffer, GenerationFrame};
use crate::palette::{BlockCatalog, FullPalette, Rgb};
use super::model::{Recording, RecordingPaletteEntry};

/// Collects frames of one iteration and turns them into a [`Recording`].
#[derive(Default)]
pub struct RecordingBuilder {
    differ: FrameDiffer,
    /// Step count of the last recorded frame
    last_step: Option<u32>,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff and record a frame. Returns the changes it produced.
    pub fn push_frame(&mut self, frame: GenerationFrame) -> Result<&[BlockChange]> {
        let step = frame.step_count();
        let changes = self.differ.push_frame(frame)?;
        self.last_step = Some(step);
        Ok(changes)
    }

    /// Whether a frame with this step count was the last one recorded
    pub fn is_latest(&self, step_count: u32) -> bool {
        self.last_step == Some(step_count)
    }

    pub fn frame_count(&self) -> usize {
        self.differ.frame_count()
    }

    /// Close the change log and attach palette entries for every recorded
    /// symbol. `None` if nothing was recorded.
    pub fn finish<C: BlockCatalog + ?Sized>(self, palette: &FullPalette, catalog: &C) -> Option<Recording> {
        let diff = self.differ.finish()?;
        Some(build(diff, palette, catalog))
    }
}

/// Build a recording from a finished diff log.
///
/// Symbols unknown to `palette` are recorded as white cubes.
pub fn build<C: BlockCatalog + ?Sized>(diff: DiffLog, palette: &FullPalette, catalog: &C) -> Recording {
    let entries = diff
        .symbols
        .iter()
        .map(|&symbol| match palette.get(symbol) {
            Some(item) => RecordingPaletteEntry::from(item),
            None => {
                log::warn!("Symbol {:?} missing from palette, recording it as white", symbol);
                RecordingPaletteEntry {
                    symbol: Some(symbol),
                    color: Rgb::WHITE,
                    block: None,
                }
            }
        })
        .collect();

    if diff.faults > 0 {
        log::warn!("Recording closed with {} clamped persistence faults", diff.faults);
    }

    Recording::new(entries, diff.size, diff.frames, catalog)
}
