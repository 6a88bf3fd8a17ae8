//! Persistence bookkeeping for a stream of cell changes.
//!
//! Every new change at a cell closes the previous change at that cell by
//! setting its persistence to the frame gap between the two.

use std::collections::HashMap;
use std::ops::Range;

use crate::core::{GridSize, UVec3};
use super::change::BlockChange;

/// Builds the change log of one recording, frame by frame.
///
/// Memory grows with the number of changed cells, not with the grid volume.
pub struct ChangeTracker {
    /// Bounding size of every cell seen so far
    size: GridSize,
    /// Cell -> index of the last change at that cell
    last_change: HashMap<[u32; 3], usize>,
    /// All changes in recording order
    changes: Vec<BlockChange>,
    /// Range into `changes` for each frame
    frames: Vec<Range<usize>>,
    /// Number of clamped persistence faults
    faults: usize,
}

impl ChangeTracker {
    pub fn new(size: GridSize) -> Self {
        Self {
            size,
            last_change: HashMap::new(),
            changes: Vec::new(),
            frames: Vec::new(),
            faults: 0,
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Widen the bounding size to cover `size`
    pub fn grow(&mut self, size: GridSize) {
        self.size = self.size.max(size);
    }

    /// Index of the frame currently being filled
    pub fn current_frame(&self) -> Option<u32> {
        self.frames.len().checked_sub(1).map(|f| f as u32)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Start a new, empty frame
    pub fn begin_frame(&mut self) -> u32 {
        let start = self.changes.len();
        self.frames.push(start..start);
        (self.frames.len() - 1) as u32
    }

    /// Record that `cell` takes `value` in the current frame.
    ///
    /// Opens a frame if none was begun.
    pub fn push(&mut self, cell: UVec3, value: u16) {
        let frame = match self.current_frame() {
            Some(f) => f,
            None => self.begin_frame(),
        };

        if let Some(&previous) = self.last_change.get(&cell.to_array()) {
            let last = &mut self.changes[previous];
            let persistence = frame as i64 - last.start_frame as i64;
            if persistence <= 0 {
                log::warn!(
                    "Faulty persistence {} at cell ({}, {}, {}) frame {}, clamping to 1",
                    persistence, cell.x, cell.y, cell.z, frame
                );
                self.faults += 1;
                last.persistence = 1;
            } else {
                last.persistence = persistence as i32;
            }
        }

        self.last_change.insert(cell.to_array(), self.changes.len());
        self.changes.push(BlockChange::new(frame, cell, value));
        if let Some(range) = self.frames.last_mut() {
            range.end = self.changes.len();
        }
    }

    /// Changes of one frame
    pub fn frame_changes(&self, frame: usize) -> &[BlockChange] {
        self.frames
            .get(frame)
            .map(|range| &self.changes[range.clone()])
            .unwrap_or(&[])
    }

    /// All changes in recording order
    pub fn changes(&self) -> &[BlockChange] {
        &self.changes
    }

    pub fn fault_count(&self) -> usize {
        self.faults
    }

    /// Split the flat log into per-frame lists.
    /// Changes never superseded stay permanent.
    pub fn into_frames(self) -> Vec<Vec<BlockChange>> {
        let Self { changes, frames, .. } = self;
        frames
            .into_iter()
            .map(|range| changes[range].to_vec())
            .collect()
    }
}
