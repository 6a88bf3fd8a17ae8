//! Full-grid frame differencing.
//!
//! The generator only hands out full snapshots, so each frame is compared
//! cell by cell against the previous one. The first frame is compared against
//! an all-empty grid. When the grid is resized, cells outside the previous
//! frame count as empty, and cells the new frame no longer covers are cleared.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::core::{Error, GridSize, Result, UVec3};
use super::change::BlockChange;
use super::frame::GenerationFrame;
use super::tracker::ChangeTracker;

/// Grids at least this large are compared in parallel
const PARALLEL_THRESHOLD: usize = 1 << 15;

/// Indices of cells whose symbol differs from `previous`
/// (or from `empty` when there is no previous frame), in ascending order.
pub fn changed_cells(previous: Option<&[char]>, current: &[char], empty: char) -> Vec<usize> {
    let differs = |i: usize| match previous {
        Some(prev) => prev[i] != current[i],
        None => current[i] != empty,
    };

    if current.len() >= PARALLEL_THRESHOLD {
        (0..current.len()).into_par_iter().filter(|&i| differs(i)).collect()
    } else {
        (0..current.len()).filter(|&i| differs(i)).collect()
    }
}

/// Cell changes between two frames of different sizes.
///
/// Cells of `current` are compared by position, then cells only `previous`
/// covers are reset to the empty symbol.
fn resized_changes(previous: &GenerationFrame, current: &GenerationFrame) -> Vec<(UVec3, char)> {
    let empty = current.empty_symbol();
    let size = current.size();

    let mut out: Vec<(UVec3, char)> = current
        .values()
        .iter()
        .enumerate()
        .filter_map(|(i, &symbol)| {
            let cell = size.cell(i);
            let before = previous.symbol_at(cell).unwrap_or(empty);
            (before != symbol).then_some((cell, symbol))
        })
        .collect();

    let old = previous.size();
    out.extend(
        previous
            .values()
            .iter()
            .enumerate()
            .filter(|&(_, &symbol)| symbol != empty)
            .map(|(i, _)| old.cell(i))
            .filter(|&cell| !size.contains(cell))
            .map(|cell| (cell, empty)),
    );
    out
}

/// Finished change log of one generation run
#[derive(Clone, Debug, Default)]
pub struct DiffLog {
    pub size: GridSize,
    /// Value index -> symbol; index 0 is the empty symbol
    pub symbols: Vec<char>,
    pub frames: Vec<Vec<BlockChange>>,
    /// Persistence faults clamped while recording
    pub faults: usize,
}

impl DiffLog {
    pub fn change_count(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }
}

/// Turns successive snapshots into per-frame change lists.
///
/// One differ serves exactly one generation run.
#[derive(Default)]
pub struct FrameDiffer {
    previous: Option<GenerationFrame>,
    tracker: Option<ChangeTracker>,
    symbols: Vec<char>,
    symbol_index: HashMap<char, u16>,
}

impl FrameDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, symbol: char) -> Result<u16> {
        if let Some(&index) = self.symbol_index.get(&symbol) {
            return Ok(index);
        }
        let index = u16::try_from(self.symbols.len())
            .map_err(|_| Error::Frame("Too many distinct symbols".into()))?;
        self.symbols.push(symbol);
        self.symbol_index.insert(symbol, index);
        Ok(index)
    }

    /// Diff `frame` against the previous one and record the result.
    ///
    /// Frames may change size; the log's size is the largest seen.
    pub fn push_frame(&mut self, frame: GenerationFrame) -> Result<&[BlockChange]> {
        let size = frame.size();
        if self.tracker.is_none() {
            self.intern(frame.empty_symbol())?;
        }

        let changes: Vec<(UVec3, char)> = match &self.previous {
            Some(previous) if previous.size() != size => {
                log::debug!("Frame size changed from {} to {}", previous.size(), size);
                resized_changes(previous, &frame)
            }
            previous => changed_cells(
                previous.as_ref().map(GenerationFrame::values),
                frame.values(),
                frame.empty_symbol(),
            )
            .into_iter()
            .map(|i| (size.cell(i), frame.values()[i]))
            .collect(),
        };

        let values = changes
            .iter()
            .map(|&(_, symbol)| self.intern(symbol))
            .collect::<Result<Vec<u16>>>()?;

        let tracker = self.tracker.get_or_insert_with(|| ChangeTracker::new(size));
        tracker.grow(size);
        let index = tracker.begin_frame() as usize;
        for (&(cell, _), value) in changes.iter().zip(values) {
            tracker.push(cell, value);
        }

        log::debug!(
            "Frame {} (step {}): {} changed cells",
            index,
            frame.step_count(),
            changes.len()
        );

        self.previous = Some(frame);
        Ok(tracker.frame_changes(index))
    }

    pub fn frame_count(&self) -> usize {
        self.tracker.as_ref().map_or(0, ChangeTracker::frame_count)
    }

    /// Close the log. `None` if no frame was ever pushed.
    pub fn finish(self) -> Option<DiffLog> {
        let tracker = self.tracker?;
        let size = tracker.size();
        let faults = tracker.fault_count();
        Some(DiffLog {
            size,
            symbols: self.symbols,
            frames: tracker.into_frames(),
            faults,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UVec3;

    fn frame(values: &str, size: GridSize, step: u32) -> GenerationFrame {
        GenerationFrame::new(values.chars().collect(), size, step, 'A').unwrap()
    }

    #[test]
    fn test_two_cell_scenario() {
        let size = GridSize::new(2, 1, 1);
        let mut differ = FrameDiffer::new();

        assert!(differ.push_frame(frame("AA", size, 0)).unwrap().is_empty());
        let changes = differ.push_frame(frame("BA", size, 1)).unwrap().to_vec();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].cell, UVec3::new(0, 0, 0));
        assert_eq!(changes[0].start_frame, 1);
        differ.push_frame(frame("BB", size, 2)).unwrap();

        let log = differ.finish().unwrap();
        assert_eq!(log.symbols, vec!['A', 'B']);
        assert_eq!(log.frames.len(), 3);
        assert!(log.frames[0].is_empty());

        let cell0 = log.frames[1][0];
        assert_eq!((cell0.value, cell0.start_frame), (1, 1));
        assert!(cell0.is_permanent());

        assert_eq!(log.frames[2].len(), 1);
        let cell1 = log.frames[2][0];
        assert_eq!(cell1.cell, UVec3::new(1, 0, 0));
        assert_eq!((cell1.value, cell1.start_frame), (1, 2));
        assert!(cell1.is_permanent());
    }

    #[test]
    fn test_first_frame_is_all_new() {
        let size = GridSize::new(3, 1, 1);
        let mut differ = FrameDiffer::new();
        let changes = differ.push_frame(frame("BAC", size, 0)).unwrap();
        let cells: Vec<u32> = changes.iter().map(|c| c.cell.x).collect();
        assert_eq!(cells, vec![0, 2]);
    }

    #[test]
    fn test_persistence_equals_gap() {
        let size = GridSize::new(1, 1, 1);
        let mut differ = FrameDiffer::new();
        for (step, values) in ["B", "B", "C", "C", "C", "B"].iter().enumerate() {
            differ.push_frame(frame(values, size, step as u32)).unwrap();
        }
        let log = differ.finish().unwrap();
        let all: Vec<BlockChange> = log.frames.into_iter().flatten().collect();

        assert_eq!(all.len(), 3);
        assert_eq!(all[0].persistence, 2);
        assert_eq!(all[1].persistence, 3);
        assert!(all[2].is_permanent());
        assert_eq!(log.faults, 0);
    }

    #[test]
    fn test_resize_grows_log_and_clears_vacated_cells() {
        let mut differ = FrameDiffer::new();
        differ.push_frame(frame("AB", GridSize::new(2, 1, 1), 0)).unwrap();

        let grown = differ.push_frame(frame("ABBB", GridSize::new(2, 2, 1), 1)).unwrap().to_vec();
        let cells: Vec<UVec3> = grown.iter().map(|c| c.cell).collect();
        assert_eq!(cells, vec![UVec3::new(0, 1, 0), UVec3::new(1, 1, 0)]);

        let shrunk = differ.push_frame(frame("A", GridSize::new(1, 1, 1), 2)).unwrap().to_vec();
        assert_eq!(shrunk.len(), 3);
        assert!(shrunk.iter().all(|c| c.value == 0));

        let log = differ.finish().unwrap();
        assert_eq!(log.size, GridSize::new(2, 2, 1));
        assert_eq!(log.frames.len(), 3);
        assert_eq!(log.frames[0][0].persistence, 2);
    }

    #[test]
    fn test_empty_differ_finishes_to_none() {
        assert!(FrameDiffer::new().finish().is_none());
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let len = PARALLEL_THRESHOLD + 17;
        let previous: Vec<char> = (0..len).map(|i| if i % 3 == 0 { 'x' } else { 'y' }).collect();
        let current: Vec<char> = (0..len).map(|i| if i % 5 == 0 { 'x' } else { 'y' }).collect();

        let parallel = changed_cells(Some(&previous), &current, 'y');
        let sequential: Vec<usize> = (0..len).filter(|&i| previous[i] != current[i]).collect();
        assert_eq!(parallel, sequential);
    }
}
