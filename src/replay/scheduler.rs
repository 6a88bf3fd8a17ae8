//! Walks a recording frame by frame at a fixed tick.
//!
//! A scheduler is single use: once it finishes or is stopped, replaying again
//! takes a new scheduler. Recordings are shared read-only, so any number of
//! schedulers may replay the same one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::{IVec3, Result};
use crate::frame::BlockChange;
use crate::generation::CancelToken;
use crate::palette::{MeshPaletteEntry, Rgb};
use crate::recording::Recording;
use crate::visual::{world_offset, BlockInstance, Lifetime, VisualBatch, VisualizationSink};
use super::config::ReplayConfig;

/// Value index of the default symbol
const EMPTY_VALUE: u16 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayProgress {
    /// Frames dispatched so far
    pub frame: usize,
    pub frame_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayStatus {
    Running(ReplayProgress),
    Finished,
}

pub struct ReplayScheduler {
    recording: Arc<Recording>,
    tick: Duration,
    two_d: bool,
    origin: IVec3,
    next_frame: usize,
    next_dispatch: Option<Instant>,
    cancel: CancelToken,
    finished: bool,
}

impl ReplayScheduler {
    /// 2-D mode follows the grid shape: single-layer grids are 2-D
    pub fn new(recording: Arc<Recording>, tick: Duration) -> Self {
        Self {
            two_d: recording.is_flat(),
            recording,
            tick,
            origin: IVec3::ZERO,
            next_frame: 0,
            next_dispatch: None,
            cancel: CancelToken::new(),
            finished: false,
        }
    }

    pub fn from_config(recording: Arc<Recording>, config: &ReplayConfig) -> Result<Self> {
        config.validate()?;
        let two_d = config.mode.is_two_d(recording.size());
        Ok(Self::new(recording, config.tick()).with_two_d(two_d))
    }

    pub fn with_two_d(mut self, two_d: bool) -> Self {
        self.two_d = two_d;
        self
    }

    pub fn with_origin(mut self, origin: IVec3) -> Self {
        self.origin = origin;
        self
    }

    pub fn recording(&self) -> &Arc<Recording> {
        &self.recording
    }

    pub fn is_two_d(&self) -> bool {
        self.two_d
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Change the pacing; applies from the next frame on
    pub fn set_playback_speed(&mut self, speed: f32) {
        if !(speed.is_finite() && speed > 0.0) {
            log::warn!("Ignoring invalid playback speed {}", speed);
            return;
        }
        self.tick = Duration::from_secs_f32(1.0 / speed);
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Stop before the next frame. Already dispatched frames stay.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Changes of a frame that replay shows.
    ///
    /// In 3-D mode placements of the default symbol are skipped.
    pub fn visible_changes(&self, frame: usize) -> impl Iterator<Item = &BlockChange> {
        let two_d = self.two_d;
        self.recording
            .frame(frame)
            .unwrap_or_default()
            .iter()
            .filter(move |change| two_d || change.value != EMPTY_VALUE)
    }

    /// Batch for one frame with lifetimes at the current tick
    pub fn frame_batch(&self, frame: usize) -> VisualBatch {
        let tick = self.tick.as_secs_f32();
        let mut unknown = 0usize;

        let instances = self
            .visible_changes(frame)
            .map(|change| {
                let mesh = self.recording.mesh(change.value).unwrap_or_else(|| {
                    unknown += 1;
                    MeshPaletteEntry::cube(Rgb::WHITE)
                });
                BlockInstance {
                    position: self.origin + world_offset(change.cell),
                    mesh,
                    lifetime: Lifetime::from_persistence(change.persistence, tick),
                }
            })
            .collect();

        if unknown > 0 {
            log::warn!("Frame {}: {} changes reference values outside the palette", frame, unknown);
        }
        VisualBatch { iteration: None, frame, instances }
    }

    /// Dispatch the next frame if its time has come. Never blocks.
    pub fn poll<S: VisualizationSink + ?Sized>(&mut self, now: Instant, sink: &mut S) -> ReplayStatus {
        if self.finished {
            return ReplayStatus::Finished;
        }
        if self.cancel.is_cancelled() {
            log::info!("Replay stopped at frame {}", self.next_frame);
            self.finished = true;
            return ReplayStatus::Finished;
        }
        if self.next_dispatch.is_some_and(|at| now < at) {
            return ReplayStatus::Running(self.progress());
        }
        if self.next_frame >= self.recording.frame_count() {
            log::info!("Replay finished: {} frames", self.next_frame);
            self.finished = true;
            return ReplayStatus::Finished;
        }

        let batch = self.frame_batch(self.next_frame);
        log::debug!("Replay frame {}: {} instances", self.next_frame, batch.len());
        sink.visualize(batch);
        self.next_frame += 1;
        self.next_dispatch = Some(now + self.tick);
        ReplayStatus::Running(self.progress())
    }

    /// Poll against the wall clock until the replay ends
    pub fn run_to_end<S: VisualizationSink + ?Sized>(&mut self, sink: &mut S) {
        while let ReplayStatus::Running(_) = self.poll(Instant::now(), sink) {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    pub fn progress(&self) -> ReplayProgress {
        ReplayProgress {
            frame: self.next_frame,
            frame_count: self.recording.frame_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GridSize, UVec3};
    use crate::frame::{FrameDiffer, GenerationFrame};
    use crate::palette::BlockStateCatalog;
    use crate::recording::RecordingPaletteEntry;
    use crate::replay::ReplayMode;
    use crate::visual::CollectingSink;

    fn entry(symbol: char, color: Rgb) -> RecordingPaletteEntry {
        RecordingPaletteEntry { symbol: Some(symbol), color, block: None }
    }

    fn recording(size: GridSize, frames: Vec<Vec<BlockChange>>) -> Arc<Recording> {
        let palette = vec![entry('.', Rgb::BLACK), entry('A', Rgb::new(255, 0, 0))];
        Arc::new(Recording::new(palette, size, frames, &BlockStateCatalog))
    }

    fn change(frame: u32, x: u32, value: u16, persistence: i32) -> BlockChange {
        BlockChange { persistence, ..BlockChange::new(frame, UVec3::new(x, 0, 0), value) }
    }

    #[test]
    fn test_lifetime_is_persistence_times_tick() {
        let rec = recording(GridSize::new(1, 1, 1), vec![vec![change(0, 0, 1, 3)]]);
        let mut scheduler = ReplayScheduler::new(rec, Duration::from_millis(500));
        let mut sink = CollectingSink::new();

        scheduler.poll(Instant::now(), &mut sink);
        assert_eq!(sink.batches.len(), 1);
        assert_eq!(sink.batches[0].instances[0].lifetime, Lifetime::Timed(1.5));
        assert_eq!(sink.batches[0].instances[0].mesh.color, Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_three_d_skips_default_symbol() {
        let frames = vec![vec![change(0, 0, 0, -1), change(0, 1, 1, -1)]];
        let rec = recording(GridSize::new(2, 1, 2), frames);

        let three_d = ReplayScheduler::new(Arc::clone(&rec), Duration::from_secs(1));
        assert!(!three_d.is_two_d());
        let batch = three_d.frame_batch(0);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.instances[0].position, IVec3::new(1, 0, 0));
        assert!(batch.instances[0].lifetime.is_persistent());

        let two_d = ReplayScheduler::new(rec, Duration::from_secs(1)).with_two_d(true);
        assert_eq!(two_d.frame_batch(0).len(), 2);
    }

    #[test]
    fn test_mode_from_config() {
        let rec = recording(GridSize::new(2, 1, 1), vec![Vec::new()]);
        let config = ReplayConfig { playback_speed: 4.0, mode: ReplayMode::ThreeD };
        let scheduler = ReplayScheduler::from_config(rec, &config).unwrap();
        assert!(!scheduler.is_two_d());
        assert_eq!(scheduler.tick(), Duration::from_millis(250));
    }

    #[test]
    fn test_pacing_and_end() {
        let frames = vec![vec![change(0, 0, 1, 1)], vec![change(1, 0, 0, -1)], Vec::new()];
        let rec = recording(GridSize::new(1, 1, 1), frames);
        let tick = Duration::from_secs(1);
        let mut scheduler = ReplayScheduler::new(rec, tick);
        let mut sink = CollectingSink::new();
        let t0 = Instant::now();

        assert!(matches!(scheduler.poll(t0, &mut sink), ReplayStatus::Running(_)));
        assert!(matches!(scheduler.poll(t0, &mut sink), ReplayStatus::Running(_)));
        assert_eq!(sink.batches.len(), 1);

        scheduler.poll(t0 + tick, &mut sink);
        scheduler.poll(t0 + tick * 2, &mut sink);
        assert_eq!(sink.batches.len(), 3);
        assert_eq!(sink.batches[2].frame, 2);
        assert!(sink.batches[2].is_empty());

        assert_eq!(scheduler.poll(t0 + tick * 3, &mut sink), ReplayStatus::Finished);
        assert!(scheduler.is_finished());
        assert_eq!(scheduler.poll(t0 + tick * 4, &mut sink), ReplayStatus::Finished);
        assert_eq!(sink.batches.len(), 3);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let rec = recording(GridSize::new(1, 1, 1), vec![vec![change(0, 0, 1, -1)], Vec::new()]);
        let mut scheduler = ReplayScheduler::new(rec, Duration::from_secs(1));
        let mut sink = CollectingSink::new();
        let t0 = Instant::now();

        scheduler.poll(t0, &mut sink);
        scheduler.stop();
        scheduler.stop();
        assert_eq!(scheduler.poll(t0 + Duration::from_secs(5), &mut sink), ReplayStatus::Finished);
        assert_eq!(sink.batches.len(), 1);
    }

    #[test]
    fn test_diff_then_replay_reconstructs_frames() {
        let size = GridSize::new(3, 2, 1);
        let snapshots = ["......", "AB....", "AB.C..", ".BBC..", ".BBC..", "CCCCCC"];

        let mut differ = FrameDiffer::new();
        for (step, text) in snapshots.iter().enumerate() {
            let frame = GenerationFrame::new(text.chars().collect(), size, step as u32, '.').unwrap();
            differ.push_frame(frame).unwrap();
        }
        let log = differ.finish().unwrap();
        let palette = log.symbols.iter().map(|&s| entry(s, Rgb::WHITE)).collect();
        let rec = Arc::new(Recording::new(palette, size, log.frames, &BlockStateCatalog));

        let scheduler = ReplayScheduler::new(Arc::clone(&rec), Duration::from_secs(1));
        assert!(scheduler.is_two_d());

        let mut grid = vec!['.'; size.volume()];
        for (index, text) in snapshots.iter().enumerate() {
            for change in scheduler.visible_changes(index) {
                let symbol = rec.palette()[change.value as usize].symbol.unwrap();
                grid[size.index(change.cell)] = symbol;
            }
            let expected: Vec<char> = text.chars().collect();
            assert_eq!(grid, expected, "frame {}", index);
        }
    }
}
