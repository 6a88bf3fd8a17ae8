//! Cooperative driver of generation runs.
//!
//! The host calls [`Orchestrator::poll`] once per tick of its own loop. Each
//! poll does a bounded amount of work: generator batches run on the worker,
//! diffing and visualization of the latest snapshot run inline.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::core::{GridSize, Result};
use crate::frame::GenerationFrame;
use crate::palette::{BlockCatalog, BlockStateCatalog, FullPalette, ResolvedPalette};
use crate::recording::{recording_name, Recording, RecordingBuilder, RecordingStore};
use crate::visual::{frame_instances, Lifetime, VisualBatch, VisualizationSink};
use super::config::ModelConfig;
use super::layout::GridLayout;
use super::model::{GenerationModel, StepIter};
use super::worker::{BatchOutcome, StepWorker};

/// Shared stop flag. Stopping is idempotent.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Lifecycle of the most recent iteration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterationState {
    Idle,
    Stepping,
    Completed,
    Cancelled,
    /// The generator panicked
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// 1-based number of the running iteration
    pub iteration: u32,
    pub amount: u32,
    /// Step count of the latest snapshot
    pub step_count: u32,
    /// Frames visualized in this iteration
    pub frames: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Running(Progress),
    Finished,
}

/// Outcome of a completed iteration
#[derive(Clone, Debug)]
pub struct IterationResult {
    pub iteration: u32,
    pub seed: i32,
    /// `None` when the generator produced nothing
    pub final_frame: Option<GenerationFrame>,
    pub recording: Option<Arc<Recording>>,
}

impl IterationResult {
    pub fn step_count(&self) -> u32 {
        self.final_frame.as_ref().map_or(0, GenerationFrame::step_count)
    }

    pub fn size(&self) -> Option<GridSize> {
        self.final_frame.as_ref().map(GenerationFrame::size)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GenerationEvent {
    IterationStarted { iteration: u32, seed: i32 },
    IterationCompleted { iteration: u32, step_count: u32 },
    IterationCancelled { iteration: u32 },
    IterationFailed { iteration: u32, reason: String },
    RecordingSaved { iteration: u32, path: PathBuf },
    RecordingFailed { iteration: u32, reason: String },
}

struct SaveOutcome {
    iteration: u32,
    result: Result<PathBuf>,
}

/// State of the running iteration
struct Iteration {
    number: u32,
    seed: i32,
    /// `None` while a batch is on the worker
    steps: Option<StepIter>,
    current: Option<GenerationFrame>,
    builder: Option<RecordingBuilder>,
    frames: usize,
}

/// Runs every iteration of a configured model, one after another.
pub struct Orchestrator {
    model: Arc<dyn GenerationModel>,
    config: ModelConfig,
    palette: Arc<ResolvedPalette>,
    /// Palette written into recordings (the editable copy)
    recording_palette: FullPalette,
    catalog: Arc<dyn BlockCatalog + Send + Sync>,
    store: Option<RecordingStore>,
    worker: StepWorker,
    layout: GridLayout,
    seeds: Vec<i32>,
    tick: Duration,
    cancel: CancelToken,
    next_dispatch: Option<Instant>,
    next_number: u32,
    current: Option<Iteration>,
    state: IterationState,
    results: Vec<IterationResult>,
    events: Vec<GenerationEvent>,
    save_tx: mpsc::UnboundedSender<SaveOutcome>,
    save_rx: mpsc::UnboundedReceiver<SaveOutcome>,
    pending_saves: usize,
    done: bool,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn GenerationModel>,
        config: ModelConfig,
        palette: Arc<ResolvedPalette>,
    ) -> Result<Self> {
        config.validate()?;
        let worker = StepWorker::new()?;
        let (save_tx, save_rx) = mpsc::unbounded_channel();

        Ok(Self {
            recording_palette: palette.full.clone(),
            catalog: Arc::new(BlockStateCatalog),
            store: None,
            layout: GridLayout::new(config.amount),
            seeds: config.resolve_seeds(),
            tick: config.tick(),
            cancel: CancelToken::new(),
            next_dispatch: None,
            next_number: 1,
            current: None,
            state: IterationState::Idle,
            results: Vec::new(),
            events: Vec::new(),
            save_tx,
            save_rx,
            pending_saves: 0,
            done: false,
            model,
            config,
            palette,
            worker,
        })
    }

    /// Save finished recordings here. Without a store they stay in memory.
    pub fn with_store(mut self, store: RecordingStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Palette written into recordings, usually the session's editable copy
    pub fn with_recording_palette(mut self, palette: FullPalette) -> Self {
        self.recording_palette = palette;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn BlockCatalog + Send + Sync>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Change the pacing; applies from the next batch on
    pub fn set_playback_speed(&mut self, speed: f32) {
        if !(speed.is_finite() && speed > 0.0) {
            log::warn!("Ignoring invalid playback speed {}", speed);
            return;
        }
        self.config.playback_speed = speed;
        self.tick = self.config.tick();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request cancellation; takes effect at the next poll
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> IterationState {
        self.state
    }

    pub fn results(&self) -> &[IterationResult] {
        &self.results
    }

    pub fn drain_events(&mut self) -> Vec<GenerationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_saves(&self) -> usize {
        self.pending_saves
    }

    pub fn progress(&self) -> Progress {
        let (step_count, frames) = self
            .current
            .as_ref()
            .map(|it| (it.current.as_ref().map_or(0, GenerationFrame::step_count), it.frames))
            .unwrap_or((0, 0));
        Progress {
            iteration: self.next_number.saturating_sub(1).min(self.config.amount),
            amount: self.config.amount,
            step_count,
            frames,
        }
    }

    /// Advance by at most one batch. Never blocks.
    pub fn poll<S: VisualizationSink + ?Sized>(&mut self, now: Instant, sink: &mut S) -> TaskStatus {
        self.drain_saves();

        if !self.done {
            if self.cancel.is_cancelled() {
                self.cancel_current(sink);
            } else {
                self.advance(now, sink);
            }
        }

        if self.done && self.pending_saves == 0 {
            TaskStatus::Finished
        } else {
            TaskStatus::Running(self.progress())
        }
    }

    /// Poll against the wall clock until everything, saves included, is done
    pub fn run_to_end<S: VisualizationSink + ?Sized>(&mut self, sink: &mut S) {
        while let TaskStatus::Running(_) = self.poll(Instant::now(), sink) {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn advance<S: VisualizationSink + ?Sized>(&mut self, now: Instant, sink: &mut S) {
        if self.worker.is_busy() {
            match self.worker.poll() {
                None => {}
                Some(Ok((steps, outcome))) => self.on_batch(steps, outcome, now, sink),
                Some(Err(e)) => self.fail_current(e.to_string()),
            }
            return;
        }

        if self.next_dispatch.is_some_and(|at| now < at) {
            return;
        }

        if self.current.is_none() {
            if self.next_number > self.config.amount {
                log::info!("All {} iterations finished", self.config.amount);
                self.done = true;
                return;
            }
            self.start_iteration();
        }

        let budget = self.config.steps_per_refresh;
        let submitted = match self.current.as_mut().and_then(|it| it.steps.take()) {
            Some(steps) => self.worker.submit(steps, budget),
            None => return,
        };
        if let Err(e) = submitted {
            self.fail_current(e.to_string());
        }
    }

    fn start_iteration(&mut self) {
        let number = self.next_number;
        self.next_number += 1;
        let seed = self.seeds.get(number as usize - 1).copied().unwrap_or_default();
        let steps = self.model.run(seed, self.config.steps, self.config.animated);

        log::info!("Iteration #{} started (seed {})", number, seed);
        self.events.push(GenerationEvent::IterationStarted { iteration: number, seed });
        self.state = IterationState::Stepping;
        self.current = Some(Iteration {
            number,
            seed,
            steps: Some(steps),
            current: None,
            builder: self.config.record.then(RecordingBuilder::new),
            frames: 0,
        });
    }

    fn on_batch<S: VisualizationSink + ?Sized>(
        &mut self,
        steps: StepIter,
        outcome: BatchOutcome,
        now: Instant,
        sink: &mut S,
    ) {
        let Some(mut iteration) = self.current.take() else {
            return;
        };
        iteration.steps = Some(steps);

        let fresh = match outcome.last.as_ref().map(|step| step.to_frame()) {
            Some(Ok(frame)) => {
                iteration.current = Some(frame);
                true
            }
            Some(Err(e)) => {
                log::warn!("Iteration #{}: dropping invalid snapshot: {}", iteration.number, e);
                false
            }
            None => false,
        };

        if fresh && self.config.animated {
            let lifetime = Lifetime::Timed(self.tick.as_secs_f32());
            self.show_current(&mut iteration, lifetime, sink);
            Self::record_current(&mut iteration);
        }

        self.next_dispatch = Some(now + self.tick);
        if outcome.exhausted {
            self.complete(iteration, sink);
        } else {
            self.current = Some(iteration);
        }
    }

    fn show_current<S: VisualizationSink + ?Sized>(&self, iteration: &mut Iteration, lifetime: Lifetime, sink: &mut S) {
        let Some(frame) = &iteration.current else {
            return;
        };
        let origin = self.layout.origin(iteration.number - 1, frame.size());
        let instances = frame_instances(frame, &self.palette, origin, lifetime);
        log::debug!(
            "Iteration #{} step {}: {} instances",
            iteration.number,
            frame.step_count(),
            instances.len()
        );
        sink.visualize(VisualBatch {
            iteration: Some(iteration.number),
            frame: iteration.frames,
            instances,
        });
        iteration.frames += 1;
    }

    fn record_current(iteration: &mut Iteration) {
        let (Some(builder), Some(frame)) = (iteration.builder.as_mut(), &iteration.current) else {
            return;
        };
        if builder.is_latest(frame.step_count()) {
            return;
        }
        if let Err(e) = builder.push_frame(frame.clone()) {
            log::warn!("Iteration #{}: frame not recorded: {}", iteration.number, e);
        }
    }

    fn complete<S: VisualizationSink + ?Sized>(&mut self, mut iteration: Iteration, sink: &mut S) {
        self.state = IterationState::Completed;

        if iteration.current.is_none() {
            log::info!("Iteration #{} produced no frames", iteration.number);
        } else {
            self.show_current(&mut iteration, Lifetime::Persistent, sink);
            Self::record_current(&mut iteration);
        }

        let recording = iteration
            .builder
            .take()
            .and_then(|builder| builder.finish(&self.recording_palette, self.catalog.as_ref()))
            .map(Arc::new);
        if let Some(recording) = &recording {
            self.save(iteration.number, Arc::clone(recording));
        }

        let result = IterationResult {
            iteration: iteration.number,
            seed: iteration.seed,
            final_frame: iteration.current,
            recording,
        };
        log::info!(
            "Iteration #{} complete. Steps: {} Frames: {}",
            result.iteration,
            result.step_count(),
            iteration.frames
        );
        self.events.push(GenerationEvent::IterationCompleted {
            iteration: result.iteration,
            step_count: result.step_count(),
        });
        self.results.push(result);
    }

    fn save(&mut self, iteration: u32, recording: Arc<Recording>) {
        let Some(store) = self.store.clone() else {
            log::debug!("No recording store, iteration #{} kept in memory", iteration);
            return;
        };
        let model = if self.config.model.trim().is_empty() {
            self.model.name()
        } else {
            self.config.model.as_str()
        };
        let name = recording_name(model, iteration);

        let tx = self.save_tx.clone();
        self.pending_saves += 1;
        self.worker.handle().spawn(async move {
            let result = store.save(&name, &recording).await;
            let _ = tx.send(SaveOutcome { iteration, result });
        });
    }

    fn drain_saves(&mut self) {
        while let Ok(outcome) = self.save_rx.try_recv() {
            self.pending_saves = self.pending_saves.saturating_sub(1);
            let event = match outcome.result {
                Ok(path) => GenerationEvent::RecordingSaved { iteration: outcome.iteration, path },
                Err(e) => {
                    log::error!("Failed to save recording of iteration #{}: {}", outcome.iteration, e);
                    GenerationEvent::RecordingFailed { iteration: outcome.iteration, reason: e.to_string() }
                }
            };
            self.events.push(event);
        }
    }

    fn cancel_current<S: VisualizationSink + ?Sized>(&mut self, sink: &mut S) {
        if let Some(iteration) = self.current.take() {
            log::info!("Iteration #{} cancelled", iteration.number);
            sink.discard_iteration(iteration.number);
            self.events.push(GenerationEvent::IterationCancelled { iteration: iteration.number });
            self.state = IterationState::Cancelled;
        }
        self.done = true;
    }

    fn fail_current(&mut self, reason: String) {
        if let Some(iteration) = self.current.take() {
            log::error!("Iteration #{} failed: {}", iteration.number, reason);
            self.events.push(GenerationEvent::IterationFailed { iteration: iteration.number, reason });
            self.state = IterationState::Failed;
        }
    }
}
