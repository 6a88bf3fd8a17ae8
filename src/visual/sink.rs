//! Destinations for visualization batches.

use super::instance::VisualBatch;

/// Receiver of visualization batches (renderer, scene graph, test double)
pub trait VisualizationSink {
    fn visualize(&mut self, batch: VisualBatch);

    /// Release everything dispatched for a cancelled iteration
    fn discard_iteration(&mut self, _iteration: u32) {}
}

/// Keeps every batch in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub batches: Vec<VisualBatch>,
    pub discarded: Vec<u32>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_count(&self) -> usize {
        self.batches.iter().map(VisualBatch::len).sum()
    }

    /// Batches belonging to one iteration
    pub fn iteration(&self, iteration: u32) -> impl Iterator<Item = &VisualBatch> {
        self.batches.iter().filter(move |b| b.iteration == Some(iteration))
    }
}

impl VisualizationSink for CollectingSink {
    fn visualize(&mut self, batch: VisualBatch) {
        self.batches.push(batch);
    }

    fn discard_iteration(&mut self, iteration: u32) {
        self.batches.retain(|b| b.iteration != Some(iteration));
        self.discarded.push(iteration);
    }
}

/// Logs a line per batch, for headless runs
#[derive(Debug, Default)]
pub struct LogSink {
    pub batches: usize,
    pub instances: usize,
}

impl VisualizationSink for LogSink {
    fn visualize(&mut self, batch: VisualBatch) {
        let persistent = batch.instances.iter().filter(|i| i.lifetime.is_persistent()).count();
        log::info!(
            "Frame {}: {} instances ({} persistent)",
            batch.frame,
            batch.len(),
            persistent
        );
        self.batches += 1;
        self.instances += batch.len();
    }

    fn discard_iteration(&mut self, iteration: u32) {
        log::info!("Iteration {} discarded", iteration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_discard() {
        let mut sink = CollectingSink::new();
        sink.visualize(VisualBatch { iteration: Some(0), ..Default::default() });
        sink.visualize(VisualBatch { iteration: Some(1), ..Default::default() });
        sink.visualize(VisualBatch { iteration: None, ..Default::default() });

        sink.discard_iteration(0);
        assert_eq!(sink.batches.len(), 2);
        assert_eq!(sink.iteration(1).count(), 1);
        assert_eq!(sink.discarded, vec![0]);
    }
}
