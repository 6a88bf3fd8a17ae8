//! Background execution of bounded generator batches.
//!
//! The generator iterator is moved into a blocking task, advanced by at most
//! `budget` steps, and handed back through a channel together with the last
//! snapshot. The host loop only ever polls.

use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc;

use crate::core::{Error, Result};
use super::model::{GeneratorStep, StepIter};

/// Result of one batch
#[derive(Debug)]
pub struct BatchOutcome {
    /// Last snapshot produced in this batch
    pub last: Option<GeneratorStep>,
    /// Steps actually pulled
    pub steps: u32,
    /// The generator signalled it has no more steps
    pub exhausted: bool,
}

type BatchMessage = std::result::Result<(StepIter, BatchOutcome), String>;

/// Pull up to `budget` steps from `steps`
pub fn run_batch(steps: &mut StepIter, budget: u32) -> BatchOutcome {
    let mut outcome = BatchOutcome { last: None, steps: 0, exhausted: false };
    for _ in 0..budget {
        match steps.next() {
            Some(step) => {
                outcome.last = Some(step);
                outcome.steps += 1;
            }
            None => {
                outcome.exhausted = true;
                break;
            }
        }
    }
    outcome
}

/// Runs one generator batch at a time on a dedicated runtime
pub struct StepWorker {
    runtime: Runtime,
    result_tx: mpsc::UnboundedSender<BatchMessage>,
    result_rx: mpsc::UnboundedReceiver<BatchMessage>,
    in_flight: bool,
}

impl StepWorker {
    pub fn new() -> Result<Self> {
        let runtime = Runtime::new()?;
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        Ok(Self { runtime, result_tx, result_rx, in_flight: false })
    }

    /// Handle for other background work (recording saves)
    pub fn handle(&self) -> &Handle {
        self.runtime.handle()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Start a batch. Only one batch may be in flight.
    pub fn submit(&mut self, mut steps: StepIter, budget: u32) -> Result<()> {
        if self.in_flight {
            return Err(Error::Worker("A batch is already running".into()));
        }
        self.in_flight = true;

        let tx = self.result_tx.clone();
        self.runtime.spawn(async move {
            let joined = tokio::task::spawn_blocking(move || {
                let outcome = run_batch(&mut steps, budget);
                (steps, outcome)
            })
            .await;
            let _ = tx.send(joined.map_err(|e| e.to_string()));
        });
        Ok(())
    }

    /// Non-blocking check for the running batch.
    ///
    /// Returns the generator and the batch outcome once the batch is done,
    /// an error if the generator panicked.
    pub fn poll(&mut self) -> Option<Result<(StepIter, BatchOutcome)>> {
        let message = self.result_rx.try_recv().ok()?;
        self.in_flight = false;
        Some(message.map_err(|e| Error::Worker(format!("Generator batch failed: {}", e))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridSize;

    fn steps(count: u32) -> StepIter {
        Box::new((1..=count).map(|i| GeneratorStep {
            values: vec![0],
            legend: vec!['B'],
            size: GridSize::new(1, 1, 1),
            step_count: i,
        }))
    }

    fn wait(worker: &mut StepWorker) -> Result<(StepIter, BatchOutcome)> {
        loop {
            if let Some(result) = worker.poll() {
                return result;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    #[test]
    fn test_run_batch_budget() {
        let mut iter = steps(5);
        let outcome = run_batch(&mut iter, 3);
        assert_eq!(outcome.steps, 3);
        assert!(!outcome.exhausted);
        assert_eq!(outcome.last.unwrap().step_count, 3);

        let outcome = run_batch(&mut iter, 3);
        assert_eq!(outcome.steps, 2);
        assert!(outcome.exhausted);
        assert_eq!(outcome.last.unwrap().step_count, 5);
    }

    #[test]
    fn test_worker_returns_generator() {
        let mut worker = StepWorker::new().unwrap();
        worker.submit(steps(4), 2).unwrap();
        assert!(worker.is_busy());
        assert!(matches!(worker.submit(steps(1), 1), Err(Error::Worker(_))));

        let (iter, outcome) = wait(&mut worker).unwrap();
        assert!(!worker.is_busy());
        assert_eq!(outcome.last.unwrap().step_count, 2);

        worker.submit(iter, 10).unwrap();
        let (_, outcome) = wait(&mut worker).unwrap();
        assert_eq!(outcome.steps, 2);
        assert!(outcome.exhausted);
    }

    #[test]
    fn test_worker_reports_panic() {
        let mut worker = StepWorker::new().unwrap();
        let panicking: StepIter = Box::new(std::iter::from_fn(|| -> Option<GeneratorStep> { panic!("generator failure") }));
        worker.submit(panicking, 1).unwrap();
        assert!(matches!(wait(&mut worker), Err(Error::Worker(_))));
    }
}
