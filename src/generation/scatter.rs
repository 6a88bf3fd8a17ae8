//! Built-in generator: rewrites one random cell per step.
//!
//! Used by the headless tools and tests; real models plug in through
//! [`GenerationModel`].

use crate::core::GridSize;
use super::model::{GenerationModel, GeneratorStep, StepIter};
use super::rng::SimpleRng;

pub struct ScatterModel {
    name: String,
    size: GridSize,
    legend: Vec<char>,
}

impl ScatterModel {
    /// `legend[0]` is the empty symbol. The legend needs at least two
    /// and at most 256 symbols.
    pub fn new(name: impl Into<String>, size: GridSize, legend: Vec<char>) -> Self {
        debug_assert!((2..=256).contains(&legend.len()));
        Self { name: name.into(), size, legend }
    }
}

impl GenerationModel for ScatterModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, seed: i32, steps: u32, animated: bool) -> StepIter {
        Box::new(ScatterRun {
            rng: SimpleRng::new(seed as u64),
            values: vec![0; self.size.volume()],
            legend: self.legend.clone(),
            size: self.size,
            step: 0,
            max_steps: steps,
            animated,
        })
    }
}

struct ScatterRun {
    rng: SimpleRng,
    values: Vec<u8>,
    legend: Vec<char>,
    size: GridSize,
    step: u32,
    max_steps: u32,
    animated: bool,
}

impl ScatterRun {
    fn advance(&mut self) {
        let cell = self.rng.below(self.values.len() as u32) as usize;
        let kinds = self.legend.len() as u32;
        self.values[cell] = self.rng.below(kinds) as u8;
        self.step += 1;
    }

    fn snapshot(&self) -> GeneratorStep {
        GeneratorStep {
            values: self.values.clone(),
            legend: self.legend.clone(),
            size: self.size,
            step_count: self.step,
        }
    }
}

impl Iterator for ScatterRun {
    type Item = GeneratorStep;

    fn next(&mut self) -> Option<GeneratorStep> {
        if self.step >= self.max_steps || self.values.is_empty() {
            return None;
        }
        if self.animated {
            self.advance();
        } else {
            while self.step < self.max_steps {
                self.advance();
            }
        }
        Some(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ScatterModel {
        ScatterModel::new("Scatter", GridSize::new(4, 4, 1), vec!['B', 'W', 'R'])
    }

    #[test]
    fn test_animated_yields_every_step() {
        let steps: Vec<GeneratorStep> = model().run(3, 10, true).collect();
        assert_eq!(steps.len(), 10);
        assert_eq!(steps[0].step_count, 1);
        assert_eq!(steps[9].step_count, 10);
        assert!(steps.iter().all(|s| s.to_frame().is_ok()));
    }

    #[test]
    fn test_not_animated_yields_final_only() {
        let animated: Vec<GeneratorStep> = model().run(3, 10, true).collect();
        let final_only: Vec<GeneratorStep> = model().run(3, 10, false).collect();
        assert_eq!(final_only.len(), 1);
        assert_eq!(final_only[0], animated[9]);
    }

    #[test]
    fn test_zero_steps_yields_nothing() {
        assert_eq!(model().run(1, 0, true).count(), 0);
    }
}
