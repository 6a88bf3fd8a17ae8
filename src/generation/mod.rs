//! Generation orchestration: drives an external model step by step,
//! visualizes its snapshots and records them.

pub mod config;
pub mod layout;
pub mod model;
pub mod orchestrator;
pub mod rng;
pub mod scatter;
pub mod worker;

pub use config::ModelConfig;
pub use layout::GridLayout;
pub use model::{GenerationModel, GeneratorStep, StepIter};
pub use orchestrator::{
    CancelToken, GenerationEvent, IterationResult, IterationState, Orchestrator, Progress, TaskStatus,
};
pub use scatter::ScatterModel;
pub use worker::{BatchOutcome, StepWorker};
