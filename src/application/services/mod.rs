pub mod evaluator;
pub mod scheduler;

pub use evaluator::{Evaluator, EvaluatorSettings, EvaluatorStats, TickOutcome, TickStatus};
pub use scheduler::Scheduler;
