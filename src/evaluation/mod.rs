//! Cost computation and structural checks of finished assignments.

mod evaluator;

pub use evaluator::SolutionEvaluator;
