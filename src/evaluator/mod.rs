// src/evaluator/mod.rs - Rubric, prompt, judge call and output parsing

pub mod judge;
pub mod parser;
pub mod prompt;
pub mod rubric;

pub use judge::JudgeClient;
pub use parser::{CriterionScores, JudgeVerdict};
pub use rubric::{Criterion, NormalizedWeights};
