//! Engine error types.
//!
//! These represent caller contract violations against the quiz engine.
//! Collaborator failures are not errors at this level: they degrade to
//! placeholder values in the session driver.

use thiserror::Error;

/// Errors returned by [`QuizSession`](crate::engine::QuizSession) commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A batch size of zero was requested.
    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    /// The option index does not exist on the current question.
    #[error("option {option} is out of range for question {question} ({available} options)")]
    InvalidOption {
        question: usize,
        option: usize,
        available: usize,
    },

    /// There is no current question to act on.
    #[error("no active question")]
    NoActiveQuestion,
}
