//! Errors raised by the quiz core.

use thiserror::Error;

/// Failures of the question generator and session controller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    /// The catalog cannot yield two distinct stations.
    #[error("station catalog has {available} usable station(s); at least 2 are required")]
    InsufficientData {
        /// Distinct stations the catalog holds.
        available: usize,
    },
    /// A controller operation was called outside its precondition.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// Origin and destination would be the same station.
    #[error("origin and destination are both {0}")]
    SameStation(String),
}
