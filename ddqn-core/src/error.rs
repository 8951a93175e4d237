//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum DqnError {
    /// More transitions were requested from a replay buffer than it holds.
    #[error("Insufficient data: requested {requested} transitions, but the buffer holds {available}")]
    InsufficientData {
        /// Requested batch size.
        requested: usize,

        /// Number of transitions in the buffer.
        available: usize,
    },

    /// Loss or gradient became non-finite during a learning update.
    #[error("Divergence: {0}")]
    Divergence(String),

    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),
}
