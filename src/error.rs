//! Library error types
//!
//! File and config I/O use `anyhow` with path context; everything the
//! benchmark engine itself can fail on is a `BenchError`.

use thiserror::Error;

use crate::client::ClientError;

#[derive(Debug, Error)]
pub enum BenchError {
    /// Suite lookup failed; carries every valid name in registry order
    #[error("Unknown suite '{name}'. Available: {}", .available.join(", "))]
    UnknownSuite { name: String, available: Vec<String> },

    /// Aggregation was asked to reduce a run with no results
    #[error("No results to compute metrics from")]
    EmptyRun,

    #[error("Need at least 2 runs to compare, got {0}")]
    NotEnoughRuns(usize),

    /// Runs are keyed by model name, so each may appear once per comparison
    #[error("Model '{0}' listed more than once")]
    DuplicateModel(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl BenchError {
    /// True when the endpoint rejected our credentials. Always fatal for the run.
    pub fn is_authentication(&self) -> bool {
        matches!(self, BenchError::Client(ClientError::Authentication(_)))
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
