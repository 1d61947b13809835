//! The filtered aggregation view model.
//!
//! Every function here is a pure function of a [`Table`](crate::models::Table)
//! and an explicit request; nothing is cached between calls.

pub mod aggregator;
pub mod correlation;
pub mod filter;
pub mod segment;
pub mod stats;

pub use aggregator::*;
pub use correlation::*;
pub use filter::*;
pub use segment::*;
pub use stats::*;

use thiserror::Error;

/// Errors raised by analysis requests that cannot be satisfied.
///
/// Callers turn these into user-visible notices; none of them is fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Bin count must be at least 1")]
    ZeroBins,

    #[error("Expected {expected} labels for the requested bins, got {actual}")]
    LabelCount { expected: usize, actual: usize },

    #[error("Bin edges must be finite and strictly ascending")]
    InvalidEdges,

    #[error("Column {0} has no values to bin")]
    EmptyColumn(String),

    #[error("Correlation needs at least 2 distinct columns, got {0}")]
    TooFewColumns(usize),
}
