//! Error types for the scoring core.

use thiserror::Error;

use crate::competition::{AthleteId, BlockId};

/// Validation failures raised by the block score engine and the aggregator.
///
/// Both are reported synchronously to the caller and never retried here.
/// A failure for one block leaves every other block untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// The athlete has no metric at all for any eligible sport of the block.
    /// "No data yet" is distinct from "zero calories achieved".
    #[error("no data for athlete {athlete} in any eligible sport of {block}")]
    IncompleteData { block: BlockId, athlete: AthleteId },

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
}
