//! Error taxonomy
//!
//! Two layers:
//! - [`SourceError`]: a single collaborator call failed. Always recovered locally
//!   (the fixture or team is skipped, the run continues).
//! - [`SelectionError`] / [`SlateError`]: the run cannot produce a valid slate.
//!   Always fatal, surfaced to the caller with the date attached.

use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use crate::pipeline::PhaseError;
use crate::MIN_SLATE_SIZE;

/// Failure of one upstream call (fixtures, quotes, rosters, selection policy)
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    /// Network error or non-success response
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its time budget
    #[error("source timed out after {0:?}")]
    Timeout(Duration),

    /// Upstream answered, but has nothing for this request
    #[error("not found: {0}")]
    NotFound(String),

    /// A required field is missing or invalid (e.g. one odds leg)
    #[error("incomplete data: {0}")]
    IncompleteData(String),

    /// API key not configured
    #[error("missing credentials: {0} not set")]
    MissingCredentials(&'static str),

    /// Response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl SourceError {
    /// True when the data itself was bad rather than the call failing
    pub fn is_incomplete(&self) -> bool {
        matches!(self, SourceError::IncompleteData(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else {
            SourceError::Unavailable(err.to_string())
        }
    }
}

/// Reasons a slate cannot be produced
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("max_count must be >= {min}, got {0}", min = MIN_SLATE_SIZE)]
    InvalidMaxCount(usize),

    #[error("not enough fixtures to select a slate (need >= {min}, got {found})", min = MIN_SLATE_SIZE)]
    InsufficientCandidates { found: usize },

    #[error("unable to select minimum {min} games (selected {selected})", min = MIN_SLATE_SIZE)]
    InsufficientSlate { selected: usize },

    #[error("selection policy output failed validation: {0}")]
    Validation(String),

    #[error("fixture source failed: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Phase(#[from] PhaseError),
}

/// Fatal run failure carrying the date it happened for
#[derive(Debug, Error)]
#[error("slate selection for {date} failed: {source}")]
pub struct SlateError {
    pub date: NaiveDate,
    #[source]
    pub source: SelectionError,
}

impl SlateError {
    pub fn new(date: NaiveDate, source: SelectionError) -> Self {
        Self { date, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slate_error_carries_date_and_reason() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 19).unwrap();
        let err = SlateError::new(date, SelectionError::InsufficientCandidates { found: 2 });
        let msg = err.to_string();
        assert!(msg.contains("2025-12-19"));
        assert!(msg.contains("got 2"));
    }

    #[test]
    fn test_incomplete_classification() {
        assert!(SourceError::IncompleteData("draw".into()).is_incomplete());
        assert!(!SourceError::Timeout(Duration::from_secs(1)).is_incomplete());
    }
}
