//! Per-call time budget for collaborators
//!
//! A timeout surfaces as [`SourceError::Timeout`] and is handled exactly like
//! any other source failure. No retries.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use super::{FixtureSource, QuoteSource, RosterSource, SelectionPolicy};
use crate::error::SourceError;
use crate::types::{CandidateFixture, OddsQuote, PolicyResult, RosterEntry};

/// Wraps a collaborator so every call is bounded by `limit`
#[derive(Clone, Debug)]
pub struct WithTimeout<S> {
    inner: S,
    limit: Duration,
}

impl<S> WithTimeout<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T, F>(&self, what: &str, call: F) -> Result<T, SourceError>
    where
        F: std::future::Future<Output = Result<T, SourceError>>,
    {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} timed out after {:?}", what, self.limit);
                Err(SourceError::Timeout(self.limit))
            }
        }
    }
}

#[async_trait]
impl<S: FixtureSource> FixtureSource for WithTimeout<S> {
    async fn fetch_fixtures(&self, date: NaiveDate) -> Result<Vec<CandidateFixture>, SourceError> {
        self.bounded("fixture fetch", self.inner.fetch_fixtures(date)).await
    }
}

#[async_trait]
impl<S: QuoteSource> QuoteSource for WithTimeout<S> {
    async fn fetch_quote(&self, home_team: &str, away_team: &str) -> Result<OddsQuote, SourceError> {
        self.bounded("quote fetch", self.inner.fetch_quote(home_team, away_team)).await
    }
}

#[async_trait]
impl<S: RosterSource> RosterSource for WithTimeout<S> {
    async fn fetch_roster(&self, league_id: u32) -> Result<Vec<RosterEntry>, SourceError> {
        self.bounded("roster fetch", self.inner.fetch_roster(league_id)).await
    }
}

#[async_trait]
impl<S: SelectionPolicy> SelectionPolicy for WithTimeout<S> {
    async fn select(
        &self,
        candidates: &[CandidateFixture],
        date: NaiveDate,
        max_count: usize,
    ) -> Result<PolicyResult, SourceError> {
        self.bounded("selection policy", self.inner.select(candidates, date, max_count)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowRoster(Duration);

    #[async_trait]
    impl RosterSource for SlowRoster {
        async fn fetch_roster(&self, _league_id: u32) -> Result<Vec<RosterEntry>, SourceError> {
            tokio::time::sleep(self.0).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_source_error() {
        let source = WithTimeout::new(SlowRoster(Duration::from_secs(30)), Duration::from_secs(10));
        let err = source.fetch_roster(47).await.unwrap_err();
        assert_eq!(err, SourceError::Timeout(Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_call_passes_through() {
        let source = WithTimeout::new(SlowRoster(Duration::from_millis(5)), Duration::from_secs(10));
        assert!(source.fetch_roster(47).await.unwrap().is_empty());
    }
}
