//! Collaborator interfaces and their HTTP implementations
//!
//! # Components
//! - [`FixtureSource`]: candidate fixtures for a date
//! - [`QuoteSource`]: 1X2 decimal odds for a home/away pair
//! - [`RosterSource`]: league table rows for a league id
//! - [`SelectionPolicy`]: optional external slate picker (e.g. model-driven)
//! - [`WithTimeout`]: bounds every call of any of the above
//! - [`QuoteChain`] / [`FixtureChain`]: ordered fallback across providers

mod chain;
mod credentials;
pub mod football_data;
pub mod fotmob;
pub mod odds_api;
mod timeout;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::SourceError;
use crate::types::{CandidateFixture, OddsQuote, PolicyResult, RosterEntry};

pub use chain::{FixtureChain, QuoteChain};
pub use credentials::ApiKeys;
pub use football_data::FootballDataClient;
pub use fotmob::FotMobClient;
pub use odds_api::OddsApiClient;
pub use timeout::WithTimeout;

/// Schedule feed. No ordering guarantee on the returned fixtures.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    async fn fetch_fixtures(&self, date: NaiveDate) -> Result<Vec<CandidateFixture>, SourceError>;
}

/// Odds feed. Returns a complete triple or an error, never partial legs.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, home_team: &str, away_team: &str) -> Result<OddsQuote, SourceError>;
}

/// League table feed, consumed only by the team directory
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn fetch_roster(&self, league_id: u32) -> Result<Vec<RosterEntry>, SourceError>;
}

/// External replacement for the heuristic selector
#[async_trait]
pub trait SelectionPolicy: Send + Sync {
    async fn select(
        &self,
        candidates: &[CandidateFixture],
        date: NaiveDate,
        max_count: usize,
    ) -> Result<PolicyResult, SourceError>;
}

// Shared handles and borrows delegate to the provider they point at

#[async_trait]
impl<T: FixtureSource + ?Sized> FixtureSource for Arc<T> {
    async fn fetch_fixtures(&self, date: NaiveDate) -> Result<Vec<CandidateFixture>, SourceError> {
        (**self).fetch_fixtures(date).await
    }
}

#[async_trait]
impl<T: QuoteSource + ?Sized> QuoteSource for Arc<T> {
    async fn fetch_quote(&self, home_team: &str, away_team: &str) -> Result<OddsQuote, SourceError> {
        (**self).fetch_quote(home_team, away_team).await
    }
}

#[async_trait]
impl<T: RosterSource + ?Sized> RosterSource for Arc<T> {
    async fn fetch_roster(&self, league_id: u32) -> Result<Vec<RosterEntry>, SourceError> {
        (**self).fetch_roster(league_id).await
    }
}

#[async_trait]
impl<T: SelectionPolicy + ?Sized> SelectionPolicy for Arc<T> {
    async fn select(
        &self,
        candidates: &[CandidateFixture],
        date: NaiveDate,
        max_count: usize,
    ) -> Result<PolicyResult, SourceError> {
        (**self).select(candidates, date, max_count).await
    }
}

#[async_trait]
impl<T: FixtureSource + ?Sized> FixtureSource for &T {
    async fn fetch_fixtures(&self, date: NaiveDate) -> Result<Vec<CandidateFixture>, SourceError> {
        (**self).fetch_fixtures(date).await
    }
}

#[async_trait]
impl<T: QuoteSource + ?Sized> QuoteSource for &T {
    async fn fetch_quote(&self, home_team: &str, away_team: &str) -> Result<OddsQuote, SourceError> {
        (**self).fetch_quote(home_team, away_team).await
    }
}

#[async_trait]
impl<T: SelectionPolicy + ?Sized> SelectionPolicy for &T {
    async fn select(
        &self,
        candidates: &[CandidateFixture],
        date: NaiveDate,
        max_count: usize,
    ) -> Result<PolicyResult, SourceError> {
        (**self).select(candidates, date, max_count).await
    }
}
