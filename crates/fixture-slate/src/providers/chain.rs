//! Ordered fallback across providers of the same capability
//!
//! The first provider to succeed wins. Failures are logged and the next provider
//! is tried; if all fail, the last error is returned.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};

use super::{FixtureSource, QuoteSource};
use crate::error::SourceError;
use crate::types::{CandidateFixture, OddsQuote};

/// Quote providers tried in order
#[derive(Clone, Default)]
pub struct QuoteChain {
    providers: Vec<(String, Arc<dyn QuoteSource>)>,
}

impl QuoteChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider; earlier providers take precedence
    pub fn with(mut self, name: impl Into<String>, provider: Arc<dyn QuoteSource>) -> Self {
        self.providers.push((name.into(), provider));
        self
    }
}

#[async_trait]
impl QuoteSource for QuoteChain {
    async fn fetch_quote(&self, home_team: &str, away_team: &str) -> Result<OddsQuote, SourceError> {
        let mut last_err = SourceError::Unavailable("no quote providers configured".to_string());

        for (name, provider) in &self.providers {
            match provider.fetch_quote(home_team, away_team).await {
                Ok(quote) => {
                    debug!("Quote for {} vs {} served by {}", home_team, away_team, name);
                    return Ok(quote);
                }
                Err(e) => {
                    warn!("Quote provider {} failed for {} vs {}: {}", name, home_team, away_team, e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}

/// Fixture providers tried in order
#[derive(Clone, Default)]
pub struct FixtureChain {
    providers: Vec<(String, Arc<dyn FixtureSource>)>,
}

impl FixtureChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, provider: Arc<dyn FixtureSource>) -> Self {
        self.providers.push((name.into(), provider));
        self
    }
}

#[async_trait]
impl FixtureSource for FixtureChain {
    async fn fetch_fixtures(&self, date: NaiveDate) -> Result<Vec<CandidateFixture>, SourceError> {
        let mut last_err = SourceError::Unavailable("no fixture providers configured".to_string());

        for (name, provider) in &self.providers {
            match provider.fetch_fixtures(date).await {
                Ok(fixtures) => {
                    debug!("{} fixtures for {} served by {}", fixtures.len(), date, name);
                    return Ok(fixtures);
                }
                Err(e) => {
                    warn!("Fixture provider {} failed for {}: {}", name, date, e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}
