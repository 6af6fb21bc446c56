//! The Odds API client (1X2 decimal odds)
//!
//! Base URL: https://api.the-odds-api.com/v4
//!
//! # Endpoints
//! - GET /sports/{sport_key}/odds/?regions=eu&markets=h2h&oddsFormat=decimal
//!
//! # Algorithm
//! 1. Walk the configured sport keys in order
//! 2. Find the first event whose home/away names contain (or are contained in) the requested names
//! 3. Pick a bookmaker by preference, falling back to the first listed
//! 4. Read the h2h market; all three legs must be present

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::credentials::ODDS_API_KEY_ENV;
use super::QuoteSource;
use crate::error::SourceError;
use crate::types::{OddsQuote, OddsTriple};
use crate::ODDS_API_BASE;

/// Major soccer competitions searched for a fixture, in order
pub const DEFAULT_SPORT_KEYS: &[&str] = &[
    "soccer_epl",
    "soccer_spain_la_liga",
    "soccer_italy_serie_a",
    "soccer_germany_bundesliga",
    "soccer_france_ligue_one",
    "soccer_uefa_champs_league",
    "soccer_uefa_europa_league",
];

/// Bookmakers preferred over "first listed"
pub const PREFERRED_BOOKMAKERS: &[&str] = &["betfair", "pinnacle", "bet365"];

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    commence_time: Option<String>,
    #[serde(default)]
    home_team: String,
    #[serde(default)]
    away_team: String,
    #[serde(default)]
    bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Deserialize)]
struct Bookmaker {
    #[serde(default)]
    key: String,
    #[serde(default)]
    markets: Vec<Market>,
}

#[derive(Debug, Deserialize)]
struct Market {
    #[serde(default)]
    key: String,
    #[serde(default)]
    outcomes: Vec<Outcome>,
}

#[derive(Debug, Deserialize)]
struct Outcome {
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: Value,
}

/// Odds REST client
#[derive(Clone)]
pub struct OddsApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    sport_keys: Vec<String>,
}

impl OddsApiClient {
    /// Create a client against the public API
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(ODDS_API_BASE, api_key)
    }

    /// Create a client with custom base URL
    pub fn with_base_url(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            sport_keys: DEFAULT_SPORT_KEYS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replace the searched sport keys
    pub fn with_sport_keys(mut self, sport_keys: Vec<String>) -> Self {
        self.sport_keys = sport_keys;
        self
    }

    /// GET /sports/{sport_key}/odds/
    async fn list_events(&self, api_key: &str, sport_key: &str) -> Result<Vec<Event>, SourceError> {
        let url = format!("{}/sports/{}/odds/", self.base_url, sport_key);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", api_key),
                ("regions", "eu"),
                ("markets", "h2h"),
                ("oddsFormat", "decimal"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!("HTTP {} for {}", status, url)));
        }

        Ok(response.json().await?)
    }

    /// Find the upcoming match between two teams and return its 1X2 odds
    pub async fn get_odds(&self, home_team: &str, away_team: &str) -> Result<OddsQuote, SourceError> {
        let api_key =
            self.api_key.as_deref().ok_or(SourceError::MissingCredentials(ODDS_API_KEY_ENV))?;

        let home_lower = home_team.to_lowercase();
        let away_lower = away_team.to_lowercase();
        let mut failures = 0usize;
        let mut last_err = None;

        for sport_key in &self.sport_keys {
            let events = match self.list_events(api_key, sport_key).await {
                Ok(events) => events,
                Err(e) => {
                    warn!("Odds lookup in {} failed: {}", sport_key, e);
                    failures += 1;
                    last_err = Some(e);
                    continue;
                }
            };

            let found = events.into_iter().find(|event| {
                fuzzy_match(&home_lower, &event.home_team.to_lowercase())
                    && fuzzy_match(&away_lower, &event.away_team.to_lowercase())
            });

            if let Some(event) = found {
                debug!("Matched {} vs {} in {}", home_team, away_team, sport_key);
                return extract_quote(event, home_team, away_team);
            }
        }

        match last_err {
            Some(e) if failures == self.sport_keys.len() => Err(e),
            _ => Err(SourceError::NotFound(format!(
                "no upcoming match found between {} and {}",
                home_team, away_team
            ))),
        }
    }
}

#[async_trait]
impl QuoteSource for OddsApiClient {
    async fn fetch_quote(&self, home_team: &str, away_team: &str) -> Result<OddsQuote, SourceError> {
        self.get_odds(home_team, away_team).await
    }
}

/// Containment in either direction; blank names never match
fn fuzzy_match(wanted: &str, candidate: &str) -> bool {
    if wanted.is_empty() || candidate.is_empty() {
        return false;
    }
    candidate.contains(wanted) || wanted.contains(candidate)
}

fn extract_quote(event: Event, home_team: &str, away_team: &str) -> Result<OddsQuote, SourceError> {
    let Event { id, commence_time, home_team: event_home, away_team: event_away, bookmakers } = event;

    let bookmaker = PREFERRED_BOOKMAKERS
        .iter()
        .find_map(|preferred| bookmakers.iter().find(|b| b.key == *preferred))
        .or_else(|| bookmakers.first())
        .ok_or_else(|| SourceError::IncompleteData("no bookmakers available for this match".into()))?;

    let market = bookmaker.markets.iter().find(|m| m.key == "h2h").ok_or_else(|| {
        SourceError::IncompleteData(format!("no h2h market from bookmaker {}", bookmaker.key))
    })?;

    let event_home = event_home.to_lowercase();
    let event_away = event_away.to_lowercase();
    let (mut home, mut draw, mut away) = (None, None, None);

    for outcome in &market.outcomes {
        let name = outcome.name.to_lowercase();
        let price = outcome.price.as_f64();
        if name == event_home {
            home = price;
        } else if name == event_away {
            away = price;
        } else if name.contains("draw") {
            draw = price;
        }
    }

    let (Some(home), Some(draw), Some(away)) = (home, draw, away) else {
        return Err(SourceError::IncompleteData(
            "incomplete odds data (missing home/draw/away)".to_string(),
        ));
    };

    let bookmaker = if bookmaker.key.is_empty() { "unknown".to_string() } else { bookmaker.key.clone() };

    Ok(OddsQuote {
        home_team: home_team.to_string(),
        away_team: away_team.to_string(),
        match_id: id,
        commence_time,
        odds: OddsTriple::new(home, draw, away),
        bookmaker,
    })
}
