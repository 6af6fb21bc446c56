//! football-data.org fixtures client
//!
//! Base URL: https://api.football-data.org/v4
//!
//! # Endpoints
//! - GET /matches?dateFrom={date}&dateTo={date} - all matches on a date
//!
//! Auth: `X-Auth-Token` header.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::credentials::FOOTBALL_DATA_API_KEY_ENV;
use super::FixtureSource;
use crate::error::SourceError;
use crate::types::CandidateFixture;
use crate::FOOTBALL_DATA_API_BASE;

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatch {
    id: Option<u64>,
    utc_date: Option<String>,
    #[serde(default)]
    home_team: RawTeam,
    #[serde(default)]
    away_team: RawTeam,
    #[serde(default)]
    competition: RawCompetition,
    venue: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTeam {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCompetition {
    name: Option<String>,
    code: Option<String>,
}

/// Fixtures REST client
#[derive(Clone)]
pub struct FootballDataClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FootballDataClient {
    /// Create a client against the public API
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(FOOTBALL_DATA_API_BASE, api_key)
    }

    /// Create a client with custom base URL
    pub fn with_base_url(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key })
    }

    /// GET /matches for a single day
    pub async fn get_matches(&self, date: NaiveDate) -> Result<Vec<CandidateFixture>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredentials(FOOTBALL_DATA_API_KEY_ENV))?;

        let url = format!("{}/matches", self.base_url);
        let day = date.to_string();
        debug!("GET {} (date={})", url, day);

        let response = self
            .client
            .get(&url)
            .header("X-Auth-Token", api_key)
            .query(&[("dateFrom", day.as_str()), ("dateTo", day.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(500).collect();
            return Err(SourceError::Unavailable(format!(
                "football-data.org HTTP {} for {}: {}",
                status, url, body
            )));
        }

        let payload: MatchesResponse = response.json().await?;
        let total = payload.matches.len();
        let fixtures: Vec<CandidateFixture> =
            payload.matches.into_iter().filter_map(parse_match).collect();

        debug!("Parsed {}/{} matches for {}", fixtures.len(), total, day);
        Ok(fixtures)
    }
}

#[async_trait]
impl FixtureSource for FootballDataClient {
    async fn fetch_fixtures(&self, date: NaiveDate) -> Result<Vec<CandidateFixture>, SourceError> {
        self.get_matches(date).await
    }
}

/// Convert one raw match; `None` if any required field is missing or malformed
fn parse_match(value: Value) -> Option<CandidateFixture> {
    let raw: RawMatch = serde_json::from_value(value).ok()?;

    let home_team = non_blank(raw.home_team.name)?;
    let away_team = non_blank(raw.away_team.name)?;
    let competition_name = non_blank(raw.competition.name)?;
    let kickoff = parse_utc(raw.utc_date.as_deref()?)?;

    Some(CandidateFixture {
        match_id: raw.id?,
        home_team,
        away_team,
        kickoff,
        competition_name,
        competition_code: non_blank(raw.competition.code),
        venue: non_blank(raw.venue),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// football-data.org uses e.g. `2025-11-20T19:45:00Z`; offset-less values are taken as UTC
fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_custom_base_url() {
        let client = FootballDataClient::with_base_url("https://example.com/", None).unwrap();
        assert_eq!(client.base_url, "https://example.com");
    }

    #[test]
    fn test_parse_match_complete() {
        let fixture = parse_match(json!({
            "id": 42,
            "utcDate": "2025-11-20T19:45:00Z",
            "homeTeam": {"name": " Arsenal FC "},
            "awayTeam": {"name": "Chelsea FC"},
            "competition": {"name": "Premier League", "code": "PL"},
            "venue": ""
        }))
        .unwrap();

        assert_eq!(fixture.match_id, 42);
        assert_eq!(fixture.home_team, "Arsenal FC");
        assert_eq!(fixture.competition_code.as_deref(), Some("PL"));
        assert_eq!(fixture.venue, None);
        assert_eq!(fixture.kickoff_time().format("%H:%M").to_string(), "19:45");
    }

    #[test]
    fn test_parse_match_skips_malformed() {
        // id as string
        assert!(parse_match(json!({
            "id": "42",
            "utcDate": "2025-11-20T19:45:00Z",
            "homeTeam": {"name": "A"},
            "awayTeam": {"name": "B"},
            "competition": {"name": "X"}
        }))
        .is_none());

        // blank away team
        assert!(parse_match(json!({
            "id": 42,
            "utcDate": "2025-11-20T19:45:00Z",
            "homeTeam": {"name": "A"},
            "awayTeam": {"name": "  "},
            "competition": {"name": "X"}
        }))
        .is_none());

        // no competition
        assert!(parse_match(json!({
            "id": 42,
            "utcDate": "2025-11-20T19:45:00Z",
            "homeTeam": {"name": "A"},
            "awayTeam": {"name": "B"}
        }))
        .is_none());
    }

    #[test]
    fn test_parse_utc_without_offset() {
        let dt = parse_utc("2025-11-20T19:45:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-11-20T19:45:00+00:00");
        assert!(parse_utc("2025-11-20").is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_reported_without_request() {
        let client = FootballDataClient::with_base_url("http://127.0.0.1:9", None).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 11, 20).unwrap();
        let err = client.get_matches(date).await.unwrap_err();
        assert_eq!(err, SourceError::MissingCredentials(FOOTBALL_DATA_API_KEY_ENV));
    }
}
