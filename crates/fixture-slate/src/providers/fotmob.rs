//! FotMob league table client
//!
//! Base URL: https://www.fotmob.com
//!
//! # Endpoints
//! - GET /api/leagues?id={league_id} - league overview; the first table's `all` rows are the roster
//!
//! No API key required.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::RosterSource;
use crate::error::SourceError;
use crate::types::{RosterEntry, Standing};
use crate::FOTMOB_API_BASE;

#[derive(Debug, Deserialize)]
struct LeagueResponse {
    #[serde(default)]
    table: Vec<TableBlock>,
}

#[derive(Debug, Deserialize)]
struct TableBlock {
    #[serde(default)]
    data: TableData,
}

#[derive(Debug, Default, Deserialize)]
struct TableData {
    #[serde(default)]
    table: TableRows,
}

#[derive(Debug, Default, Deserialize)]
struct TableRows {
    #[serde(default)]
    all: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableRow {
    id: Option<u64>,
    #[serde(default)]
    name: String,
    idx: Option<u32>,
    played: Option<u32>,
    wins: Option<u32>,
    draws: Option<u32>,
    losses: Option<u32>,
    scores_for: Option<u32>,
    scores_against: Option<u32>,
    /// "45-18" in newer payloads
    scores_str: Option<String>,
    goal_con_diff: Option<i32>,
    pts: Option<u32>,
}

impl TableRow {
    fn into_entry(self) -> Option<RosterEntry> {
        let id = self.id?;
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return None;
        }

        let (goals_for, goals_against) = match (self.scores_for, self.scores_against) {
            (Some(f), Some(a)) => (Some(f), Some(a)),
            _ => self.scores_str.as_deref().and_then(parse_scores).unzip(),
        };

        Some(RosterEntry {
            id,
            name,
            standing: Standing {
                position: self.idx,
                played: self.played,
                won: self.wins,
                drawn: self.draws,
                lost: self.losses,
                goals_for,
                goals_against,
                goal_difference: self.goal_con_diff,
                points: self.pts,
            },
        })
    }
}

fn parse_scores(raw: &str) -> Option<(u32, u32)> {
    let (f, a) = raw.split_once('-')?;
    Some((f.trim().parse().ok()?, a.trim().parse().ok()?))
}

/// League roster REST client
#[derive(Clone)]
pub struct FotMobClient {
    client: Client,
    base_url: String,
}

impl FotMobClient {
    /// Create a client against the public API
    pub fn new() -> Result<Self> {
        Self::with_base_url(FOTMOB_API_BASE)
    }

    /// Create a client with custom base URL
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    /// GET /api/leagues?id={league_id}
    pub async fn get_league_table(&self, league_id: u32) -> Result<Vec<RosterEntry>, SourceError> {
        let url = format!("{}/api/leagues", self.base_url);
        debug!("GET {}?id={}", url, league_id);

        let response = self.client.get(&url).query(&[("id", league_id)]).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(format!("league {}", league_id)));
        }
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!("HTTP {} for {}", status, url)));
        }

        let league: LeagueResponse = response.json().await?;
        let rows = league.table.into_iter().next().map(|t| t.data.table.all).unwrap_or_default();

        let entries: Vec<RosterEntry> = rows.into_iter().filter_map(TableRow::into_entry).collect();
        debug!("League {} roster: {} teams", league_id, entries.len());
        Ok(entries)
    }
}

#[async_trait]
impl RosterSource for FotMobClient {
    async fn fetch_roster(&self, league_id: u32) -> Result<Vec<RosterEntry>, SourceError> {
        self.get_league_table(league_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_with_scores_str() {
        let row: TableRow = serde_json::from_value(json!({
            "id": 8633,
            "name": "Real Madrid",
            "idx": 2,
            "played": 15,
            "wins": 11,
            "draws": 3,
            "losses": 1,
            "scoresStr": "32-12",
            "goalConDiff": 20,
            "pts": 36
        }))
        .unwrap();

        let entry = row.into_entry().unwrap();
        assert_eq!(entry.id, 8633);
        assert_eq!(entry.standing.position, Some(2));
        assert_eq!(entry.standing.goals_for, Some(32));
        assert_eq!(entry.standing.goals_against, Some(12));
        assert_eq!(entry.standing.points, Some(36));
    }

    #[test]
    fn test_row_without_id_is_dropped() {
        let row: TableRow = serde_json::from_value(json!({"name": "Ghost FC"})).unwrap();
        assert!(row.into_entry().is_none());
    }

    #[test]
    fn test_parse_scores() {
        assert_eq!(parse_scores("45-18"), Some((45, 18)));
        assert_eq!(parse_scores("n/a"), None);
    }
}
