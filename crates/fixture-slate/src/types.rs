//! Shared data model for the slate pipeline
//!
//! # Design Principles
//! 1. Collaborator output is parsed into typed values at the boundary, never passed around raw
//! 2. A quote is either a complete odds triple or an error; there are no partial legs
//! 3. Slates are ordered and never mutated after they are built
//! 4. Dates serialize as `YYYY-MM-DD`, kickoff times as 24h `HH:MM`

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

// ============================================================================
// Candidate Fixtures
// ============================================================================

/// One match from the raw schedule feed, before any scoring
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFixture {
    /// Upstream match identifier
    pub match_id: u64,
    pub home_team: String,
    pub away_team: String,
    /// Kickoff in UTC
    pub kickoff: DateTime<Utc>,
    pub competition_name: String,
    /// Short competition code (e.g. "PL", "CL") when the feed provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}

impl CandidateFixture {
    /// Match date in UTC
    pub fn match_date(&self) -> NaiveDate {
        self.kickoff.date_naive()
    }

    /// Kickoff time in UTC, truncated to the minute
    pub fn kickoff_time(&self) -> NaiveTime {
        let time = self.kickoff.time();
        NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
    }
}

// ============================================================================
// Team Identities
// ============================================================================

/// League table snapshot for one team
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub position: Option<u32>,
    pub played: Option<u32>,
    pub won: Option<u32>,
    pub drawn: Option<u32>,
    pub lost: Option<u32>,
    pub goals_for: Option<u32>,
    pub goals_against: Option<u32>,
    pub goal_difference: Option<i32>,
    pub points: Option<u32>,
}

/// One row of a league roster as reported by a roster source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub standing: Standing,
}

/// Canonical identity a free-text team name resolves to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamIdentity {
    pub id: u64,
    pub name: String,
    pub league_id: u32,
    pub league_name: String,
    pub standing: Standing,
}

// ============================================================================
// Selected Slate
// ============================================================================

/// A game chosen for the day's analysis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedGame {
    /// Home team name as it appears in the fixtures feed
    pub home_team: String,
    /// Away team name as it appears in the fixtures feed
    pub away_team: String,
    /// `YYYY-MM-DD`
    pub match_date: NaiveDate,
    /// `HH:MM`, 24-hour
    #[serde(with = "hhmm")]
    pub kickoff_time: NaiveTime,
    /// League / competition name
    pub league: String,
    #[serde(default)]
    pub venue: Option<String>,
    /// Why this game is worth analysing
    pub justification: String,
}

/// The finalized, ordered set of games for one day
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedSlate {
    pub games: Vec<SelectedGame>,
    /// Overall reasoning behind the selection as a whole
    pub selection_reasoning: String,
}

impl SelectedSlate {
    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

/// Output of an external selection policy
///
/// Both variants are validated by [`SelectedSlate::from_policy`] before use.
#[derive(Clone, Debug)]
pub enum PolicyResult {
    /// Already typed output
    Structured(SelectedSlate),
    /// Untyped mapping, e.g. JSON produced by a model
    Raw(serde_json::Value),
}

// ============================================================================
// Odds
// ============================================================================

/// Decimal odds for the three outcomes of a match
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OddsTriple {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OddsTriple {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    /// Reject the whole triple if any leg is non-finite or <= 1.0
    pub fn validated(self) -> Result<Self, SourceError> {
        for (leg, value) in [("home", self.home), ("draw", self.draw), ("away", self.away)] {
            if !value.is_finite() || value <= 1.0 {
                return Err(SourceError::IncompleteData(format!(
                    "invalid decimal odds for {} leg: {}",
                    leg, value
                )));
            }
        }
        Ok(self)
    }

    /// Highest payout among the three legs
    pub fn max_leg(&self) -> f64 {
        self.home.max(self.draw).max(self.away)
    }
}

/// A successfully fetched quote for one fixture
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OddsQuote {
    pub home_team: String,
    pub away_team: String,
    /// Upstream event identifier, if the provider has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
    /// Upstream commence time (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commence_time: Option<String>,
    pub odds: OddsTriple,
    pub bookmaker: String,
}

// ============================================================================
// Filtered Slate
// ============================================================================

/// A slate entry that passed the odds filter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilteredGame {
    /// Position of this game in the unfiltered slate
    pub index: usize,
    #[serde(flatten)]
    pub game: SelectedGame,
    pub odds: OddsTriple,
    pub bookmaker: String,
}

impl FilteredGame {
    /// Toto notation: n1 = home win, n2 = away win, n3 = draw
    pub fn toto(&self) -> (f64, f64, f64) {
        (self.odds.home, self.odds.away, self.odds.draw)
    }
}

/// Why a slate entry was dropped by the odds filter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Quote source failed or had no quote
    FetchFailed { message: String },
    /// Quote arrived with a missing or invalid leg
    InvalidOdds { message: String },
    /// Best leg below the configured minimum
    BelowThreshold { max_odds: f64 },
}

/// Audit record of a dropped slate entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkippedGame {
    pub index: usize,
    pub reason: SkipReason,
}

/// Order-preserving subset of a [`SelectedSlate`] with quotes attached
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredSlate {
    pub games: Vec<FilteredGame>,
    #[serde(default)]
    pub skipped: Vec<SkippedGame>,
}

impl FilteredSlate {
    /// Original slate indexes of retained games, strictly increasing
    pub fn indexes(&self) -> Vec<usize> {
        self.games.iter().map(|g| g.index).collect()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

// ============================================================================
// Serde helpers
// ============================================================================

/// `HH:MM` (24h) representation for kickoff times
mod hhmm {
    use chrono::NaiveTime;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT)
            .map_err(|e| D::Error::custom(format!("invalid kickoff time '{}': {}", raw, e)))
    }
}
