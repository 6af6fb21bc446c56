//! Validation boundary for external selection policies
//!
//! Whatever a [`SelectionPolicy`](crate::providers::SelectionPolicy) returns,
//! typed or raw JSON, becomes a [`SelectedSlate`] only through
//! [`SelectedSlate::from_policy`].

use std::collections::HashSet;

use tracing::warn;

use crate::error::SelectionError;
use crate::types::{PolicyResult, SelectedSlate};
use crate::MIN_SLATE_SIZE;

impl SelectedSlate {
    /// Validate policy output and cap it at `max_count` games
    pub fn from_policy(result: PolicyResult, max_count: usize) -> Result<Self, SelectionError> {
        if max_count < MIN_SLATE_SIZE {
            return Err(SelectionError::InvalidMaxCount(max_count));
        }

        let mut slate = match result {
            PolicyResult::Structured(slate) => slate,
            PolicyResult::Raw(value) => serde_json::from_value(value)
                .map_err(|e| SelectionError::Validation(format!("malformed slate: {}", e)))?,
        };

        let mut seen = HashSet::new();
        for (i, game) in slate.games.iter().enumerate() {
            if game.home_team.trim().is_empty() || game.away_team.trim().is_empty() {
                return Err(SelectionError::Validation(format!("game {} has a blank team name", i)));
            }
            if game.league.trim().is_empty() {
                return Err(SelectionError::Validation(format!("game {} has a blank league", i)));
            }
            let key = (game.home_team.trim().to_lowercase(), game.away_team.trim().to_lowercase(), game.match_date);
            if !seen.insert(key) {
                return Err(SelectionError::Validation(format!(
                    "duplicate game {} vs {} on {}",
                    game.home_team, game.away_team, game.match_date
                )));
            }
        }

        if slate.games.len() < MIN_SLATE_SIZE {
            return Err(SelectionError::Validation(format!(
                "policy returned {} games, need at least {}",
                slate.games.len(),
                MIN_SLATE_SIZE
            )));
        }

        if slate.games.len() > max_count {
            warn!("Policy returned {} games, keeping the first {}", slate.games.len(), max_count);
            slate.games.truncate(max_count);
        }

        Ok(slate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn raw_game(home: &str, away: &str) -> Value {
        json!({
            "home_team": home,
            "away_team": away,
            "match_date": "2025-12-14",
            "kickoff_time": "16:30",
            "league": "Premier League",
            "venue": null,
            "justification": "Big game"
        })
    }

    fn raw_slate(games: Vec<Value>) -> PolicyResult {
        PolicyResult::Raw(json!({ "games": games, "selection_reasoning": "model pick" }))
    }

    #[test]
    fn test_raw_output_accepted() {
        let result = raw_slate(vec![raw_game("A", "B"), raw_game("C", "D"), raw_game("E", "F")]);
        let slate = SelectedSlate::from_policy(result, 5).unwrap();
        assert_eq!(slate.len(), 3);
        assert_eq!(slate.games[0].kickoff_time.to_string(), "16:30:00");
    }

    #[test]
    fn test_too_few_games_rejected() {
        let result = raw_slate(vec![raw_game("A", "B"), raw_game("C", "D")]);
        assert!(matches!(SelectedSlate::from_policy(result, 5), Err(SelectionError::Validation(_))));
    }

    #[test]
    fn test_duplicates_rejected() {
        let result = raw_slate(vec![raw_game("A", "B"), raw_game("C", "D"), raw_game("a", "b ")]);
        assert!(matches!(SelectedSlate::from_policy(result, 5), Err(SelectionError::Validation(_))));
    }

    #[test]
    fn test_bad_schema_rejected() {
        let mut bad = raw_game("C", "D");
        bad["kickoff_time"] = json!("4:30 PM");
        let result = raw_slate(vec![raw_game("A", "B"), bad, raw_game("E", "F")]);
        assert!(matches!(SelectedSlate::from_policy(result, 5), Err(SelectionError::Validation(_))));

        let result = raw_slate(vec![raw_game("A", "B"), raw_game("", "D"), raw_game("E", "F")]);
        assert!(matches!(SelectedSlate::from_policy(result, 5), Err(SelectionError::Validation(_))));
    }

    #[test]
    fn test_over_long_output_truncated() {
        let games = (0..6).map(|i| raw_game(&format!("H{}", i), &format!("A{}", i))).collect();
        let slate = SelectedSlate::from_policy(raw_slate(games), 4).unwrap();
        assert_eq!(slate.len(), 4);
        assert_eq!(slate.games[3].home_team, "H3");
    }

    #[test]
    fn test_structured_output_validated_too() {
        let PolicyResult::Raw(value) = raw_slate(vec![raw_game("A", "B"), raw_game("C", "D")]) else {
            unreachable!()
        };
        let slate: SelectedSlate = serde_json::from_value(value).unwrap();
        let result = PolicyResult::Structured(slate);
        assert!(SelectedSlate::from_policy(result, 5).is_err());
    }
}
