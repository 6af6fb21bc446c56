//! Fixture Selector - deterministic, diversified daily slate
//!
//! # Design Principles
//! 1. Same candidates, same slate: ranking is a strict total order
//! 2. Never return fewer than the minimum slate size; fail loudly instead
//! 3. Diversity first, then fill by prestige
//!
//! # Algorithm
//! 1. Rank by (priority desc, kickoff asc, home, away, match id)
//! 2. Pass 1: admit one fixture per competition until the minimum slate spans
//!    that many competitions (or `max_count` is reached)
//! 3. Pass 2: fill up to `max_count` ignoring competition, skipping admitted ids
//! 4. Fewer than the minimum after both passes is an error

mod justification;
mod policy;
mod priority;

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::SelectionError;
use crate::types::{CandidateFixture, SelectedGame, SelectedSlate};
use crate::MIN_SLATE_SIZE;

pub use justification::justify;
pub use priority::{CompetitionPriorities, DEFAULT_PRIORITY};

/// Heuristic slate selector
#[derive(Clone, Debug, Default)]
pub struct FixtureSelector {
    priorities: CompetitionPriorities,
}

impl FixtureSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom priority table
    pub fn with_priorities(priorities: CompetitionPriorities) -> Self {
        Self { priorities }
    }

    /// Select between the minimum slate size and `max_count` fixtures for the
    /// run on `date`
    pub fn select(
        &self,
        candidates: &[CandidateFixture],
        date: NaiveDate,
        max_count: usize,
    ) -> Result<SelectedSlate, SelectionError> {
        if max_count < MIN_SLATE_SIZE {
            return Err(SelectionError::InvalidMaxCount(max_count));
        }
        if candidates.len() < MIN_SLATE_SIZE {
            return Err(SelectionError::InsufficientCandidates { found: candidates.len() });
        }

        let ranked = self.rank(candidates);
        let mut picked: Vec<&CandidateFixture> = Vec::with_capacity(max_count);
        let mut ids = HashSet::new();
        let mut competitions = HashSet::new();

        // Pass 1: diversity
        for fixture in &ranked {
            if picked.len() >= max_count
                || (picked.len() >= MIN_SLATE_SIZE && competitions.len() >= MIN_SLATE_SIZE)
            {
                break;
            }
            if ids.contains(&fixture.match_id) || competitions.contains(fixture.competition_name.as_str()) {
                continue;
            }
            ids.insert(fixture.match_id);
            competitions.insert(fixture.competition_name.as_str());
            picked.push(fixture);
        }
        debug!("Diversity pass picked {} across {} competitions", picked.len(), competitions.len());

        // Pass 2: fill
        for fixture in &ranked {
            if picked.len() >= max_count {
                break;
            }
            if ids.insert(fixture.match_id) {
                picked.push(fixture);
            }
        }

        if picked.len() < MIN_SLATE_SIZE {
            return Err(SelectionError::InsufficientSlate { selected: picked.len() });
        }

        let games: Vec<SelectedGame> = picked.iter().map(|f| to_game(f)).collect();
        info!("Selected {} of {} candidates for {}", games.len(), candidates.len(), date);

        Ok(SelectedSlate {
            selection_reasoning: format!(
                "Deterministic selection: prioritized high-prestige competitions and aimed for league \
                 diversity to produce a balanced daily slate. Selected {} matches for {} (max_games={}).",
                games.len(),
                date,
                max_count
            ),
            games,
        })
    }

    fn rank<'a>(&self, candidates: &'a [CandidateFixture]) -> Vec<&'a CandidateFixture> {
        let mut ranked: Vec<(u32, &CandidateFixture)> = candidates
            .iter()
            .map(|f| (self.priorities.weight(f.competition_code.as_deref(), &f.competition_name), f))
            .collect();

        ranked.sort_by(|(pa, a), (pb, b)| {
            (Reverse(*pa), a.kickoff, &a.home_team, &a.away_team, a.match_id).cmp(&(
                Reverse(*pb),
                b.kickoff,
                &b.home_team,
                &b.away_team,
                b.match_id,
            ))
        });

        ranked.into_iter().map(|(_, f)| f).collect()
    }
}

fn to_game(fixture: &CandidateFixture) -> SelectedGame {
    SelectedGame {
        home_team: fixture.home_team.clone(),
        away_team: fixture.away_team.clone(),
        match_date: fixture.match_date(),
        kickoff_time: fixture.kickoff_time(),
        league: fixture.competition_name.clone(),
        venue: fixture.venue.clone(),
        justification: justify(fixture),
    }
}
