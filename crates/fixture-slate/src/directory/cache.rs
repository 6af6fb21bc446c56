//! Per-league roster cache with TTL and single-flight refresh
//!
//! # Concurrency
//! - Fresh reads take only a read lock on the slot map and the slot entry.
//! - A stale or missing league is refreshed under that league's async mutex.
//!   Callers that queued behind an in-flight attempt reuse its outcome
//!   (success or failure) instead of fetching again.
//! - Failed refreshes keep serving the previous roster if there is one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::normalize::normalize_team_name;
use super::League;
use crate::providers::RosterSource;
use crate::types::{RosterEntry, TeamIdentity};

#[derive(Clone, Debug)]
struct RosterTeam {
    normalized: String,
    identity: TeamIdentity,
}

/// One league's teams, in the order the source listed them
#[derive(Clone, Debug)]
pub struct LeagueRoster {
    pub league_id: u32,
    pub league_name: String,
    teams: Vec<RosterTeam>,
}

impl LeagueRoster {
    pub(crate) fn empty(league: &League) -> Self {
        Self { league_id: league.id, league_name: league.name.clone(), teams: Vec::new() }
    }

    pub(crate) fn from_entries(league: &League, entries: Vec<RosterEntry>) -> Self {
        let teams = entries
            .into_iter()
            .map(|entry| RosterTeam {
                normalized: normalize_team_name(&entry.name),
                identity: TeamIdentity {
                    id: entry.id,
                    name: entry.name,
                    league_id: league.id,
                    league_name: league.name.clone(),
                    standing: entry.standing,
                },
            })
            .collect();

        Self { league_id: league.id, league_name: league.name.clone(), teams }
    }

    /// Exact normalized match first, then containment in either direction
    pub fn find(&self, normalized: &str) -> Option<&TeamIdentity> {
        if normalized.is_empty() {
            return None;
        }

        self.teams
            .iter()
            .find(|t| t.normalized == normalized)
            .or_else(|| {
                self.teams.iter().find(|t| {
                    !t.normalized.is_empty()
                        && (t.normalized.contains(normalized) || normalized.contains(&t.normalized))
                })
            })
            .map(|t| &t.identity)
    }

    pub fn by_id(&self, team_id: u64) -> Option<&TeamIdentity> {
        self.teams.iter().map(|t| &t.identity).find(|identity| identity.id == team_id)
    }

    pub fn teams(&self) -> impl Iterator<Item = &TeamIdentity> {
        self.teams.iter().map(|t| &t.identity)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[derive(Clone)]
struct CachedRoster {
    roster: Arc<LeagueRoster>,
    fetched_at: Instant,
}

#[derive(Default)]
struct Slot {
    entry: RwLock<Option<CachedRoster>>,
    refresh: Mutex<()>,
    attempts: AtomicU64,
}

impl Slot {
    fn current(&self) -> Option<CachedRoster> {
        self.entry.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn fresh(&self, ttl: Duration) -> Option<Arc<LeagueRoster>> {
        self.current().filter(|c| c.fetched_at.elapsed() < ttl).map(|c| c.roster)
    }

    fn store(&self, roster: Arc<LeagueRoster>) {
        *self.entry.write().unwrap_or_else(|e| e.into_inner()) =
            Some(CachedRoster { roster, fetched_at: Instant::now() });
    }
}

/// League id -> roster, valid for `ttl`
pub struct RosterCache {
    ttl: Duration,
    slots: RwLock<HashMap<u32, Arc<Slot>>>,
}

impl RosterCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slots: RwLock::new(HashMap::new()) }
    }

    fn slot(&self, league_id: u32) -> Arc<Slot> {
        if let Some(slot) = self.slots.read().unwrap_or_else(|e| e.into_inner()).get(&league_id) {
            return slot.clone();
        }
        self.slots
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(league_id)
            .or_default()
            .clone()
    }

    /// Roster for `league`, refreshing it from `source` if missing or stale
    pub async fn get<S>(&self, league: &League, source: &S) -> Arc<LeagueRoster>
    where
        S: RosterSource + ?Sized,
    {
        let slot = self.slot(league.id);
        let seen = slot.attempts.load(Ordering::SeqCst);

        if let Some(roster) = slot.fresh(self.ttl) {
            return roster;
        }

        let _guard = slot.refresh.lock().await;

        if slot.attempts.load(Ordering::SeqCst) != seen {
            debug!("League {} refreshed by a concurrent caller", league.id);
            return slot
                .current()
                .map(|c| c.roster)
                .unwrap_or_else(|| Arc::new(LeagueRoster::empty(league)));
        }
        if let Some(roster) = slot.fresh(self.ttl) {
            return roster;
        }

        let previous = slot.current();
        let outcome = source.fetch_roster(league.id).await;
        slot.attempts.fetch_add(1, Ordering::SeqCst);

        match outcome {
            Ok(entries) => {
                let roster = Arc::new(LeagueRoster::from_entries(league, entries));
                info!("Loaded {} roster: {} teams", league.name, roster.len());
                slot.store(roster.clone());
                roster
            }
            Err(e) => match previous {
                Some(stale) => {
                    warn!("Failed to refresh league {} ({}), serving stale roster: {}", league.id, league.name, e);
                    stale.roster
                }
                None => {
                    warn!("Failed to load league {} ({}): {}", league.id, league.name, e);
                    Arc::new(LeagueRoster::empty(league))
                }
            },
        }
    }

    /// Drop every cached roster
    pub fn clear(&self) {
        self.slots.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Standing;

    fn league() -> League {
        League::new(87, "La Liga")
    }

    fn entry(id: u64, name: &str) -> RosterEntry {
        RosterEntry { id, name: name.to_string(), standing: Standing::default() }
    }

    #[test]
    fn test_find_prefers_exact_over_containment() {
        let roster = LeagueRoster::from_entries(
            &league(),
            vec![entry(1, "Real Madrid Castilla"), entry(2, "Real Madrid")],
        );
        assert_eq!(roster.find("real madrid").map(|t| t.id), Some(2));
    }

    #[test]
    fn test_find_containment_either_direction() {
        let roster = LeagueRoster::from_entries(&league(), vec![entry(1, "Atlético Madrid")]);
        assert_eq!(roster.find("atletico").map(|t| t.id), Some(1));
        assert_eq!(roster.find("club atletico madrid").map(|t| t.id), Some(1));
        assert!(roster.find("").is_none());
        assert!(roster.find("sevilla").is_none());
    }

    #[test]
    fn test_identity_carries_league() {
        let roster = LeagueRoster::from_entries(&league(), vec![entry(8633, "Real Madrid")]);
        let team = roster.by_id(8633).unwrap();
        assert_eq!(team.league_id, 87);
        assert_eq!(team.league_name, "La Liga");
    }
}
