//! Team directory: free-text team name -> canonical identity
//!
//! # Algorithm
//! 1. Normalize the name (lowercase, club tokens, accents)
//! 2. Name cache hit: re-read the team from its league roster (refreshing the roster if stale)
//! 3. Otherwise walk leagues in priority order; in each, exact match then containment
//! 4. First match wins; nothing found (or every source failing) is `None`
//!
//! Short or ambiguous names ("United") resolve to whatever the first league in
//! priority order contains; there is no further disambiguation.

mod cache;
mod normalize;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::providers::{RosterSource, WithTimeout};
use crate::types::TeamIdentity;

pub use cache::{LeagueRoster, RosterCache};
pub use normalize::normalize_team_name;

/// A league the directory searches
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub id: u32,
    pub name: String,
}

impl League {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// Major European leagues in search priority order (FotMob ids)
pub fn default_leagues() -> Vec<League> {
    vec![
        League::new(47, "Premier League"),
        League::new(87, "La Liga"),
        League::new(55, "Serie A"),
        League::new(54, "Bundesliga"),
        League::new(53, "Ligue 1"),
        League::new(42, "Champions League"),
        League::new(73, "Europa League"),
        League::new(57, "Eredivisie"),
        League::new(61, "Primeira Liga"),
    ]
}

/// Team directory configuration
#[derive(Clone, Debug)]
pub struct DirectoryConfig {
    /// How long a league roster stays valid
    pub ttl: Duration,
    /// Per roster fetch time budget
    pub call_timeout: Duration,
    /// Leagues searched, first match wins
    pub leagues: Vec<League>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            call_timeout: Duration::from_secs(10),
            leagues: default_leagues(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct NameHit {
    team_id: u64,
    league_id: u32,
}

/// Shared, concurrency-safe team name resolver
pub struct TeamDirectory {
    source: WithTimeout<Arc<dyn RosterSource>>,
    leagues: Vec<League>,
    rosters: RosterCache,
    names: RwLock<HashMap<String, NameHit>>,
}

impl TeamDirectory {
    pub fn new(source: Arc<dyn RosterSource>) -> Self {
        Self::with_config(source, DirectoryConfig::default())
    }

    pub fn with_config(source: Arc<dyn RosterSource>, config: DirectoryConfig) -> Self {
        Self {
            source: WithTimeout::new(source, config.call_timeout),
            leagues: config.leagues,
            rosters: RosterCache::new(config.ttl),
            names: RwLock::new(HashMap::new()),
        }
    }

    pub fn leagues(&self) -> &[League] {
        &self.leagues
    }

    /// Resolve a free-text team name. Upstream failures degrade to `None`.
    pub async fn resolve(&self, name: &str) -> Option<TeamIdentity> {
        let key = normalize_team_name(name);
        if key.is_empty() {
            debug!("Blank team name {:?}", name);
            return None;
        }

        if let Some(hit) = self.cached_name(&key) {
            if let Some(team) = self.reread(hit).await {
                return Some(team);
            }
            debug!("Cached team for {:?} no longer in league {}, rescanning", key, hit.league_id);
            self.forget(&key);
        }

        for league in &self.leagues {
            let roster = self.rosters.get(league, &self.source).await;
            if let Some(team) = roster.find(&key) {
                info!("Resolved {:?} -> {} ({}, id={})", name, team.name, league.name, team.id);
                self.remember(key, NameHit { team_id: team.id, league_id: league.id });
                return Some(team.clone());
            }
        }

        debug!("Team {:?} not found in {} leagues", name, self.leagues.len());
        None
    }

    /// League table ordered by position; teams without a position last
    pub async fn standings(&self, league_id: u32) -> Vec<TeamIdentity> {
        let Some(league) = self.leagues.iter().find(|l| l.id == league_id) else {
            debug!("League {} is not configured", league_id);
            return Vec::new();
        };

        let roster = self.rosters.get(league, &self.source).await;
        let mut teams: Vec<TeamIdentity> = roster.teams().cloned().collect();
        teams.sort_by_key(|t| t.standing.position.unwrap_or(u32::MAX));
        teams
    }

    /// Forget every cached roster and name
    pub fn invalidate(&self) {
        self.rosters.clear();
        self.names.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    async fn reread(&self, hit: NameHit) -> Option<TeamIdentity> {
        let league = self.leagues.iter().find(|l| l.id == hit.league_id)?;
        let roster = self.rosters.get(league, &self.source).await;
        roster.by_id(hit.team_id).cloned()
    }

    fn cached_name(&self, key: &str) -> Option<NameHit> {
        self.names.read().unwrap_or_else(|e| e.into_inner()).get(key).copied()
    }

    fn remember(&self, key: String, hit: NameHit) {
        self.names.write().unwrap_or_else(|e| e.into_inner()).insert(key, hit);
    }

    fn forget(&self, key: &str) {
        self.names.write().unwrap_or_else(|e| e.into_inner()).remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::types::{RosterEntry, Standing};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves fixed rosters, counting calls per league
    #[derive(Default)]
    struct FakeRosters {
        rosters: Mutex<HashMap<u32, Vec<RosterEntry>>>,
        calls: Mutex<HashMap<u32, usize>>,
        total: AtomicUsize,
        failing: AtomicBool,
        delay: Option<Duration>,
    }

    impl FakeRosters {
        fn with(mut self, league_id: u32, teams: &[(u64, &str, u32)]) -> Self {
            let entries = teams
                .iter()
                .map(|(id, name, points)| RosterEntry {
                    id: *id,
                    name: name.to_string(),
                    standing: Standing { points: Some(*points), ..Standing::default() },
                })
                .collect();
            self.rosters.get_mut().unwrap().insert(league_id, entries);
            self
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self, league_id: u32) -> usize {
            self.calls.lock().unwrap().get(&league_id).copied().unwrap_or(0)
        }

        fn set_points(&self, league_id: u32, team_id: u64, points: u32) {
            let mut rosters = self.rosters.lock().unwrap();
            for entry in rosters.get_mut(&league_id).unwrap() {
                if entry.id == team_id {
                    entry.standing.points = Some(points);
                }
            }
        }
    }

    #[async_trait]
    impl RosterSource for FakeRosters {
        async fn fetch_roster(&self, league_id: u32) -> Result<Vec<RosterEntry>, SourceError> {
            *self.calls.lock().unwrap().entry(league_id).or_default() += 1;
            self.total.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(SourceError::Unavailable("roster feed down".into()));
            }
            Ok(self.rosters.lock().unwrap().get(&league_id).cloned().unwrap_or_default())
        }
    }

    fn config() -> DirectoryConfig {
        DirectoryConfig {
            ttl: Duration::from_secs(60 * 60),
            call_timeout: Duration::from_secs(10),
            leagues: vec![League::new(47, "Premier League"), League::new(87, "La Liga")],
        }
    }

    fn fake() -> FakeRosters {
        FakeRosters::default()
            .with(47, &[(10, "Manchester United", 20), (11, "Chelsea", 25)])
            .with(87, &[(8634, "Barcelona", 34), (8633, "Real Madrid", 36)])
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefixed_and_plain_names_resolve_to_same_identity() {
        let source = Arc::new(fake());
        let directory = TeamDirectory::with_config(source.clone(), config());

        let a = directory.resolve("FC Barcelona").await.unwrap();
        let b = directory.resolve("barcelona").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.id, 8634);
        assert_eq!(a.league_name, "La Liga");
    }

    #[tokio::test(start_paused = true)]
    async fn test_leagues_scanned_in_priority_order_and_cached() {
        let source = Arc::new(fake());
        let directory = TeamDirectory::with_config(source.clone(), config());

        assert_eq!(directory.resolve("Real Madrid CF").await.unwrap().id, 8633);
        assert_eq!(source.calls(47), 1);
        assert_eq!(source.calls(87), 1);

        // Name cache and fresh rosters: no more upstream calls
        directory.resolve("real madrid").await.unwrap();
        directory.resolve("Chelsea FC").await.unwrap();
        assert_eq!(source.total.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_containment_match_wins() {
        let source = Arc::new(fake());
        let directory = TeamDirectory::with_config(source, config());

        // "united" is contained in the first league's "manchester united"
        assert_eq!(directory.resolve("United").await.unwrap().id, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_and_blank_names() {
        let source = Arc::new(fake());
        let directory = TeamDirectory::with_config(source.clone(), config());

        assert!(directory.resolve("Sporting Lisbon").await.is_none());
        assert!(directory.resolve("   ").await.is_none());
        assert_eq!(source.total.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_triggers_exactly_one_refetch() {
        let ttl = Duration::from_secs(60 * 60);
        let source = Arc::new(fake());
        let directory = TeamDirectory::with_config(source.clone(), config());

        let first = directory.resolve("Chelsea").await.unwrap();
        assert_eq!(first.standing.points, Some(25));
        assert_eq!(source.calls(47), 1);

        // Within TTL: served from cache
        tokio::time::advance(ttl / 2).await;
        directory.resolve("Chelsea").await.unwrap();
        directory.resolve("chelsea fc").await.unwrap();
        assert_eq!(source.calls(47), 1);

        source.set_points(47, 11, 28);
        tokio::time::advance(ttl / 2 + Duration::from_secs(1)).await;

        let refreshed = directory.resolve("Chelsea").await.unwrap();
        directory.resolve("Chelsea").await.unwrap();
        directory.resolve("Chelsea FC").await.unwrap();

        assert_eq!(source.calls(47), 2);
        assert_eq!(source.calls(87), 0);
        assert_eq!(refreshed.standing.points, Some(28));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_are_single_flighted() {
        let source = Arc::new(fake().delayed(Duration::from_millis(200)));
        let directory = Arc::new(TeamDirectory::with_config(source.clone(), config()));

        let lookups = (0..8).map(|i| {
            let directory = directory.clone();
            let name = if i % 2 == 0 { "Chelsea" } else { "Manchester United" };
            async move { directory.resolve(name).await }
        });
        let results = futures::future::join_all(lookups).await;

        assert!(results.iter().all(|r| r.is_some()));
        assert_eq!(source.calls(47), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_failures_are_coalesced() {
        let source = Arc::new(fake().delayed(Duration::from_millis(200)));
        source.failing.store(true, Ordering::SeqCst);
        let directory = Arc::new(TeamDirectory::with_config(source.clone(), config()));

        let lookups = (0..6).map(|_| {
            let directory = directory.clone();
            async move { directory.resolve("Chelsea").await }
        });
        let results = futures::future::join_all(lookups).await;

        assert!(results.iter().all(|r| r.is_none()));
        assert_eq!(source.calls(47), 1);
        assert_eq!(source.calls(87), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_serves_stale_roster() {
        let ttl = Duration::from_secs(60 * 60);
        let source = Arc::new(fake());
        let directory = TeamDirectory::with_config(source.clone(), config());

        directory.resolve("Chelsea").await.unwrap();
        source.failing.store(true, Ordering::SeqCst);
        tokio::time::advance(ttl + Duration::from_secs(1)).await;

        let stale = directory.resolve("Chelsea").await.unwrap();
        assert_eq!(stale.standing.points, Some(25));
        assert_eq!(source.calls(47), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_degrades_to_not_found() {
        let source = Arc::new(fake().delayed(Duration::from_secs(30)));
        let directory = TeamDirectory::with_config(source, config());

        assert!(directory.resolve("Chelsea").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_standings_sorted_by_position() {
        let source = Arc::new(FakeRosters::default());
        source.rosters.lock().unwrap().insert(
            47,
            vec![
                RosterEntry {
                    id: 1,
                    name: "Third".into(),
                    standing: Standing { position: Some(3), ..Standing::default() },
                },
                RosterEntry { id: 2, name: "Unranked".into(), standing: Standing::default() },
                RosterEntry {
                    id: 3,
                    name: "First".into(),
                    standing: Standing { position: Some(1), ..Standing::default() },
                },
            ],
        );
        let directory = TeamDirectory::with_config(source, config());

        let ids: Vec<u64> = directory.standings(47).await.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert!(directory.standings(999).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_reload() {
        let source = Arc::new(fake());
        let directory = TeamDirectory::with_config(source.clone(), config());

        directory.resolve("Chelsea").await.unwrap();
        directory.invalidate();
        directory.resolve("Chelsea").await.unwrap();
        assert_eq!(source.calls(47), 2);
    }
}
