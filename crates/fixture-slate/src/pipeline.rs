//! Daily Pipeline - candidates -> slate -> odds-filtered slate
//!
//! # State Machine
//! CandidatesFetched -> Selected (heuristic selector, or a validated external policy)
//! Selected -> OddsFiltered (threshold filter with a retained-games cap)
//!
//! No backward transitions and no automatic retries. A failed fixture fetch or
//! an unusable slate ends the run with a [`SlateError`] carrying the date.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::error::{SelectionError, SlateError};
use crate::odds::filter_by_odds;
use crate::providers::{FixtureSource, QuoteSource, SelectionPolicy, WithTimeout};
use crate::selector::FixtureSelector;
use crate::types::{FilteredSlate, SelectedSlate};
use crate::MIN_SLATE_SIZE;

// ============================================================================
// Phases
// ============================================================================

/// Stage a daily run has reached
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    CandidatesFetched,
    Selected,
    OddsFiltered,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid phase transition {from} -> {to}")]
pub struct PhaseError {
    pub from: Phase,
    pub to: Phase,
}

impl Phase {
    /// The only phase reachable from this one
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::CandidatesFetched => Some(Phase::Selected),
            Phase::Selected => Some(Phase::OddsFiltered),
            Phase::OddsFiltered => None,
        }
    }

    /// Move to `to`; anything but the immediate next phase is rejected
    pub fn advance(self, to: Phase) -> Result<Phase, PhaseError> {
        if self.next() == Some(to) {
            Ok(to)
        } else {
            Err(PhaseError { from: self, to })
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::CandidatesFetched => "candidates_fetched",
            Phase::Selected => "selected",
            Phase::OddsFiltered => "odds_filtered",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Daily run configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Upper bound on the selected slate
    pub max_games: usize,
    /// Minimum best-leg decimal odds for a game to survive filtering
    pub min_odds: f64,
    /// Upper bound on the filtered slate; `<= 0` disables quoting
    pub max_daily_games: i64,
    /// Per upstream call time budget
    pub call_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_games: 8,
            min_odds: 2.0,
            max_daily_games: 5,
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of one daily run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineReport {
    pub date: NaiveDate,
    pub phase: Phase,
    pub slate: SelectedSlate,
    pub filtered: FilteredSlate,
    /// Slate positions of the games in `filtered`
    pub original_indexes: Vec<usize>,
}

// ============================================================================
// Entry points
// ============================================================================

/// Fetch the day's fixtures and pick a slate
///
/// With a policy, its output is validated and used; if the policy itself
/// cannot be reached the heuristic selector runs instead. Every call to
/// `fixtures` and `policy` is bounded by `call_timeout`.
pub async fn select_daily_slate<F>(
    date: NaiveDate,
    max_games: usize,
    fixtures: &F,
    policy: Option<&dyn SelectionPolicy>,
    call_timeout: Duration,
) -> Result<SelectedSlate, SlateError>
where
    F: FixtureSource + ?Sized,
{
    select_with(&FixtureSelector::default(), date, max_games, fixtures, policy, call_timeout).await
}

/// Filter a slate by odds with every quote call bounded by `call_timeout`,
/// see [`filter_by_odds`]
pub async fn filter_slate_by_odds<Q>(
    slate: &SelectedSlate,
    quotes: &Q,
    min_threshold: f64,
    max_count: i64,
    call_timeout: Duration,
) -> (FilteredSlate, Vec<usize>)
where
    Q: QuoteSource + ?Sized,
{
    let quotes = WithTimeout::new(quotes, call_timeout);
    filter_by_odds(slate, &quotes, min_threshold, max_count).await
}

async fn select_with<F>(
    selector: &FixtureSelector,
    date: NaiveDate,
    max_games: usize,
    fixtures: &F,
    policy: Option<&dyn SelectionPolicy>,
    call_timeout: Duration,
) -> Result<SelectedSlate, SlateError>
where
    F: FixtureSource + ?Sized,
{
    let fail = |e: SelectionError| {
        error!("Slate selection for {} failed: {}", date, e);
        SlateError::new(date, e)
    };

    if max_games < MIN_SLATE_SIZE {
        return Err(fail(SelectionError::InvalidMaxCount(max_games)));
    }

    let fixtures = WithTimeout::new(fixtures, call_timeout);
    let candidates = fixtures.fetch_fixtures(date).await.map_err(|e| fail(e.into()))?;
    info!("Fetched {} candidate fixtures for {}", candidates.len(), date);
    if candidates.len() < MIN_SLATE_SIZE {
        return Err(fail(SelectionError::InsufficientCandidates { found: candidates.len() }));
    }

    if let Some(policy) = policy {
        let policy = WithTimeout::new(policy, call_timeout);
        match policy.select(&candidates, date, max_games).await {
            Ok(result) => {
                let slate = SelectedSlate::from_policy(result, max_games).map_err(fail)?;
                info!("Selection policy picked {} games for {}", slate.len(), date);
                return Ok(slate);
            }
            Err(e) => warn!("Selection policy unavailable ({}), using heuristic selector", e),
        }
    }

    selector.select(&candidates, date, max_games).map_err(fail)
}

// ============================================================================
// Pipeline
// ============================================================================

/// Owns the collaborators for repeated daily runs
pub struct DailyPipeline {
    fixtures: Arc<dyn FixtureSource>,
    quotes: Arc<dyn QuoteSource>,
    policy: Option<Arc<dyn SelectionPolicy>>,
    selector: FixtureSelector,
    config: PipelineConfig,
}

impl DailyPipeline {
    pub fn new(
        fixtures: Arc<dyn FixtureSource>,
        quotes: Arc<dyn QuoteSource>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            fixtures,
            quotes,
            policy: None,
            selector: FixtureSelector::default(),
            config,
        }
    }

    /// Prefer an external policy over the heuristic selector
    pub fn with_policy(mut self, policy: Arc<dyn SelectionPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_selector(mut self, selector: FixtureSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Selection stage only
    pub async fn select(&self, date: NaiveDate) -> Result<SelectedSlate, SlateError> {
        select_with(
            &self.selector,
            date,
            self.config.max_games,
            &*self.fixtures,
            self.policy.as_deref(),
            self.config.call_timeout,
        )
        .await
    }

    /// Full run for `date`
    pub async fn run(&self, date: NaiveDate) -> Result<PipelineReport, SlateError> {
        info!("=== Daily run for {} ===", date);
        let mut phase = Phase::CandidatesFetched;

        let slate = self.select(date).await?;
        transition(&mut phase, Phase::Selected).map_err(|e| SlateError::new(date, e.into()))?;

        let (filtered, original_indexes) = filter_slate_by_odds(
            &slate,
            &*self.quotes,
            self.config.min_odds,
            self.config.max_daily_games,
            self.config.call_timeout,
        )
        .await;
        transition(&mut phase, Phase::OddsFiltered).map_err(|e| SlateError::new(date, e.into()))?;

        info!(
            "Run for {} complete: {} selected, {} after odds filter",
            date,
            slate.len(),
            filtered.len()
        );

        Ok(PipelineReport { date, phase, slate, filtered, original_indexes })
    }
}

fn transition(phase: &mut Phase, to: Phase) -> Result<(), PhaseError> {
    let next = phase.advance(to)?;
    debug!("Phase {} -> {}", phase, next);
    *phase = next;
    Ok(())
}
