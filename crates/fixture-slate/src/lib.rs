//! Daily Fixture Slate
//!
//! Builds a day's slate of football fixtures for downstream analysis:
//! - `directory`: free-text team name -> canonical identity, per-league TTL cache
//! - `selector`: deterministic, diversified slate of at least three fixtures
//! - `odds`: order-preserving minimum-odds filter with a capped number of quote calls
//! - `pipeline`: candidates -> slate -> filtered slate, with an optional external selection policy
//! - `providers`: collaborator traits plus football-data.org, The Odds API and FotMob clients
//! - `schedule`: once-a-day run time
//!
//! # Upstream Documentation
//! - football-data.org v4: https://www.football-data.org/documentation/api
//! - The Odds API v4: https://the-odds-api.com/liveapi/guides/v4/

pub mod directory;
pub mod error;
pub mod odds;
pub mod pipeline;
pub mod providers;
pub mod schedule;
pub mod selector;
pub mod types;

pub use directory::{DirectoryConfig, League, TeamDirectory};
pub use error::{SelectionError, SlateError, SourceError};
pub use odds::filter_by_odds;
pub use pipeline::{
    filter_slate_by_odds, select_daily_slate, DailyPipeline, Phase, PhaseError, PipelineConfig,
    PipelineReport,
};
pub use schedule::DailySchedule;
pub use selector::{CompetitionPriorities, FixtureSelector};
pub use types::*;

/// Smallest slate the selector will ever return
pub const MIN_SLATE_SIZE: usize = 3;

/// football-data.org REST API base URL (fixtures)
pub const FOOTBALL_DATA_API_BASE: &str = "https://api.football-data.org/v4";

/// The Odds API base URL (1X2 quotes)
pub const ODDS_API_BASE: &str = "https://api.the-odds-api.com/v4";

/// FotMob base URL (league tables)
pub const FOTMOB_API_BASE: &str = "https://www.fotmob.com";
