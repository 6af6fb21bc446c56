//! Daily Fixture Slate CLI
//!
//! Commands:
//! - `select`: Pick the day's slate and print it
//! - `run`: Pick the slate, then filter it by odds
//! - `resolve`: Look up canonical team identities
//! - `daemon`: Run the full pipeline once a day at a fixed local time (default UTC)
//!
//! # Usage
//! ```bash
//! # Requires FOOTBALL_DATA_API_KEY (and ODDS_API_KEY for run/daemon)
//! slate select --date 2025-12-14 --max-games 6
//!
//! slate run --min-odds 2.5 --max-daily-games 4 --out data/slate.json
//!
//! slate resolve "FC Barcelona" "Man United"
//!
//! slate daemon --daily-at 14:00 --tz Europe/Amsterdam --out-dir data/slates
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::{error, info, warn};

use fixture_slate::providers::{
    ApiKeys, FixtureChain, FootballDataClient, FotMobClient, OddsApiClient, QuoteChain,
};
use fixture_slate::{
    DailyPipeline, DailySchedule, DirectoryConfig, PipelineConfig, PipelineReport, TeamDirectory,
    FOOTBALL_DATA_API_BASE, FOTMOB_API_BASE, ODDS_API_BASE,
};

#[derive(Parser)]
#[command(name = "slate")]
#[command(about = "Daily fixture slate: selection, team lookup and odds filtering")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Args, Clone)]
struct PipelineArgs {
    /// Maximum games in the selected slate (>= 3)
    #[arg(long, default_value = "8")]
    max_games: usize,

    /// Minimum best-leg decimal odds to keep a game
    #[arg(long, default_value = "2.0")]
    min_odds: f64,

    /// Maximum games kept after odds filtering (0 disables quoting)
    #[arg(long, default_value = "5", allow_negative_numbers = true)]
    max_daily_games: i64,

    /// Per upstream call timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,
}

impl PipelineArgs {
    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            max_games: self.max_games,
            min_odds: self.min_odds,
            max_daily_games: self.max_daily_games,
            call_timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Select the day's slate (no odds lookup)
    Select {
        /// Match date (YYYY-MM-DD, default: today UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Output file for the slate JSON (optional, defaults to stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Select the slate, then filter it by odds
    Run {
        /// Match date (YYYY-MM-DD, default: today UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Output file for the report JSON (optional, defaults to stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Resolve team names to canonical identities
    Resolve {
        /// Team names, e.g. "FC Barcelona"
        #[arg(required = true)]
        names: Vec<String>,

        /// Roster cache TTL in minutes
        #[arg(long, default_value = "60")]
        ttl_minutes: u64,
    },

    /// Run the pipeline every day at a fixed local time until Ctrl+C
    Daemon {
        /// Daily run time, HH:MM in --tz
        #[arg(long, default_value = fixture_slate::schedule::DEFAULT_DAILY_TIME)]
        daily_at: DailySchedule,

        /// IANA time zone for --daily-at and the run date, e.g. Europe/Amsterdam
        #[arg(long, default_value = "UTC", value_parser = parse_tz)]
        tz: Tz,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Directory for per-day report files (optional, defaults to stdout)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();

    match cli.command {
        Commands::Select { date, pipeline, out } => run_select(date, pipeline, out).await,
        Commands::Run { date, pipeline, out } => run_pipeline(date, pipeline, out).await,
        Commands::Resolve { names, ttl_minutes } => run_resolve(names, ttl_minutes).await,
        Commands::Daemon { daily_at, tz, pipeline, out_dir } => {
            run_daemon(daily_at.with_timezone(tz), pipeline, out_dir).await
        }
    }
}

fn parse_tz(raw: &str) -> Result<Tz, String> {
    raw.parse::<Tz>().map_err(|e| format!("unknown time zone '{}': {}", raw, e))
}

fn build_pipeline(args: &PipelineArgs) -> Result<DailyPipeline> {
    let keys = ApiKeys::from_env();
    info!("API keys: {:?}", keys);
    if keys.football_data.is_none() {
        warn!("FOOTBALL_DATA_API_KEY not set, fixture requests will fail");
    }

    let fixtures = FixtureChain::new()
        .with("football-data", Arc::new(FootballDataClient::new(keys.football_data.clone())?));
    let quotes = QuoteChain::new().with("the-odds-api", Arc::new(OddsApiClient::new(keys.odds_api.clone())?));

    Ok(DailyPipeline::new(Arc::new(fixtures), Arc::new(quotes), args.config()))
}

async fn write_output(json_output: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(out_path) => {
            if let Some(parent) = out_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(out_path, json_output).await?;
            info!("");
            info!("Output written to: {}", out_path.display());
        }
        None => println!("{}", json_output),
    }
    Ok(())
}

async fn run_select(date: Option<NaiveDate>, args: PipelineArgs, out: Option<PathBuf>) -> Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());

    info!("=== Slate Selection ===");
    info!("Fixtures API: {}", FOOTBALL_DATA_API_BASE);
    info!("Date: {}", date);
    info!("Max games: {}", args.max_games);
    info!("");

    let pipeline = build_pipeline(&args)?;
    let slate = match pipeline.select(date).await {
        Ok(slate) => slate,
        Err(e) => {
            error!("{}", e);
            anyhow::bail!("No slate for {}", date);
        }
    };

    info!("=== Selected {} games ===", slate.len());
    for (i, game) in slate.games.iter().enumerate() {
        info!(
            "  [{}] {} {} vs {} ({})",
            i,
            game.kickoff_time.format("%H:%M"),
            game.home_team,
            game.away_team,
            game.league
        );
    }

    write_output(&serde_json::to_string_pretty(&slate)?, out.as_deref()).await
}

async fn run_pipeline(date: Option<NaiveDate>, args: PipelineArgs, out: Option<PathBuf>) -> Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());

    let pipeline = build_pipeline(&args)?;
    let config = pipeline.config();

    info!("=== Daily Slate Run ===");
    info!("Fixtures API: {}", FOOTBALL_DATA_API_BASE);
    info!("Odds API: {}", ODDS_API_BASE);
    info!("Date: {}", date);
    info!(
        "Max games: {}, min odds: {:.2}, max daily games: {}, call timeout: {:?}",
        config.max_games, config.min_odds, config.max_daily_games, config.call_timeout
    );
    info!("");

    let report = match pipeline.run(date).await {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            anyhow::bail!("Run for {} failed", date);
        }
    };

    log_report(&report);
    write_output(&serde_json::to_string_pretty(&report)?, out.as_deref()).await
}

fn log_report(report: &PipelineReport) {
    info!("");
    info!("=== Summary ({}) ===", report.date);
    info!("Selected: {}", report.slate.len());
    info!("After odds filter: {}", report.filtered.len());
    for game in &report.filtered.games {
        let (n1, n2, n3) = game.toto();
        info!(
            "  [{}] {} vs {}: n1={:.2} n2={:.2} n3={:.2} ({})",
            game.index, game.game.home_team, game.game.away_team, n1, n2, n3, game.bookmaker
        );
    }
    if !report.filtered.skipped.is_empty() {
        info!("Skipped: {}", report.filtered.skipped.len());
    }
}

async fn run_resolve(names: Vec<String>, ttl_minutes: u64) -> Result<()> {
    let config = DirectoryConfig { ttl: Duration::from_secs(ttl_minutes * 60), ..DirectoryConfig::default() };
    let directory = TeamDirectory::with_config(Arc::new(FotMobClient::new()?), config);

    info!("=== Team Resolution ===");
    info!("Roster API: {}", FOTMOB_API_BASE);
    let leagues: Vec<&str> = directory.leagues().iter().map(|l| l.name.as_str()).collect();
    info!("Leagues: {}", leagues.join(", "));
    info!("");

    let mut results = Vec::with_capacity(names.len());
    for name in &names {
        let identity = directory.resolve(name).await;
        match &identity {
            Some(team) => info!("{} -> {} (id={}, {})", name, team.name, team.id, team.league_name),
            None => warn!("{} -> not found", name),
        }
        results.push(json!({ "query": name, "team": identity }));
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

async fn run_daemon(schedule: DailySchedule, args: PipelineArgs, out_dir: Option<PathBuf>) -> Result<()> {
    info!("=== Daily Slate Daemon ===");
    info!("Runs daily at {} {}", schedule, schedule.timezone());
    info!("Press Ctrl+C to stop");
    info!("");

    let pipeline = build_pipeline(&args)?;

    loop {
        let now = Utc::now();
        let next = schedule.next_run_after(now);
        let wait = (next - now).to_std().unwrap_or_default();
        info!("Next run at {} (in {}s)", next, wait.as_secs());

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                return Ok(());
            }
        }

        let date = schedule.local_date(next);
        match pipeline.run(date).await {
            Ok(report) => {
                log_report(&report);
                let out = out_dir.as_ref().map(|dir| dir.join(format!("slate-{}.json", date)));
                if let Err(e) = write_output(&serde_json::to_string_pretty(&report)?, out.as_deref()).await {
                    error!("Failed to write report for {}: {}", date, e);
                }
            }
            // A failed day never stops the daemon
            Err(e) => error!("{}", e),
        }
    }
}
