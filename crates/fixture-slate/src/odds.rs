//! Odds Filter - keep slate games whose best decimal price clears a threshold
//!
//! # Algorithm
//! 1. Walk the slate in order, one quote request per game
//! 2. Skip on fetch failure, incomplete or invalid legs, or best leg below threshold
//! 3. Stop requesting quotes once `max_count` games are retained
//!
//! Retained games keep their slate order and original index. Every skip is
//! recorded in [`FilteredSlate::skipped`].

use tracing::{debug, info, warn};

use crate::providers::QuoteSource;
use crate::types::{FilteredGame, FilteredSlate, SelectedSlate, SkipReason, SkippedGame};

/// Filter `slate` by odds. `max_count <= 0` returns nothing without calling `quotes`.
///
/// Calls are not time-bounded here; [`crate::filter_slate_by_odds`] wraps `quotes` in a timeout.
pub async fn filter_by_odds<Q>(
    slate: &SelectedSlate,
    quotes: &Q,
    min_threshold: f64,
    max_count: i64,
) -> (FilteredSlate, Vec<usize>)
where
    Q: QuoteSource + ?Sized,
{
    let mut filtered = FilteredSlate::default();
    if max_count <= 0 {
        debug!("max_count={}, skipping odds lookup", max_count);
        return (filtered, Vec::new());
    }
    let cap = usize::try_from(max_count).unwrap_or(usize::MAX);

    for (index, game) in slate.games.iter().enumerate() {
        if filtered.games.len() >= cap {
            debug!("Retained {} games, not quoting the remaining {}", cap, slate.len() - index);
            break;
        }

        let quote = match quotes.fetch_quote(&game.home_team, &game.away_team).await {
            Ok(quote) => quote,
            Err(e) if e.is_incomplete() => {
                warn!("Incomplete odds for {} vs {}: {}", game.home_team, game.away_team, e);
                filtered.skipped.push(SkippedGame {
                    index,
                    reason: SkipReason::InvalidOdds { message: e.to_string() },
                });
                continue;
            }
            Err(e) => {
                warn!("No odds for {} vs {}: {}", game.home_team, game.away_team, e);
                filtered.skipped.push(SkippedGame {
                    index,
                    reason: SkipReason::FetchFailed { message: e.to_string() },
                });
                continue;
            }
        };

        let odds = match quote.odds.validated() {
            Ok(odds) => odds,
            Err(e) => {
                warn!("Invalid odds for {} vs {} from {}: {}", game.home_team, game.away_team, quote.bookmaker, e);
                filtered.skipped.push(SkippedGame {
                    index,
                    reason: SkipReason::InvalidOdds { message: e.to_string() },
                });
                continue;
            }
        };

        let max_odds = odds.max_leg();
        if max_odds < min_threshold {
            debug!(
                "{} vs {} below threshold: max {:.2} < {:.2}",
                game.home_team, game.away_team, max_odds, min_threshold
            );
            filtered.skipped.push(SkippedGame { index, reason: SkipReason::BelowThreshold { max_odds } });
            continue;
        }

        debug!("{} vs {} kept: max {:.2} ({})", game.home_team, game.away_team, max_odds, quote.bookmaker);
        filtered.games.push(FilteredGame { index, game: game.clone(), odds, bookmaker: quote.bookmaker });
    }

    info!(
        "Odds filter kept {} of {} games (min_odds={:.2}, max_count={})",
        filtered.len(),
        slate.len(),
        min_threshold,
        max_count
    );

    let indexes = filtered.indexes();
    (filtered, indexes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::types::{OddsQuote, OddsTriple, SelectedGame};
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Quotes keyed by home team; unknown teams fail
    struct FakeQuotes {
        odds: HashMap<String, OddsTriple>,
        calls: AtomicUsize,
    }

    impl FakeQuotes {
        fn new(entries: &[(&str, OddsTriple)]) -> Self {
            Self {
                odds: entries.iter().map(|(h, o)| (h.to_string(), *o)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for FakeQuotes {
        async fn fetch_quote(&self, home_team: &str, away_team: &str) -> Result<OddsQuote, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let odds = self
                .odds
                .get(home_team)
                .copied()
                .ok_or_else(|| SourceError::NotFound(format!("{} vs {}", home_team, away_team)))?;
            Ok(OddsQuote {
                home_team: home_team.to_string(),
                away_team: away_team.to_string(),
                match_id: None,
                commence_time: None,
                odds,
                bookmaker: "pinnacle".to_string(),
            })
        }
    }

    fn slate(n: usize) -> SelectedSlate {
        SelectedSlate {
            games: (0..n)
                .map(|i| SelectedGame {
                    home_team: format!("Home{}", i),
                    away_team: format!("Away{}", i),
                    match_date: NaiveDate::from_ymd_opt(2025, 12, 14).unwrap(),
                    kickoff_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
                    league: "Premier League".to_string(),
                    venue: None,
                    justification: String::new(),
                })
                .collect(),
            selection_reasoning: String::new(),
        }
    }

    fn triple(max: f64) -> OddsTriple {
        OddsTriple::new(1.5, 1.6, max)
    }

    #[tokio::test]
    async fn test_partial_quotes_keep_order_and_indexes() {
        let quotes = FakeQuotes::new(&[("Home0", triple(3.5)), ("Home2", triple(1.8)), ("Home4", triple(4.0))]);

        let (filtered, indexes) = filter_by_odds(&slate(5), &quotes, 3.0, 10).await;

        assert_eq!(indexes, vec![0, 4]);
        assert_eq!(filtered.games[0].game.home_team, "Home0");
        assert_eq!(filtered.games[1].game.home_team, "Home4");
        assert_eq!(filtered.skipped.len(), 3);
        assert!(matches!(filtered.skipped[0].reason, SkipReason::FetchFailed { .. }));
        assert_eq!(filtered.skipped[1].reason, SkipReason::BelowThreshold { max_odds: 1.8 });
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_non_positive_cap_never_calls_source() {
        let quotes = FakeQuotes::new(&[("Home0", triple(3.5))]);
        for cap in [0, -3] {
            let (filtered, indexes) = filter_by_odds(&slate(3), &quotes, 1.0, cap).await;
            assert!(filtered.is_empty());
            assert!(indexes.is_empty());
        }
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stops_calling_once_cap_reached() {
        let entries: Vec<(String, OddsTriple)> = (0..6).map(|i| (format!("Home{}", i), triple(5.0))).collect();
        let refs: Vec<(&str, OddsTriple)> = entries.iter().map(|(h, o)| (h.as_str(), *o)).collect();
        let quotes = FakeQuotes::new(&refs);

        let (filtered, indexes) = filter_by_odds(&slate(6), &quotes, 2.0, 2).await;

        assert_eq!(indexes, vec![0, 1]);
        assert_eq!(filtered.len(), 2);
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_leg_excluded() {
        let quotes = FakeQuotes::new(&[
            ("Home0", OddsTriple::new(1.0, 3.4, 5.0)),
            ("Home1", OddsTriple::new(2.0, f64::INFINITY, 5.0)),
            ("Home2", OddsTriple::new(2.0, 3.4, 5.0)),
        ]);

        let (filtered, indexes) = filter_by_odds(&slate(3), &quotes, 2.0, 5).await;

        assert_eq!(indexes, vec![2]);
        assert!(filtered.skipped[..2].iter().all(|s| matches!(s.reason, SkipReason::InvalidOdds { .. })));
    }

    /// Draw leg missing for one fixture, feed down for another
    struct PatchyQuotes;

    #[async_trait]
    impl QuoteSource for PatchyQuotes {
        async fn fetch_quote(&self, home_team: &str, away_team: &str) -> Result<OddsQuote, SourceError> {
            match home_team {
                "Home0" => Err(SourceError::IncompleteData("draw leg missing".to_string())),
                "Home1" => Err(SourceError::Unavailable("503".to_string())),
                _ => Ok(OddsQuote {
                    home_team: home_team.to_string(),
                    away_team: away_team.to_string(),
                    match_id: None,
                    commence_time: None,
                    odds: OddsTriple::new(2.4, 3.1, 2.9),
                    bookmaker: "pinnacle".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_missing_leg_from_source_is_invalid_odds() {
        let (filtered, indexes) = filter_by_odds(&slate(3), &PatchyQuotes, 2.0, 5).await;

        assert_eq!(indexes, vec![2]);
        assert_eq!(
            filtered.skipped[0].reason,
            SkipReason::InvalidOdds { message: "incomplete data: draw leg missing".to_string() }
        );
        assert!(matches!(filtered.skipped[1].reason, SkipReason::FetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive_on_best_leg() {
        let quotes = FakeQuotes::new(&[
            ("Home0", OddsTriple::new(3.0, 2.0, 2.5)),
            ("Home1", OddsTriple::new(2.99, 2.0, 2.5)),
            ("Home2", OddsTriple::new(1.2, 6.5, 9.0)),
        ]);

        let (filtered, indexes) = filter_by_odds(&slate(3), &quotes, 3.0, 10).await;

        assert_eq!(indexes, vec![0, 2]);
        assert!(filtered.games.iter().all(|g| g.odds.max_leg() >= 3.0));
    }
}
