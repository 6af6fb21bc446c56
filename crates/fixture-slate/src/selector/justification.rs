//! Per-game justification text

use std::collections::BTreeSet;

use crate::types::CandidateFixture;

/// Shortest token (before trimming) that counts as a shared local identifier
const MIN_TOKEN_LEN: usize = 4;

/// Why a fixture was picked. Descriptive only, never used for ranking.
pub fn justify(fixture: &CandidateFixture) -> String {
    let competition = fixture.competition_name.trim();
    let competition = if competition.is_empty() { "the competition" } else { competition };

    match shared_token(&fixture.home_team, &fixture.away_team) {
        Some(hint) => format!(
            "Selected as a high-interest match in {}; teams share a local identifier ('{}'), \
             which can indicate rivalry intensity.",
            competition, hint
        ),
        None => format!(
            "Selected from {} as a higher-prestige competition where match stakes and competitive \
             intensity are typically strong, making it suitable for deeper analysis.",
            competition
        ),
    }
}

/// Lexicographically smallest token both names share, title-cased
pub(crate) fn shared_token(home: &str, away: &str) -> Option<String> {
    let home = tokens(home);
    let away = tokens(away);
    home.intersection(&away).next().map(|t| title_case(t))
}

fn tokens(name: &str) -> BTreeSet<String> {
    name.split_whitespace()
        .filter(|raw| raw.chars().count() >= MIN_TOKEN_LEN)
        .map(|raw| raw.trim_matches(|c| matches!(c, '.' | ',' | '-')).to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Upper-case every letter that follows a non-letter ("saint-etienne" -> "Saint-Etienne")
fn title_case(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut after_letter = false;
    for c in token.chars() {
        if after_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    out
}
