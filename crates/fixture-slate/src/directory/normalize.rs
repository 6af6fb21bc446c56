//! Team name normalization
//!
//! `"FC Barcelona"`, `"Barcelona"` and `"barcelona fc"` all normalize to `"barcelona"`.

/// Club tokens stripped from either end of a name
const CLUB_TOKENS: &[&str] = &["fc", "cf", "sc", "afc"];

/// Accented characters folded to their ASCII base letter
const ACCENT_FOLDS: &[(char, char)] = &[
    ('é', 'e'),
    ('è', 'e'),
    ('ê', 'e'),
    ('á', 'a'),
    ('à', 'a'),
    ('â', 'a'),
    ('ã', 'a'),
    ('ä', 'a'),
    ('í', 'i'),
    ('ó', 'o'),
    ('ô', 'o'),
    ('õ', 'o'),
    ('ö', 'o'),
    ('ú', 'u'),
    ('ü', 'u'),
    ('ñ', 'n'),
    ('ç', 'c'),
];

/// Normalize a team name for matching
pub fn normalize_team_name(name: &str) -> String {
    let mut normalized = name.trim().to_lowercase();

    for token in CLUB_TOKENS {
        let suffix = format!(" {}", token);
        if normalized.ends_with(&suffix) {
            normalized.truncate(normalized.len() - suffix.len());
        }
    }
    for token in CLUB_TOKENS {
        let prefix = format!("{} ", token);
        if normalized.starts_with(&prefix) {
            normalized.drain(..prefix.len());
        }
    }

    normalized
        .chars()
        .map(|c| ACCENT_FOLDS.iter().find(|(from, _)| *from == c).map_or(c, |(_, to)| *to))
        .collect::<String>()
        .trim()
        .to_string()
}
