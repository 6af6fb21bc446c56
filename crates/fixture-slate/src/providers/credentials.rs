//! API keys for the HTTP providers
//!
//! Expected env vars:
//! - FOOTBALL_DATA_API_KEY (fixtures)
//! - ODDS_API_KEY (quotes)
//!
//! The roster provider needs no key.

pub const FOOTBALL_DATA_API_KEY_ENV: &str = "FOOTBALL_DATA_API_KEY";
pub const ODDS_API_KEY_ENV: &str = "ODDS_API_KEY";

#[derive(Clone, Default)]
pub struct ApiKeys {
    pub football_data: Option<String>,
    pub odds_api: Option<String>,
}

impl ApiKeys {
    /// Read keys from the environment; blank values count as missing
    pub fn from_env() -> Self {
        Self {
            football_data: read_key(FOOTBALL_DATA_API_KEY_ENV),
            odds_api: read_key(ODDS_API_KEY_ENV),
        }
    }
}

fn read_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn redact(key: &Option<String>) -> String {
    match key {
        Some(k) => format!("{}...", k.chars().take(4).collect::<String>()),
        None => "<unset>".to_string(),
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("football_data", &redact(&self.football_data))
            .field("odds_api", &redact(&self.odds_api))
            .finish()
    }
}
