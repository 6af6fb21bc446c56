//! Competition prestige weights

use std::collections::HashMap;

/// Weight for competitions found in neither table
pub const DEFAULT_PRIORITY: u32 = 10;

const CODE_WEIGHTS: &[(&str, u32)] = &[
    ("CL", 100),
    ("EL", 90),
    ("PL", 80),
    ("PD", 78),
    ("SA", 76),
    ("BL1", 74),
    ("FL1", 72),
    ("PPL", 60),
    ("DED", 58),
    ("BSA", 55),
    ("EC", 50),
    ("WC", 50),
];

/// Checked in order against the lowercased competition name
const NAME_WEIGHTS: &[(&str, u32)] = &[
    ("champions league", 100),
    ("europa league", 90),
    ("premier league", 80),
    ("la liga", 78),
    ("serie a", 76),
    ("bundesliga", 74),
    ("ligue 1", 72),
];

/// Competition code / name -> priority weight. Higher is more prestigious.
#[derive(Clone, Debug)]
pub struct CompetitionPriorities {
    codes: HashMap<String, u32>,
    names: Vec<(String, u32)>,
    fallback: u32,
}

impl Default for CompetitionPriorities {
    fn default() -> Self {
        Self {
            codes: CODE_WEIGHTS.iter().map(|(c, w)| (c.to_string(), *w)).collect(),
            names: NAME_WEIGHTS.iter().map(|(n, w)| (n.to_string(), *w)).collect(),
            fallback: DEFAULT_PRIORITY,
        }
    }
}

impl CompetitionPriorities {
    /// Override (or add) the weight of a competition code
    pub fn with_code(mut self, code: &str, weight: u32) -> Self {
        self.codes.insert(code.trim().to_uppercase(), weight);
        self
    }

    /// Add a name substring checked before the built-in ones
    pub fn with_name(mut self, fragment: &str, weight: u32) -> Self {
        self.names.insert(0, (fragment.trim().to_lowercase(), weight));
        self
    }

    pub fn with_fallback(mut self, weight: u32) -> Self {
        self.fallback = weight;
        self
    }

    /// Code table first (case-insensitive), then name substrings, then the fallback
    pub fn weight(&self, code: Option<&str>, name: &str) -> u32 {
        if let Some(weight) = code.and_then(|c| self.codes.get(&c.trim().to_uppercase())) {
            return *weight;
        }

        let name = name.to_lowercase();
        self.names
            .iter()
            .find(|(fragment, _)| name.contains(fragment.as_str()))
            .map_or(self.fallback, |(_, weight)| *weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_lookup_is_case_insensitive() {
        let p = CompetitionPriorities::default();
        assert_eq!(p.weight(Some("CL"), "whatever"), 100);
        assert_eq!(p.weight(Some("bl1"), ""), 74);
    }

    #[test]
    fn test_name_fallback_and_default() {
        let p = CompetitionPriorities::default();
        assert_eq!(p.weight(None, "UEFA Champions League"), 100);
        assert_eq!(p.weight(Some("XX"), "Premier League"), 80);
        assert_eq!(p.weight(None, "Championship"), DEFAULT_PRIORITY);
    }

    #[test]
    fn test_overrides() {
        let p = CompetitionPriorities::default().with_code("ELC", 65).with_name("championship", 64);
        assert_eq!(p.weight(Some("elc"), "Championship"), 65);
        assert_eq!(p.weight(None, "EFL Championship"), 64);
    }
}
