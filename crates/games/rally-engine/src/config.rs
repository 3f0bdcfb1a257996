use serde::{Deserialize, Serialize};

/// Data-driven configuration for a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Life tokens each robot starts with.
    pub life_tokens: u8,
    /// RNG seed for dealing and respawn search. The engine is fully
    /// deterministic for a given seed and input sequence.
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            life_tokens: 3,
            seed: 0,
        }
    }
}

impl MatchConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("RALLY_MATCH_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/match.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }
}
