use std::env;

use clash_core::validation::FuzzyConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_rounds: u32,
    pub game_timeout_minutes: u64,
    pub rate_limit_tokens: u32,
    pub rate_limit_refill_seconds: u64,
    pub fuzzy_token_overlap: f64,
    pub fuzzy_char_similarity: f64,
    pub stats_endpoint: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            max_rounds: env::var("MAX_ROUNDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("Invalid MAX_ROUNDS"),
            game_timeout_minutes: env::var("GAME_TIMEOUT_MINUTES")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .expect("Invalid GAME_TIMEOUT_MINUTES"),
            rate_limit_tokens: env::var("RATE_LIMIT_TOKENS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("Invalid RATE_LIMIT_TOKENS"),
            rate_limit_refill_seconds: env::var("RATE_LIMIT_REFILL_SECONDS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .expect("Invalid RATE_LIMIT_REFILL_SECONDS"),
            fuzzy_token_overlap: env::var("FUZZY_TOKEN_OVERLAP")
                .unwrap_or_else(|_| "0.80".to_string())
                .parse()
                .expect("Invalid FUZZY_TOKEN_OVERLAP"),
            fuzzy_char_similarity: env::var("FUZZY_CHAR_SIMILARITY")
                .unwrap_or_else(|_| "0.85".to_string())
                .parse()
                .expect("Invalid FUZZY_CHAR_SIMILARITY"),
            stats_endpoint: env::var("STATS_ENDPOINT").ok(),
        }
    }

    pub fn fuzzy(&self) -> FuzzyConfig {
        FuzzyConfig {
            token_overlap: self.fuzzy_token_overlap,
            char_similarity: self.fuzzy_char_similarity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
