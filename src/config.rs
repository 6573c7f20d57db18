// Configuration module for reading Quixo.toml
// Holds the search budget, table sizing, batch match settings and move logging

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::search::SearchConfig;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub table: TableConfig,
    pub matches: MatchesConfig,
    pub debug: DebugConfig,
}

/// Transposition table sizing
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TableConfig {
    /// Entry count above which the shallowest entries are dropped; absent means unbounded
    pub soft_capacity: Option<usize>,
}

/// Batch match settings: the search agent against a random agent, or against a
/// second search agent when `opponent` is set
#[derive(Debug, Deserialize, Clone)]
pub struct MatchesConfig {
    pub games: u32,
    /// Game `i` seeds its random agent with `seed + i`
    pub seed: u64,
    /// Plies after which a game is drawn
    pub max_turns: u32,
    /// Run games on the rayon pool, one search context per worker
    pub parallel: bool,
    /// Chance that a search agent plays a random legal move instead of searching
    #[serde(default)]
    pub exploration: f64,
    /// Search budget of the opposing engine; absent means a random opponent
    #[serde(default)]
    pub opponent: Option<SearchConfig>,
}

/// Move log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Quixo.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&contents)
    }

    /// Parses configuration text; search thresholds are validated here
    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Quixo.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Quixo.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Quixo.toml
    pub fn default_hardcoded() -> Self {
        Config {
            search: SearchConfig::default(),
            table: TableConfig {
                soft_capacity: None,
            },
            matches: MatchesConfig {
                games: 100,
                seed: 1,
                max_turns: 200,
                parallel: true,
                exploration: 0.0,
                opponent: None,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "quixo_moves.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            eprintln!("Warning: Could not load Quixo.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{MAX_SCORE, MIN_SCORE};

    #[test]
    fn test_config_can_be_created() {
        let config = Config::default_hardcoded();
        assert_eq!(config.search.min_depth(), 1);
        assert_eq!(config.search.max_depth(), 3);
        assert_eq!(config.search.thresholds(), &[MAX_SCORE, 0.3, MIN_SCORE]);
    }

    #[test]
    fn test_quixo_toml_can_be_parsed() {
        // This test ensures Quixo.toml is valid and can be parsed
        let result = Config::from_file("Quixo.toml");
        assert!(
            result.is_ok(),
            "Failed to parse Quixo.toml: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file_config = Config::from_file("Quixo.toml").expect("Quixo.toml should be parseable");
        let hardcoded_config = Config::default_hardcoded();

        assert_eq!(file_config.search, hardcoded_config.search);
        assert_eq!(file_config.table, hardcoded_config.table);
        assert_eq!(file_config.matches.games, hardcoded_config.matches.games);
        assert_eq!(file_config.matches.seed, hardcoded_config.matches.seed);
        assert_eq!(
            file_config.matches.max_turns,
            hardcoded_config.matches.max_turns
        );
        assert_eq!(
            file_config.matches.parallel,
            hardcoded_config.matches.parallel
        );
        assert_eq!(
            file_config.matches.exploration,
            hardcoded_config.matches.exploration
        );
        assert_eq!(
            file_config.matches.opponent,
            hardcoded_config.matches.opponent
        );
        assert_eq!(file_config.debug.enabled, hardcoded_config.debug.enabled);
        assert_eq!(
            file_config.debug.log_file_path,
            hardcoded_config.debug.log_file_path
        );
    }

    #[test]
    fn test_missing_final_loss_threshold_is_rejected() {
        let text = r#"
            [search]
            min_depth = 1
            max_depth = 2
            thresholds = [10000.0, 0.3]

            [matches]
            games = 1
            seed = 0
            max_turns = 10
            parallel = false

            [debug]
            enabled = false
            log_file_path = "x.jsonl"
        "#;
        let err = Config::from_toml_str(text).unwrap_err();
        assert!(err.contains("final threshold"), "unexpected error: {}", err);
    }

    #[test]
    fn test_soft_capacity_is_optional() {
        let text = r#"
            [search]
            min_depth = 2
            max_depth = 2
            thresholds = [-10000.0]

            [table]
            soft_capacity = 5000

            [matches]
            games = 1
            seed = 0
            max_turns = 10
            parallel = false

            [debug]
            enabled = false
            log_file_path = "x.jsonl"
        "#;
        let config = Config::from_toml_str(text).unwrap();
        assert_eq!(config.table.soft_capacity, Some(5000));
        assert_eq!(config.search, SearchConfig::fixed_depth(2).unwrap());
    }

    #[test]
    fn test_opponent_engine_section() {
        let text = r#"
            [search]
            min_depth = 1
            max_depth = 3
            thresholds = [10000.0, 0.3, -10000.0]

            [matches]
            games = 10
            seed = 1
            max_turns = 200
            parallel = false
            exploration = 0.3

            [matches.opponent]
            min_depth = 1
            max_depth = 4
            thresholds = [10000.0, 0.3, 0.5, -10000.0]

            [debug]
            enabled = false
            log_file_path = "x.jsonl"
        "#;
        let config = Config::from_toml_str(text).unwrap();
        assert_eq!(config.matches.exploration, 0.3);
        assert_eq!(
            config.matches.opponent,
            Some(SearchConfig::new(1, 4, vec![MAX_SCORE, 0.3, 0.5, MIN_SCORE]).unwrap())
        );
    }

    #[test]
    fn test_opponent_engine_is_validated() {
        let text = r#"
            [search]
            min_depth = 2
            max_depth = 2
            thresholds = [-10000.0]

            [matches]
            games = 1
            seed = 0
            max_turns = 10
            parallel = false

            [matches.opponent]
            min_depth = 3
            max_depth = 3
            thresholds = [0.0]

            [debug]
            enabled = false
            log_file_path = "x.jsonl"
        "#;
        assert!(Config::from_toml_str(text).is_err());
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        // Test with a non-existent file
        let result = Config::from_file("nonexistent.toml");
        assert!(result.is_err());
    }
}
