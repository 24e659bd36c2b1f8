// Data-driven game configuration.
//
// All tunable game parameters live here in `GameConfig`, loaded from JSON at
// startup: the per-round time limit, the round count, and the question list
// with accepted answers. The server reads game rules from the config, never
// from magic numbers, so question sets change without recompilation.
//
// Validation happens at load time. A config that parses but describes an
// unplayable game (zero rounds, zero-second rounds) is rejected before the
// server binds: startup failures abort with exit code 1, a running game never
// aborts.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced while loading the game configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One quiz question with the set of answers that score.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionConfig {
    /// Question text, broadcast verbatim at round start.
    pub question: String,
    /// Accepted answers, matched ASCII case-insensitively. May be empty, in
    /// which case nobody scores on this question.
    pub answers: Vec<String>,
}

/// Game parameters and the question list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    /// Seconds each round stays open before it is graded.
    pub time_limit_secs: u32,
    /// Rounds per game. May exceed the question count; the extra rounds run
    /// question-less and time out.
    pub max_rounds: u32,
    /// The question list, indexed by round number.
    pub questions: Vec<QuestionConfig>,
}

impl GameConfig {
    /// Load and validate a config from a JSON file.
    pub fn load(path: &Path) -> Result<GameConfig, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate a config from JSON text.
    pub fn from_json(text: &str) -> Result<GameConfig, ConfigError> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit_secs == 0 {
            return Err(ConfigError::Invalid(
                "time_limit_secs must be at least 1".into(),
            ));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid("max_rounds must be at least 1".into()));
        }
        Ok(())
    }
}
