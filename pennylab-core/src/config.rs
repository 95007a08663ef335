//! Session parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed parameters of one trading session and the game around it.
///
/// The core never reads a clock; `base_tick_interval_ms` and
/// `speed_multipliers` exist for the driver that paces `tick()` calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Ticks per session. One tick is one simulated minute.
    pub session_length_ticks: u64,
    /// Real milliseconds per tick at 1x speed.
    pub base_tick_interval_ms: u64,
    /// Speeds the driver may run at, as multiples of the base rate.
    pub speed_multipliers: Vec<f64>,
    pub starting_cash: f64,
    pub max_rounds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_length_ticks: 390,
            base_tick_interval_ms: 200,
            speed_multipliers: vec![0.5, 1.0, 2.0, 4.0],
            starting_cash: 10_000.0,
            max_rounds: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl SessionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_length_ticks == 0 {
            return Err(ConfigError::Invalid("session_length_ticks must be > 0".into()));
        }
        if self.base_tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("base_tick_interval_ms must be > 0".into()));
        }
        if self.starting_cash <= 0.0 {
            return Err(ConfigError::Invalid("starting_cash must be > 0".into()));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid("max_rounds must be > 0".into()));
        }
        if self.speed_multipliers.is_empty() {
            return Err(ConfigError::Invalid("speed_multipliers must not be empty".into()));
        }
        if self.speed_multipliers.iter().any(|&m| m <= 0.0) {
            return Err(ConfigError::Invalid("speed multipliers must be > 0".into()));
        }
        Ok(())
    }
}
