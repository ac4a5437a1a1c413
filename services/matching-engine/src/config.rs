//! Engine configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable selecting the self-trade policy
pub const SELF_TRADE_POLICY_ENV: &str = "EXCHANGE_SELF_TRADE_POLICY";
/// Environment variable overriding the first fill sequence number
pub const FILL_SEQUENCE_START_ENV: &str = "EXCHANGE_FILL_SEQUENCE_START";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Malformed config: {0}")]
    Parse(String),
}

/// What happens when an incoming order would cross a resting order from
/// the same user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfTradePolicy {
    /// Same-user orders match like any other
    #[default]
    Allow,
    /// Stop crossing and cancel the rest of the incoming order
    CancelNewest,
}

impl FromStr for SelfTradePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(SelfTradePolicy::Allow),
            "cancel_newest" => Ok(SelfTradePolicy::CancelNewest),
            _ => Err(ConfigError::InvalidValue {
                key: SELF_TRADE_POLICY_ENV.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration for the matching engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub self_trade_policy: SelfTradePolicy,
    /// Sequence number given to the first fill of a fresh engine
    pub starting_fill_sequence: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            self_trade_policy: SelfTradePolicy::Allow,
            starting_fill_sequence: 1,
        }
    }
}

impl EngineConfig {
    /// Read overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(policy) = lookup(SELF_TRADE_POLICY_ENV) {
            config.self_trade_policy = policy.parse()?;
        }

        if let Some(start) = lookup(FILL_SEQUENCE_START_ENV) {
            config.starting_fill_sequence =
                start.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: FILL_SEQUENCE_START_ENV.to_string(),
                    value: start.clone(),
                })?;
        }

        Ok(config)
    }
}
