//! Configuration management utilities
//!
//! [`Settings`] carries the process-wide knobs an embedding host usually
//! wants to control from the environment: the agent name, the default step
//! limit and the logging setup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known environment variable names
pub mod env {
    /// Agent identifier used in logs and events
    pub const AGENT_NAME: &str = "TYGR_AGENT_NAME";
    /// Default step limit for a run
    pub const MAX_STEPS: &str = "TYGR_MAX_STEPS";
    /// Log filter directive (e.g. "info", "tygr_agents=debug")
    pub const LOG: &str = "TYGR_LOG";
    /// Log output format ("pretty" or "json")
    pub const LOG_FORMAT: &str = "TYGR_LOG_FORMAT";
}

/// Errors raised while loading configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was present but could not be parsed
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Agent name
    pub agent_name: String,
    /// Default step limit for a run
    pub max_steps: usize,
    /// Log filter directive
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            agent_name: "tygr".to_string(),
            max_steps: 25,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Load settings from the process environment, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary lookup function
    ///
    /// Unset or blank variables keep their default value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(name) = get(env::AGENT_NAME) {
            settings.agent_name = name.trim().to_string();
        }

        if let Some(raw) = get(env::MAX_STEPS) {
            settings.max_steps = raw
                .trim()
                .parse()
                .map_err(|_| invalid(env::MAX_STEPS, &raw))?;
        }

        if let Some(level) = get(env::LOG) {
            settings.log_level = level.trim().to_string();
        }

        if let Some(raw) = get(env::LOG_FORMAT) {
            settings.log_format = raw.parse().map_err(|()| invalid(env::LOG_FORMAT, &raw))?;
        }

        Ok(settings)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
