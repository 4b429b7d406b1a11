//! Agent configuration

use serde::{Deserialize, Serialize};
use tygr_utils::Settings;

/// Configuration for a [`TygrAgent`](crate::TygrAgent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Identifier used in logs, events and errors
    pub name: String,

    /// Step limit used by `run_to_limit`
    pub max_steps: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "tygr".to_string(),
            max_steps: 25,
        }
    }
}

impl AgentConfig {
    /// Take the agent name and step limit from workspace settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            name: settings.agent_name.clone(),
            max_steps: settings.max_steps,
        }
    }
}
