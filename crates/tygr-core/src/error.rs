//! Error types for tygr-core

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for tygr-core
pub type Result<T> = std::result::Result<T, Error>;

/// Phase of a perceive, decide, act cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Gathering the latest input or observation
    Perceiving,
    /// Selecting the next action
    Deciding,
    /// Applying the action
    Acting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Perceiving => "perceiving",
            Self::Deciding => "deciding",
            Self::Acting => "acting",
        })
    }
}

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Mutation or re-finalization of a terminal state
    #[error("Invalid agent state: {0}")]
    InvalidState(String),

    /// `step` was invoked on a terminal state
    #[error("Agent state is already done")]
    AlreadyDone,

    /// A step failed part way; the state was left untouched
    #[error("Agent '{agent}' failed at step {step} while {phase}: {source}")]
    StepExecution {
        agent: String,
        step: usize,
        phase: Phase,
        #[source]
        source: anyhow::Error,
    },

    /// The step limit ran out before the state became terminal
    #[error("Run truncated after {steps} steps without completion")]
    Truncated { steps: usize },

    /// Invalid agent configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Phase of a failed step, if this is a step failure
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::StepExecution { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
