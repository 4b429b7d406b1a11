//! Observations in, decisions out

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What the agent perceived at the start of a step
///
/// `Value::Null` means nothing new was observed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation {
    content: Value,
}

impl Observation {
    /// Nothing observed
    pub fn none() -> Self {
        Self::default()
    }

    /// Wrap an observed value
    pub fn new(content: impl Into<Value>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Whether nothing was observed
    pub fn is_empty(&self) -> bool {
        self.content.is_null()
    }

    /// Observed value
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Unwrap into the observed value
    pub fn into_content(self) -> Value {
        self.content
    }
}

/// The next thing the agent does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Record a response and keep going
    Respond { content: Value },
    /// Run a registered tool and record its output
    Invoke {
        tool: String,
        #[serde(default)]
        input: Value,
    },
    /// Finish the run with `result`
    Finish { result: Value },
}

impl Action {
    pub fn respond(content: impl Into<Value>) -> Self {
        Self::Respond {
            content: content.into(),
        }
    }

    pub fn invoke(tool: impl Into<String>, input: Value) -> Self {
        Self::Invoke {
            tool: tool.into(),
            input,
        }
    }

    pub fn finish(result: impl Into<Value>) -> Self {
        Self::Finish {
            result: result.into(),
        }
    }

    /// Whether this action terminates the run
    pub fn is_finish(&self) -> bool {
        matches!(self, Self::Finish { .. })
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Respond { .. } => "respond",
            Self::Invoke { .. } => "invoke",
            Self::Finish { .. } => "finish",
        }
    }
}

/// An action plus the memory writes to commit alongside it
///
/// Decisions deserialize from JSON, which lets a decider backed by a model
/// parse the model's reply directly:
///
/// ```
/// use tygr_agents::{Action, Decision};
///
/// let decision = Decision::from_json(
///     r#"{"action": "invoke", "tool": "dns_lookup", "input": {"host": "example.com"},
///         "memory": {"phase": "recon"}}"#,
/// )
/// .unwrap();
///
/// assert!(matches!(decision.action, Action::Invoke { ref tool, .. } if tool == "dns_lookup"));
/// assert_eq!(decision.memory["phase"], "recon");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(flatten)]
    pub action: Action,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub memory: BTreeMap<String, Value>,
}

impl Decision {
    /// Decide on `action` with no memory writes
    pub fn new(action: Action) -> Self {
        Self {
            action,
            memory: BTreeMap::new(),
        }
    }

    /// Also write `value` under `key` when the step commits
    pub fn remember(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.memory.insert(key.into(), value.into());
        self
    }

    /// Parse a decision from JSON text
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl From<Action> for Decision {
    fn from(action: Action) -> Self {
        Self::new(action)
    }
}
