//! Events emitted while an agent advances its state
//!
//! Events serialize with a `type` tag so a host can stream them as JSON
//! lines, one object per line, and pick out structured events from ordinary
//! log output. Phase transitions and tool runs use the `agent_state_change`
//! and `tool_execution` tags a scan dashboard already listens for.

use crate::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Something that happened during a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A step began
    StepStarted { agent: String, step: usize },
    /// The agent entered a phase of the cycle
    #[serde(rename = "agent_state_change")]
    PhaseChanged {
        agent: String,
        step: usize,
        phase: Phase,
    },
    /// A tool ran during Acting
    #[serde(rename = "tool_execution")]
    ToolExecuted {
        agent: String,
        step: usize,
        tool: String,
        success: bool,
        duration_ms: u64,
    },
    /// The step's changes were applied to the state
    StepCommitted {
        agent: String,
        step: usize,
        history_len: usize,
    },
    /// The state became terminal
    Finished {
        agent: String,
        step: usize,
        result: Value,
    },
    /// The step failed and the state was left untouched
    StepFailed {
        agent: String,
        step: usize,
        phase: Phase,
        error: String,
    },
}

impl AgentEvent {
    /// Step the event belongs to
    pub fn step(&self) -> usize {
        match self {
            Self::StepStarted { step, .. }
            | Self::PhaseChanged { step, .. }
            | Self::ToolExecuted { step, .. }
            | Self::StepCommitted { step, .. }
            | Self::Finished { step, .. }
            | Self::StepFailed { step, .. } => *step,
        }
    }
}

/// An event stamped with the time it was emitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: AgentEvent,
}

impl EventEnvelope {
    /// Stamp `event` with the current time
    pub fn now(event: AgentEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Receives events as an agent runs
///
/// Handlers are called synchronously from inside the step and must not
/// fail it; errors are theirs to log.
pub trait EventHandler: Send + Sync {
    /// Called for every emitted event
    fn on_event(&self, event: &EventEnvelope);
}

/// No-op event handler for when events are not needed
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: &EventEnvelope) {}
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<EventEnvelope>>,
}

impl EventRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded events, oldest first
    pub fn events(&self) -> Vec<AgentEvent> {
        self.lock().iter().map(|e| e.event.clone()).collect()
    }

    /// Copy of the recorded envelopes, oldest first
    pub fn envelopes(&self) -> Vec<EventEnvelope> {
        self.lock().clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all recorded events
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EventEnvelope>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventHandler for EventRecorder {
    fn on_event(&self, event: &EventEnvelope) {
        self.lock().push(event.clone());
    }
}

/// Writes each event as one JSON line
pub struct JsonLinesEventHandler<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesEventHandler<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl JsonLinesEventHandler<std::io::Stdout> {
    /// Stream events to standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> EventHandler for JsonLinesEventHandler<W> {
    fn on_event(&self, event: &EventEnvelope) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to serialize agent event");
                return;
            }
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            warn!(error = %e, "Failed to write agent event");
        }
    }
}
