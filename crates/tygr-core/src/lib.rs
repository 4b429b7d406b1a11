//! Core abstractions for tygr agents
//!
//! This crate defines the state container every agent advances, the
//! [`BaseAgent`] execution contract, the event stream emitted while a step
//! runs, and the shared error type.

pub mod agent;
pub mod error;
pub mod event;
pub mod state;

pub use agent::{BaseAgent, RunOutcome, RunStatus, StepOutcome};
pub use error::{Error, Phase, Result};
pub use event::{
    AgentEvent, EventEnvelope, EventHandler, EventRecorder, JsonLinesEventHandler,
    NoOpEventHandler,
};
pub use state::{AgentState, Commit, Record, Role};
