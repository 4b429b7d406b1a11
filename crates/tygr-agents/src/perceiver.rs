//! Perceiving: where observations come from

use crate::Observation;
use serde_json::Value;
use tygr_core::AgentState;

/// Supplies the latest observation at the start of each step
///
/// Implementations typically poll a tool-output queue, a scanner process or
/// a user channel. They only read the state; anything they need to remember
/// goes through the decision's memory writes.
#[cfg_attr(test, mockall::automock)]
pub trait Perceiver: Send + Sync {
    fn perceive(&self, state: &AgentState) -> anyhow::Result<Observation>;
}

/// Never observes anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPerceiver;

impl Perceiver for NullPerceiver {
    fn perceive(&self, _state: &AgentState) -> anyhow::Result<Observation> {
        Ok(Observation::none())
    }
}

/// Replays one observation per step, by step number
///
/// The n-th step (counted with [`AgentState::steps_taken`]) sees the n-th
/// observation; steps past the end see nothing. Because the choice depends
/// only on the state, re-running a failed step observes the same thing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPerceiver {
    observations: Vec<Value>,
}

impl ScriptedPerceiver {
    pub fn new(observations: Vec<Value>) -> Self {
        Self { observations }
    }
}

impl Perceiver for ScriptedPerceiver {
    fn perceive(&self, state: &AgentState) -> anyhow::Result<Observation> {
        Ok(self
            .observations
            .get(state.steps_taken())
            .cloned()
            .map_or_else(Observation::none, Observation::new))
    }
}
