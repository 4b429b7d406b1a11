//! Deciding: choosing the next action

use crate::{Decision, Observation};
use anyhow::anyhow;
use tygr_core::AgentState;

/// Selects the next action from the state and the latest observation
///
/// This is the seam where a model provider plugs in. Errors surface from
/// the step as a `Deciding` failure and are never retried by the agent.
#[cfg_attr(test, mockall::automock)]
pub trait Decider: Send + Sync {
    fn decide(&self, state: &AgentState, observation: &Observation) -> anyhow::Result<Decision>;
}

/// Replays a fixed list of decisions, one per step
///
/// Like [`ScriptedPerceiver`](crate::ScriptedPerceiver) the n-th step gets
/// the n-th decision. Running past the end of the script is a decide
/// failure, so a script that never finishes shows up as an error rather
/// than an endless run.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecider {
    script: Vec<Decision>,
}

impl ScriptedDecider {
    pub fn new(script: Vec<Decision>) -> Self {
        Self { script }
    }

    /// Number of scripted decisions
    pub fn len(&self) -> usize {
        self.script.len()
    }

    /// Whether the script is empty
    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl Decider for ScriptedDecider {
    fn decide(&self, state: &AgentState, _observation: &Observation) -> anyhow::Result<Decision> {
        let index = state.steps_taken();
        self.script.get(index).cloned().ok_or_else(|| {
            anyhow!(
                "decision script exhausted after {} steps",
                self.script.len()
            )
        })
    }
}

type DecideFn = dyn Fn(&AgentState, &Observation) -> anyhow::Result<Decision> + Send + Sync;

/// A decider backed by a closure
pub struct FnDecider {
    func: Box<DecideFn>,
}

impl FnDecider {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&AgentState, &Observation) -> anyhow::Result<Decision> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
        }
    }
}

impl Decider for FnDecider {
    fn decide(&self, state: &AgentState, observation: &Observation) -> anyhow::Result<Decision> {
        (self.func)(state, observation)
    }
}

impl std::fmt::Debug for FnDecider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnDecider").finish_non_exhaustive()
    }
}
