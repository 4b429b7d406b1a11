//! Core agent trait definition

use crate::{AgentState, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What a single step did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// The state is still live
    Continue,
    /// The step finished the state
    Finished,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The state is terminal
    Completed,
    /// The step limit ran out first; the state is still live
    Truncated,
}

/// Summary returned by [`BaseAgent::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Steps executed during this run
    pub steps: usize,
    /// How the run ended
    pub status: RunStatus,
}

impl RunOutcome {
    /// Whether the run stopped at the step limit
    pub fn is_truncated(&self) -> bool {
        self.status == RunStatus::Truncated
    }

    /// Whether the state ended terminal
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Treat truncation as an error
    pub fn into_result(self) -> Result<Self> {
        match self.status {
            RunStatus::Completed => Ok(self),
            RunStatus::Truncated => Err(Error::Truncated { steps: self.steps }),
        }
    }
}

/// Execution contract every agent implements
///
/// Implementors provide [`step`](BaseAgent::step); [`run`](BaseAgent::run)
/// drives it in a bounded loop. The trait is object safe, so callers can
/// hold any agent as `&dyn BaseAgent` or `Box<dyn BaseAgent>`.
pub trait BaseAgent: Send + Sync {
    /// Get the agent's name
    fn name(&self) -> &str;

    /// Execute one unit of work over a live state
    ///
    /// Must fail with [`Error::AlreadyDone`] on a terminal state without
    /// touching it. On any other failure the state must be left exactly as
    /// it was before the call.
    fn step(&self, state: &mut AgentState) -> Result<StepOutcome>;

    /// Step until the state is terminal or `max_steps` steps have run
    ///
    /// The first failing step aborts the run; `state` then holds the last
    /// committed step, which is the caller's recovery point.
    fn run(&self, state: &mut AgentState, max_steps: usize) -> Result<RunOutcome> {
        let mut steps = 0;

        for _ in 0..max_steps {
            if state.is_done() {
                break;
            }
            self.step(state)?;
            steps += 1;
        }

        if state.is_done() {
            info!(agent = self.name(), steps, "Run completed");
            Ok(RunOutcome {
                steps,
                status: RunStatus::Completed,
            })
        } else {
            if max_steps == 0 {
                debug!(agent = self.name(), "Run requested with zero steps");
            } else {
                warn!(agent = self.name(), steps, max_steps, "Step limit reached, run truncated");
            }
            Ok(RunOutcome {
                steps,
                status: RunStatus::Truncated,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Appends one record per step and finishes on `finish_at`
    struct CountingAgent {
        finish_at: Option<usize>,
        fail_at: Option<usize>,
        calls: AtomicUsize,
    }

    impl CountingAgent {
        fn finishing_at(n: usize) -> Self {
            Self {
                finish_at: Some(n),
                fail_at: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn never_finishing() -> Self {
            Self {
                finish_at: None,
                fail_at: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl BaseAgent for CountingAgent {
        fn name(&self) -> &str {
            "counting"
        }

        fn step(&self, state: &mut AgentState) -> Result<StepOutcome> {
            if state.is_done() {
                return Err(Error::AlreadyDone);
            }
            let step = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_at == Some(step) {
                return Err(Error::StepExecution {
                    agent: self.name().to_string(),
                    step,
                    phase: crate::Phase::Acting,
                    source: anyhow::anyhow!("boom"),
                });
            }
            state.append(Record::assistant(format!("step {step}")).at_step(step))?;
            if self.finish_at == Some(step) {
                state.mark_done(json!({ "steps": step }))?;
                return Ok(StepOutcome::Finished);
            }
            Ok(StepOutcome::Continue)
        }
    }

    #[test]
    fn test_run_zero_steps_leaves_state_unchanged() {
        let agent = CountingAgent::finishing_at(1);
        let mut state = AgentState::with_input("go");
        let before = state.clone();

        let outcome = agent.run(&mut state, 0).unwrap();

        assert_eq!(state, before);
        assert_eq!(outcome.steps, 0);
        assert!(outcome.is_truncated());
        assert_eq!(agent.calls(), 0);
    }

    #[test]
    fn test_run_stops_early_when_done() {
        let agent = CountingAgent::finishing_at(2);
        let mut state = AgentState::new();

        let outcome = agent.run(&mut state, 5).unwrap();

        assert_eq!(agent.calls(), 2);
        assert_eq!(outcome.steps, 2);
        assert!(outcome.is_completed());
        assert_eq!(state.len(), 2);
        assert!(state.is_done());
        assert!(state.result().is_some());
    }

    #[test]
    fn test_run_calls_step_at_most_max_steps() {
        let agent = CountingAgent::never_finishing();
        let mut state = AgentState::new();

        let outcome = agent.run(&mut state, 3).unwrap();

        assert_eq!(agent.calls(), 3);
        assert_eq!(state.len(), 3);
        assert!(!state.is_done());
        assert!(matches!(
            outcome.into_result(),
            Err(Error::Truncated { steps: 3 })
        ));
    }

    #[test]
    fn test_run_on_terminal_state_does_not_step() {
        let agent = CountingAgent::finishing_at(1);
        let mut state = AgentState::new();
        state.mark_done(json!("already")).unwrap();

        let outcome = agent.run(&mut state, 4).unwrap();

        assert_eq!(agent.calls(), 0);
        assert_eq!(outcome.steps, 0);
        assert!(outcome.is_completed());
    }

    #[test]
    fn test_run_propagates_step_failure() {
        let agent = CountingAgent {
            finish_at: None,
            fail_at: Some(3),
            calls: AtomicUsize::new(0),
        };
        let mut state = AgentState::new();

        let err = agent.run(&mut state, 10).unwrap_err();

        assert!(matches!(err, Error::StepExecution { step: 3, .. }));
        assert_eq!(state.len(), 2);
        assert_eq!(agent.calls(), 3);
    }

    #[test]
    fn test_trait_object_substitution() {
        let agents: Vec<Box<dyn BaseAgent>> = vec![
            Box::new(CountingAgent::finishing_at(1)),
            Box::new(CountingAgent::finishing_at(3)),
        ];

        for agent in &agents {
            let mut state = AgentState::new();
            let outcome = agent.run(&mut state, 10).unwrap();
            assert!(outcome.is_completed());
            assert!(matches!(agent.step(&mut state), Err(Error::AlreadyDone)));
        }
    }
}
