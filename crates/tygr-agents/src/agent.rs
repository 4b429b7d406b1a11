//! The TYGR agent: a perceive, decide, act state machine
//!
//! Each [`step`](BaseAgent::step) runs one full cycle:
//!
//! 1. **Perceiving**: ask the [`Perceiver`] for the latest observation
//! 2. **Deciding**: ask the [`Decider`] for the next [`Action`]
//! 3. **Acting**: stage the record, memory writes and (for `Finish`) the
//!    result, running a tool first for `Invoke`
//!
//! All three phases only read the state. The staged [`Commit`] is applied
//! at the very end, so a failure in any phase leaves the state exactly as
//! it was.

use crate::{Action, AgentConfig, Decider, Decision, NullPerceiver, Observation, Perceiver};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};
use tygr_core::state::keys;
use tygr_core::{
    AgentEvent, AgentState, BaseAgent, Commit, Error, EventEnvelope, EventHandler,
    NoOpEventHandler, Phase, Record, Result, RunOutcome, StepOutcome,
};
use tygr_tools::ToolRegistry;
use tygr_utils::{format_duration, truncate_text};

const PREVIEW_CHARS: usize = 200;

/// Concrete agent implementing [`BaseAgent`]
///
/// The agent holds configuration and collaborators only; the state it
/// advances is borrowed for one step at a time.
///
/// # Example
///
/// ```
/// use tygr_agents::{Action, AgentState, BaseAgent, FnTool, ScriptedDecider, ToolRegistry, TygrAgent};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let tools = ToolRegistry::new().with_tool(Arc::new(FnTool::new(
///     "port_scan",
///     "Scan a host for open ports",
///     |_| Ok(json!([22, 443])),
/// )));
///
/// let agent = TygrAgent::builder()
///     .decider(ScriptedDecider::new(vec![
///         Action::invoke("port_scan", json!({"host": "example.com"})).into(),
///         Action::finish(json!({"open": 2})).into(),
///     ]))
///     .tools(Arc::new(tools))
///     .build()
///     .unwrap();
///
/// let mut state = AgentState::new();
/// agent.step(&mut state).unwrap();
/// assert_eq!(state.history()[0].content["output"], json!([22, 443]));
/// ```
pub struct TygrAgent {
    config: AgentConfig,
    perceiver: Arc<dyn Perceiver>,
    decider: Arc<dyn Decider>,
    tools: Arc<ToolRegistry>,
    event_handler: Arc<dyn EventHandler>,
}

impl TygrAgent {
    /// Create an agent with no perceiver, no tools and no event handler
    ///
    /// Validates `config` the same way [`TygrAgentBuilder::build`] does.
    pub fn new(config: AgentConfig, decider: Arc<dyn Decider>) -> Result<Self> {
        Self::builder()
            .config(config)
            .shared_decider(decider)
            .build()
    }

    /// Create a new agent builder
    pub fn builder() -> TygrAgentBuilder {
        TygrAgentBuilder::new()
    }

    /// Get the agent's configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Get the agent's tool registry
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Run with the configured step limit
    pub fn run_to_limit(&self, state: &mut AgentState) -> Result<RunOutcome> {
        let started = Instant::now();
        let outcome = self.run(state, self.config.max_steps)?;
        info!(
            agent = %self.config.name,
            steps = outcome.steps,
            status = ?outcome.status,
            elapsed = %format_duration(started.elapsed()),
            "Run finished"
        );
        Ok(outcome)
    }

    /// Perceive, decide and act without touching the state
    fn cycle(
        &self,
        state: &AgentState,
        step: usize,
    ) -> std::result::Result<Commit, (Phase, anyhow::Error)> {
        self.enter(step, Phase::Perceiving);
        let observation = self
            .perceiver
            .perceive(state)
            .map_err(|e| (Phase::Perceiving, e))?;

        self.enter(step, Phase::Deciding);
        let decision = self
            .decider
            .decide(state, &observation)
            .map_err(|e| (Phase::Deciding, e))?;
        debug!(
            agent = %self.config.name,
            step,
            action = decision.action.kind(),
            memory_writes = decision.memory.len(),
            "Decision made"
        );

        self.enter(step, Phase::Acting);
        self.act(step, decision, observation)
            .map_err(|e| (Phase::Acting, e))
    }

    fn act(
        &self,
        step: usize,
        decision: Decision,
        observation: Observation,
    ) -> anyhow::Result<Commit> {
        let Decision { action, memory } = decision;

        let mut commit = match action {
            Action::Respond { content } => Commit::new().with_record(Record::assistant(content)),
            Action::Invoke { tool, input } => {
                let output = self.invoke(step, &tool, &input)?;
                Commit::new().with_record(Record::tool(json!({
                    "tool": tool,
                    "input": input,
                    "output": output,
                })))
            }
            Action::Finish { result } => {
                if result.is_null() {
                    anyhow::bail!("finish action carries no result");
                }
                Commit::new()
                    .with_record(Record::assistant(result.clone()))
                    .with_result(result)
            }
        };

        if let Some(record) = commit.record.take() {
            commit.record = Some(record.at_step(step));
        }
        commit.memory.extend(memory);
        if !observation.is_empty() {
            commit
                .memory
                .insert(keys::LAST_OBSERVATION.to_string(), observation.into_content());
        }
        Ok(commit)
    }

    fn invoke(&self, step: usize, tool: &str, input: &Value) -> anyhow::Result<Value> {
        debug!(
            agent = %self.config.name,
            step,
            tool,
            input = %truncate_text(&input.to_string(), PREVIEW_CHARS),
            "Executing tool"
        );

        let started = Instant::now();
        let result = self.tools.execute(tool, input);
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.emit(AgentEvent::ToolExecuted {
            agent: self.config.name.clone(),
            step,
            tool: tool.to_string(),
            success: result.is_ok(),
            duration_ms,
        });

        match result {
            Ok(output) => {
                debug!(agent = %self.config.name, step, tool, duration_ms, "Tool completed");
                Ok(output)
            }
            Err(e) => {
                warn!(agent = %self.config.name, step, tool, duration_ms, error = %e, "Tool failed");
                Err(e.into())
            }
        }
    }

    fn enter(&self, step: usize, phase: Phase) {
        debug!(agent = %self.config.name, step, %phase, "Entering phase");
        self.emit(AgentEvent::PhaseChanged {
            agent: self.config.name.clone(),
            step,
            phase,
        });
    }

    fn emit(&self, event: AgentEvent) {
        self.event_handler.on_event(&EventEnvelope::now(event));
    }
}

impl BaseAgent for TygrAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn step(&self, state: &mut AgentState) -> Result<StepOutcome> {
        if state.is_done() {
            return Err(Error::AlreadyDone);
        }

        let step = state.steps_taken() + 1;
        let span = info_span!("agent_step", agent = %self.config.name, step);
        let _guard = span.enter();

        info!(history_len = state.len(), "Agent step started");
        self.emit(AgentEvent::StepStarted {
            agent: self.config.name.clone(),
            step,
        });

        let commit = match self.cycle(state, step) {
            Ok(commit) => commit,
            Err((phase, source)) => {
                warn!(%phase, error = %source, "Agent step failed, state left unchanged");
                self.emit(AgentEvent::StepFailed {
                    agent: self.config.name.clone(),
                    step,
                    phase,
                    error: source.to_string(),
                });
                return Err(Error::StepExecution {
                    agent: self.config.name.clone(),
                    step,
                    phase,
                    source,
                });
            }
        };

        if let Some(record) = &commit.record {
            debug!(
                role = ?record.role,
                content = %truncate_text(&record.content.to_string(), PREVIEW_CHARS),
                "Committing record"
            );
        }
        let result = commit.result.clone();
        state.commit(commit)?;

        self.emit(AgentEvent::StepCommitted {
            agent: self.config.name.clone(),
            step,
            history_len: state.len(),
        });

        match result {
            Some(result) => {
                info!(history_len = state.len(), "Agent finished");
                self.emit(AgentEvent::Finished {
                    agent: self.config.name.clone(),
                    step,
                    result,
                });
                Ok(StepOutcome::Finished)
            }
            None => Ok(StepOutcome::Continue),
        }
    }
}

impl std::fmt::Debug for TygrAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TygrAgent")
            .field("config", &self.config)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TygrAgent`]
#[derive(Default)]
pub struct TygrAgentBuilder {
    config: AgentConfig,
    perceiver: Option<Arc<dyn Perceiver>>,
    decider: Option<Arc<dyn Decider>>,
    tools: Option<Arc<ToolRegistry>>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl TygrAgentBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the agent name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the step limit used by `run_to_limit`
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.config.max_steps = max_steps;
        self
    }

    /// Set the perceiver (defaults to [`NullPerceiver`])
    pub fn perceiver(mut self, perceiver: impl Perceiver + 'static) -> Self {
        self.perceiver = Some(Arc::new(perceiver));
        self
    }

    /// Set a shared perceiver
    pub fn shared_perceiver(mut self, perceiver: Arc<dyn Perceiver>) -> Self {
        self.perceiver = Some(perceiver);
        self
    }

    /// Set the decider (required)
    pub fn decider(mut self, decider: impl Decider + 'static) -> Self {
        self.decider = Some(Arc::new(decider));
        self
    }

    /// Set a shared decider
    pub fn shared_decider(mut self, decider: Arc<dyn Decider>) -> Self {
        self.decider = Some(decider);
        self
    }

    /// Set the tool registry (defaults to an empty one)
    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the event handler (defaults to [`NoOpEventHandler`])
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<TygrAgent> {
        let decider = self
            .decider
            .ok_or_else(|| Error::Configuration("a decider is required".to_string()))?;

        if self.config.name.trim().is_empty() {
            return Err(Error::Configuration(
                "agent name must not be empty".to_string(),
            ));
        }

        Ok(TygrAgent {
            config: self.config,
            perceiver: self.perceiver.unwrap_or_else(|| Arc::new(NullPerceiver)),
            decider,
            tools: self
                .tools
                .unwrap_or_else(|| Arc::new(ToolRegistry::new())),
            event_handler: self
                .event_handler
                .unwrap_or_else(|| Arc::new(NoOpEventHandler)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decider::MockDecider;
    use crate::perceiver::MockPerceiver;
    use crate::{FnDecider, ScriptedDecider, ScriptedPerceiver};
    use tygr_core::{EventRecorder, JsonLinesEventHandler, Role};
    use tygr_tools::FnTool;

    fn scripted(script: Vec<Action>) -> TygrAgent {
        TygrAgent::builder()
            .name("test-agent")
            .decider(ScriptedDecider::new(
                script.into_iter().map(Decision::from).collect(),
            ))
            .build()
            .unwrap()
    }

    fn failing_decider() -> MockDecider {
        let mut decider = MockDecider::new();
        decider
            .expect_decide()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("model unavailable")));
        decider
    }

    #[test]
    fn test_build_requires_decider() {
        let err = TygrAgent::builder().build().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_build_rejects_empty_name() {
        let err = TygrAgent::builder()
            .name("  ")
            .decider(ScriptedDecider::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_new_rejects_empty_name() {
        let config = AgentConfig {
            name: String::new(),
            ..AgentConfig::default()
        };
        let err = TygrAgent::new(config, Arc::new(ScriptedDecider::default())).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_respond_step_appends_one_record() {
        let agent = scripted(vec![Action::respond("thinking")]);
        let mut state = AgentState::with_input("go");

        let outcome = agent.step(&mut state).unwrap();

        assert_eq!(outcome, StepOutcome::Continue);
        assert_eq!(state.len(), 2);
        assert!(!state.is_done());
        let last = state.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text(), Some("thinking"));
        assert_eq!(last.step, Some(1));
    }

    #[test]
    fn test_finish_after_two_steps() {
        let agent = scripted(vec![
            Action::respond("enumerating"),
            Action::finish(json!({"findings": 1})),
        ]);
        let mut state = AgentState::new();

        let outcome = agent.run(&mut state, 5).unwrap();

        assert_eq!(outcome.steps, 2);
        assert!(outcome.is_completed());
        assert_eq!(state.len(), 2);
        assert!(state.is_done());
        assert_eq!(state.result(), Some(&json!({"findings": 1})));
    }

    #[test]
    fn test_step_on_done_state_fails() {
        let agent = scripted(vec![Action::finish("done")]);
        let mut state = AgentState::new();
        agent.step(&mut state).unwrap();
        let snapshot = state.clone();

        let err = agent.step(&mut state).unwrap_err();

        assert!(matches!(err, Error::AlreadyDone));
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_run_zero_steps_is_noop() {
        let mut decider = MockDecider::new();
        decider.expect_decide().never();
        let agent = TygrAgent::new(AgentConfig::default(), Arc::new(decider)).unwrap();
        let mut state = AgentState::with_input("go");
        let before = state.clone();

        let outcome = agent.run(&mut state, 0).unwrap();

        assert_eq!(outcome.steps, 0);
        assert!(outcome.is_truncated());
        assert_eq!(state, before);
    }

    #[test]
    fn test_run_truncates_at_limit() {
        let agent = TygrAgent::builder()
            .decider(FnDecider::new(|_, _| Ok(Action::respond("still going").into())))
            .max_steps(3)
            .build()
            .unwrap();
        let mut state = AgentState::new();

        let outcome = agent.run_to_limit(&mut state).unwrap();

        assert!(outcome.is_truncated());
        assert_eq!(outcome.steps, 3);
        assert_eq!(state.len(), 3);
        assert!(!state.is_done());
    }

    #[test]
    fn test_decide_failure_leaves_state_untouched() {
        let agent = TygrAgent::builder()
            .perceiver(ScriptedPerceiver::new(vec![json!("banner: nginx")]))
            .decider(failing_decider())
            .build()
            .unwrap();
        let mut state = AgentState::with_input("go");
        state.set_memory("k", json!(1)).unwrap();
        let before = state.clone();

        let err = agent.step(&mut state).unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Deciding));
        assert!(matches!(err, Error::StepExecution { step: 1, .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_perceive_failure_skips_decider() {
        let mut perceiver = MockPerceiver::new();
        perceiver
            .expect_perceive()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("sensor offline")));
        let mut decider = MockDecider::new();
        decider.expect_decide().never();

        let agent = TygrAgent::builder()
            .perceiver(perceiver)
            .decider(decider)
            .build()
            .unwrap();
        let mut state = AgentState::new();

        let err = agent.step(&mut state).unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Perceiving));
        assert!(state.is_empty());
    }

    #[test]
    fn test_unknown_tool_is_acting_failure() {
        let agent = TygrAgent::builder()
            .decider(ScriptedDecider::new(vec![
                Decision::new(Action::invoke("nmap", json!({}))).remember("k", "v"),
            ]))
            .build()
            .unwrap();
        let mut state = AgentState::new();

        let err = agent.step(&mut state).unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Acting));
        assert!(err.to_string().contains("Tool not found: nmap"));
        assert!(state.is_empty());
        assert!(!state.has_memory("k"));
    }

    #[test]
    fn test_finish_without_result_is_rejected() {
        let agent = scripted(vec![Action::finish(Value::Null)]);
        let mut state = AgentState::new();

        let err = agent.step(&mut state).unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Acting));
        assert!(!state.is_done());
    }

    #[test]
    fn test_tool_step_records_output_and_memory() {
        let tools = ToolRegistry::new().with_tool(Arc::new(FnTool::new(
            "dns_lookup",
            "Resolve a host",
            |input| Ok(json!({"host": input["host"], "ip": "93.184.216.34"})),
        )));
        let agent = TygrAgent::builder()
            .perceiver(ScriptedPerceiver::new(vec![json!("target acquired")]))
            .decider(ScriptedDecider::new(vec![
                Decision::new(Action::invoke("dns_lookup", json!({"host": "example.com"})))
                    .remember("phase", "recon"),
            ]))
            .tools(Arc::new(tools))
            .build()
            .unwrap();
        let mut state = AgentState::new();

        agent.step(&mut state).unwrap();

        let record = state.last().unwrap();
        assert_eq!(record.role, Role::Tool);
        assert_eq!(record.content["tool"], "dns_lookup");
        assert_eq!(record.content["output"]["ip"], "93.184.216.34");
        assert_eq!(state.get_memory("phase"), &json!("recon"));
        assert_eq!(
            state.get_memory(keys::LAST_OBSERVATION),
            &json!("target acquired")
        );
    }

    #[test]
    fn test_failed_run_keeps_last_good_state() {
        let agent = TygrAgent::builder()
            .decider(FnDecider::new(|state, _| {
                if state.steps_taken() < 2 {
                    Ok(Action::respond("ok").into())
                } else {
                    anyhow::bail!("rate limited")
                }
            }))
            .build()
            .unwrap();
        let mut state = AgentState::new();

        let err = agent.run(&mut state, 10).unwrap_err();

        assert!(matches!(err, Error::StepExecution { step: 3, .. }));
        assert_eq!(state.len(), 2);

        // Retrying from the recovery point resumes at the same step
        let err = agent.step(&mut state).unwrap_err();
        assert!(matches!(err, Error::StepExecution { step: 3, .. }));
    }

    #[test]
    fn test_events_per_step() {
        let recorder = Arc::new(EventRecorder::new());
        let agent = TygrAgent::builder()
            .decider(ScriptedDecider::new(vec![Action::finish("done").into()]))
            .event_handler(recorder.clone())
            .build()
            .unwrap();
        let mut state = AgentState::new();

        agent.step(&mut state).unwrap();

        let kinds: Vec<String> = recorder
            .events()
            .iter()
            .map(|e| serde_json::to_value(e).unwrap()["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "step_started",
                "agent_state_change",
                "agent_state_change",
                "agent_state_change",
                "step_committed",
                "finished",
            ]
        );
    }

    #[test]
    fn test_failed_step_emits_step_failed() {
        let recorder = Arc::new(EventRecorder::new());
        let agent = TygrAgent::builder()
            .decider(failing_decider())
            .event_handler(recorder.clone())
            .build()
            .unwrap();

        let _ = agent.step(&mut AgentState::new());

        let events = recorder.events();
        assert!(matches!(
            events.last(),
            Some(AgentEvent::StepFailed { phase: Phase::Deciding, .. })
        ));
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, AgentEvent::StepCommitted { .. }))
        );
    }

    /// Sink that rejects every write
    struct ClosedPipe;

    impl std::io::Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "dashboard went away",
            ))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "dashboard went away",
            ))
        }
    }

    #[test]
    fn test_event_write_failure_does_not_fail_step() {
        let agent = TygrAgent::builder()
            .decider(ScriptedDecider::new(vec![
                Action::respond("recon").into(),
                Action::finish(json!({"findings": 0})).into(),
            ]))
            .event_handler(Arc::new(JsonLinesEventHandler::new(ClosedPipe)))
            .build()
            .unwrap();
        let mut state = AgentState::new();

        let outcome = agent.run(&mut state, 5).unwrap();

        assert!(outcome.is_completed());
        assert_eq!(state.len(), 2);
        assert_eq!(state.result(), Some(&json!({"findings": 0})));
    }

    #[test]
    fn test_tool_events_report_failure() {
        let tools = ToolRegistry::new().with_tool(Arc::new(FnTool::new(
            "banner_grab",
            "Always times out",
            |_| anyhow::bail!("timed out"),
        )));
        let recorder = Arc::new(EventRecorder::new());
        let agent = TygrAgent::builder()
            .decider(ScriptedDecider::new(vec![
                Action::invoke("banner_grab", Value::Null).into(),
            ]))
            .tools(Arc::new(tools))
            .event_handler(recorder.clone())
            .build()
            .unwrap();

        assert!(agent.step(&mut AgentState::new()).is_err());

        assert!(recorder.events().iter().any(|e| matches!(
            e,
            AgentEvent::ToolExecuted { success: false, tool, .. } if tool == "banner_grab"
        )));
    }

    #[test]
    fn test_polymorphic_use() {
        let agent: Box<dyn BaseAgent> = Box::new(scripted(vec![Action::finish(json!(true))]));
        let mut state = AgentState::new();

        assert_eq!(agent.name(), "test-agent");
        assert_eq!(agent.step(&mut state).unwrap(), StepOutcome::Finished);
    }
}
