//! TYGR agents
//!
//! The package entry point. It exposes the three pieces a host needs:
//!
//! - [`AgentState`]: the run-time state an agent advances
//! - [`BaseAgent`]: the `step`/`run` execution contract
//! - [`TygrAgent`]: the concrete perceive, decide, act agent
//!
//! plus the collaborator traits ([`Perceiver`], [`Decider`]) through which
//! observations and decisions reach the agent.
//!
//! # Example
//!
//! ```
//! use tygr_agents::{Action, AgentState, BaseAgent, ScriptedDecider, TygrAgent};
//! use serde_json::json;
//!
//! let agent = TygrAgent::builder()
//!     .name("recon")
//!     .decider(ScriptedDecider::new(vec![
//!         Action::respond("enumerating subdomains").into(),
//!         Action::finish(json!({"subdomains": 3})).into(),
//!     ]))
//!     .build()
//!     .unwrap();
//!
//! let mut state = AgentState::with_input("scan example.com");
//! let outcome = agent.run(&mut state, 5).unwrap();
//!
//! assert!(outcome.is_completed());
//! assert_eq!(state.result(), Some(&json!({"subdomains": 3})));
//! ```

pub mod action;
pub mod agent;
pub mod config;
pub mod decider;
pub mod perceiver;

pub use action::{Action, Decision, Observation};
pub use agent::{TygrAgent, TygrAgentBuilder};
pub use config::AgentConfig;
pub use decider::{Decider, FnDecider, ScriptedDecider};
pub use perceiver::{NullPerceiver, Perceiver, ScriptedPerceiver};

pub use tygr_core::{
    AgentEvent, AgentState, BaseAgent, Error, EventHandler, Phase, Record, Result, Role,
    RunOutcome, RunStatus, StepOutcome,
};
pub use tygr_tools::{FnTool, Tool, ToolRegistry};
