//! Run-time state of an agent
//!
//! [`AgentState`] holds the conversation history, a scratch memory and the
//! termination flag. History is append-only while the state is live; once
//! [`AgentState::mark_done`] succeeds every mutator fails with
//! [`Error::InvalidState`] and leaves the state untouched.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Well-known memory keys
pub mod keys {
    /// The most recent non-empty observation seen by the agent
    pub const LAST_OBSERVATION: &str = "last_observation";
}

static NULL: Value = Value::Null;

/// Who produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the run
    System,
    /// Input from the caller
    User,
    /// Output produced by the agent itself
    Assistant,
    /// Output of a tool invocation
    Tool,
}

/// One interaction record in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Role tag
    pub role: Role,
    /// Content payload
    pub content: Value,
    /// Step that produced this record, `None` for caller-supplied records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
}

impl Record {
    /// Create a record with an arbitrary role
    pub fn new(role: Role, content: impl Into<Value>) -> Self {
        Self {
            role,
            content: content.into(),
            step: None,
        }
    }

    /// Create a system record
    pub fn system(content: impl Into<Value>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user record
    pub fn user(content: impl Into<Value>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant record
    pub fn assistant(content: impl Into<Value>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a tool record
    pub fn tool(content: impl Into<Value>) -> Self {
        Self::new(Role::Tool, content)
    }

    /// Tag the record with the step that produced it
    pub fn at_step(mut self, step: usize) -> Self {
        self.step = Some(step);
        self
    }

    /// Text content, if the payload is a plain string
    pub fn text(&self) -> Option<&str> {
        self.content.as_str()
    }
}

/// Staged changes produced by one step
///
/// A commit is built off to the side while a step runs and applied in one
/// go by [`AgentState::commit`], so a failing step never leaves a partial
/// update behind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Commit {
    /// Record to append
    pub record: Option<Record>,
    /// Memory writes, applied in key order
    pub memory: BTreeMap<String, Value>,
    /// Result to finish with
    pub result: Option<Value>,
}

impl Commit {
    /// Create an empty commit
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record to append
    pub fn with_record(mut self, record: Record) -> Self {
        self.record = Some(record);
        self
    }

    /// Add a memory write
    pub fn with_memory(mut self, key: impl Into<String>, value: Value) -> Self {
        self.memory.insert(key.into(), value);
        self
    }

    /// Finish the state with `result`
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Whether applying this commit terminates the state
    pub fn finishes(&self) -> bool {
        self.result.is_some()
    }
}

/// Run-time state of an agent
///
/// # Example
///
/// ```
/// use tygr_core::{AgentState, Record};
/// use serde_json::json;
///
/// let mut state = AgentState::with_input("scan example.com");
/// state.set_memory("target", json!("example.com")).unwrap();
/// state.append(Record::assistant("starting recon")).unwrap();
///
/// assert_eq!(state.len(), 2);
/// assert_eq!(state.get_memory("target"), &json!("example.com"));
/// assert!(state.get_memory("missing").is_null());
///
/// state.mark_done(json!({"findings": 0})).unwrap();
/// assert!(state.is_done());
/// assert!(state.append(Record::user("more")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AgentState {
    history: Vec<Record>,
    memory: BTreeMap<String, Value>,
    done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    steps: usize,
}

impl AgentState {
    /// Create an empty, live state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state seeded with one user record
    pub fn with_input(input: impl Into<Value>) -> Self {
        Self {
            history: vec![Record::user(input)],
            ..Self::default()
        }
    }

    // =========== Mutators ===========

    /// Append one record to the history
    pub fn append(&mut self, record: Record) -> Result<()> {
        self.ensure_live("append to")?;
        self.history.push(record);
        Ok(())
    }

    /// Write a scratch memory value, overwriting any previous one
    pub fn set_memory(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        self.ensure_live("write memory of")?;
        self.memory.insert(key.into(), value);
        Ok(())
    }

    /// Serialize and write a typed memory value
    pub fn set_memory_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set_memory(key, value)
    }

    /// Terminate the state with `result`
    ///
    /// `result` must not be `Value::Null`; a terminal state always carries a
    /// result.
    pub fn mark_done(&mut self, result: Value) -> Result<()> {
        self.ensure_live("finish")?;
        ensure_result(&result)?;
        self.done = true;
        self.result = Some(result);
        Ok(())
    }

    /// Apply a step's staged changes atomically
    ///
    /// The checks happen once, up front; after they pass every change is
    /// applied and the step counter advances by one.
    pub fn commit(&mut self, commit: Commit) -> Result<()> {
        self.ensure_live("commit to")?;
        if let Some(result) = &commit.result {
            ensure_result(result)?;
        }
        let Commit {
            record,
            memory,
            result,
        } = commit;

        if let Some(record) = record {
            self.history.push(record);
        }
        self.memory.extend(memory);
        if let Some(result) = result {
            self.done = true;
            self.result = Some(result);
        }
        self.steps += 1;
        Ok(())
    }

    // =========== Queries ===========

    /// Whether the state is terminal
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Read a scratch memory value, `Value::Null` when missing
    pub fn get_memory(&self, key: &str) -> &Value {
        self.memory.get(key).unwrap_or(&NULL)
    }

    /// Read and deserialize a memory value, `None` when missing
    pub fn get_memory_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        match self.memory.get(key) {
            None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    /// Whether a memory key is set
    pub fn has_memory(&self, key: &str) -> bool {
        self.memory.contains_key(key)
    }

    /// All scratch memory
    pub fn memory(&self) -> &BTreeMap<String, Value> {
        &self.memory
    }

    /// Full history, oldest first
    pub fn history(&self) -> &[Record] {
        &self.history
    }

    /// Most recent record
    pub fn last(&self) -> Option<&Record> {
        self.history.last()
    }

    /// Number of records in the history
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Number of steps committed so far
    ///
    /// Only [`commit`](Self::commit) advances this; records appended by the
    /// caller do not count, whatever their `step` tag says.
    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    /// Result of a terminal state
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    // =========== Snapshots ===========

    /// Serialize the state to a JSON snapshot
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a state from a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn ensure_live(&self, action: &str) -> Result<()> {
        if self.done {
            return Err(Error::InvalidState(format!(
                "cannot {action} a terminal agent state"
            )));
        }
        Ok(())
    }
}

fn ensure_result(result: &Value) -> Result<()> {
    if result.is_null() {
        return Err(Error::InvalidState(
            "a terminal agent state needs a non-null result".to_string(),
        ));
    }
    Ok(())
}

#[derive(Deserialize)]
struct RawState {
    #[serde(default)]
    history: Vec<Record>,
    #[serde(default)]
    memory: BTreeMap<String, Value>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    steps: usize,
}

impl TryFrom<RawState> for AgentState {
    type Error = Error;

    fn try_from(raw: RawState) -> Result<Self> {
        match (raw.done, &raw.result) {
            (true, None) => Err(Error::InvalidState(
                "terminal snapshot has no result".to_string(),
            )),
            (false, Some(_)) => Err(Error::InvalidState(
                "live snapshot carries a result".to_string(),
            )),
            _ => Ok(Self {
                history: raw.history,
                memory: raw.memory,
                done: raw.done,
                result: raw.result,
                steps: raw.steps,
            }),
        }
    }
}

impl<'de> Deserialize<'de> for AgentState {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawState::deserialize(deserializer)?;
        Self::try_from(raw).map_err(<D::Error as serde::de::Error>::custom)
    }
}
