//! Tool trait definition

use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Tools are the agent's hands: during the Acting phase the agent looks the
/// chosen tool up by name and runs it synchronously. Each tool must provide
/// a name, a description and a JSON schema for its input.
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    ///
    /// # Arguments
    ///
    /// * `params` - Tool input as JSON value (should match input_schema)
    ///
    /// # Returns
    ///
    /// Tool output as JSON value
    fn execute(&self, params: &Value) -> anyhow::Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Get the tool's description
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    ///
    /// // Example schema for a port scanner tool:
    /// let schema = json!({
    ///     "type": "object",
    ///     "properties": {
    ///         "host": { "type": "string" },
    ///         "ports": { "type": "array", "items": { "type": "integer" } }
    ///     },
    ///     "required": ["host"]
    /// });
    /// ```
    fn input_schema(&self) -> Value {
        serde_json::json!({ "type": "object" })
    }
}

type ToolFn = dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync;

/// A tool backed by a closure
///
/// # Example
///
/// ```
/// use tygr_tools::{FnTool, Tool};
/// use serde_json::json;
///
/// let echo = FnTool::new("echo", "Returns its input", |input| Ok(input.clone()));
/// assert_eq!(echo.execute(&json!({"x": 1})).unwrap(), json!({"x": 1}));
/// ```
pub struct FnTool {
    name: String,
    description: String,
    schema: Value,
    func: Box<ToolFn>,
}

impl FnTool {
    /// Create a tool from a closure
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema: serde_json::json!({ "type": "object" }),
            func: Box::new(func),
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }
}

impl Tool for FnTool {
    fn execute(&self, params: &Value) -> anyhow::Result<Value> {
        (self.func)(params)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.schema.clone()
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
