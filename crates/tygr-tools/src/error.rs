//! Error types for tool execution

use thiserror::Error;

/// Result type for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors that can occur while dispatching a tool
#[derive(Error, Debug)]
pub enum ToolError {
    /// No tool registered under this name
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The tool ran and failed
    #[error("Tool '{tool}' failed: {source}")]
    Execution {
        tool: String,
        #[source]
        source: anyhow::Error,
    },
}
