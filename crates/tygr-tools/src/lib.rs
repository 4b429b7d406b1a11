//! Tool management and execution framework for tygr
//!
//! This crate provides a framework for defining and executing tools that an
//! agent invokes while acting.

pub mod error;
pub mod registry;
pub mod tool;

pub use error::{Result, ToolError};
pub use registry::ToolRegistry;
pub use tool::{FnTool, Tool};
