//! Shared utilities for tygr
//!
//! This crate provides common functionality used across the tygr workspace,
//! including logging setup, configuration management, and text helpers.

pub mod config;
pub mod logging;
pub mod text;

pub use config::{ConfigError, LogFormat, Settings};
pub use logging::{init_tracing, init_tracing_with};
pub use text::{format_duration, truncate_text};
