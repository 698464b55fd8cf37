//! Runtime abstraction for process-level operations.
//!
//! This module provides a trait-based abstraction over the few system
//! operations the client touches, enabling dependency injection and
//! testability.
//!
//! # Structure
//!
//! - `env` - Environment variables
//! - `user` - User interaction (line prompts)

mod env;
mod user;

use anyhow::Result;
use std::env as std_env;

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // User interaction
    /// Print `prompt` and read one line of input.
    /// Returns `None` at end of input; the trailing newline is stripped.
    fn read_line(&self, prompt: &str) -> Result<Option<String>>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        self.read_line_impl(prompt)
    }
}
