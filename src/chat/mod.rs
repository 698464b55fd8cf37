//! Chat relay client.
//!
//! [`ChatClient`] validates the credential, sends the message through the
//! retrying [`crate::http::HttpClient`] and turns every failure into a
//! [`ChatError`] category.

mod client;
mod diagnose;
mod types;

use async_trait::async_trait;

pub use client::ChatClient;
pub use diagnose::{Check, CheckStatus, CorsHeaders, DiagnosticReport, INVALID_PROBE_KEY};
pub use types::{ChatCompletion, ChatOptions, ChatRequest, ChatResponse, Usage};

use crate::error::ChatError;

/// Sends one message and yields the reply text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn send_message(
        &self,
        credential: &str,
        message: &str,
        options: &ChatOptions,
    ) -> Result<String, ChatError>;
}
