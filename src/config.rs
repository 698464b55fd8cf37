//! Client configuration and model defaults.

use log::debug;
use std::time::Duration;

use crate::http::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MS, RetryPolicy};
use crate::runtime::Runtime;

/// Relay address when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8787";

/// Relay address behind the local development proxy.
pub const DEV_PROXY_BASE_URL: &str = "http://localhost:5173/api";

pub const DEFAULT_CHAT_ENDPOINT: &str = "/chat";

/// Bound for the liveness and status probes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub const BASE_URL_ENV: &str = "CHATAPI_BASE_URL";
pub const ENVIRONMENT_ENV: &str = "CHATAPI_ENV";

/// Where and how requests are sent. Read once, then shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub chat_endpoint: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ClientConfig {
    /// Builds the configuration, resolving the base URL as:
    /// explicit value, then `CHATAPI_BASE_URL`, then the development proxy
    /// when `CHATAPI_ENV=development`, then [`DEFAULT_BASE_URL`].
    pub fn from_runtime<R: Runtime>(runtime: &R, base_url: Option<String>) -> Self {
        let base_url = resolve_base_url(runtime, base_url);
        debug!("Using relay base URL: {}", base_url);

        Self {
            base_url,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Full URL of the chat endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url, self.chat_endpoint)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            timeout: self.timeout,
        }
    }
}

fn resolve_base_url<R: Runtime>(runtime: &R, explicit: Option<String>) -> String {
    let non_empty = |value: String| {
        let trimmed = value.trim().trim_end_matches('/').to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    };

    if let Some(url) = explicit.and_then(non_empty) {
        return url;
    }

    if let Some(url) = runtime.env_var(BASE_URL_ENV).ok().and_then(non_empty) {
        return url;
    }

    match runtime.env_var(ENVIRONMENT_ENV) {
        Ok(env) if env == "development" => DEV_PROXY_BASE_URL.to_string(),
        _ => DEFAULT_BASE_URL.to_string(),
    }
}

/// Values used for any option the caller leaves unset.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefaults {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}
