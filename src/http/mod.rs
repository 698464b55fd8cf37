//! HTTP client module with retry logic and error classification.

mod client;
mod retry;

pub use client::HttpClient;
#[cfg(test)]
pub use retry::MockSleeper;
pub use retry::{
    BACKOFF_STEP_MS, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MS, RetryPolicy, Sleeper, TokioSleeper,
    TransportError, backoff_delay, classify_error,
};
