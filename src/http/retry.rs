//! Retry policy, backoff and transport error classification.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-attempt timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Backoff step: retry `n` waits `n * BACKOFF_STEP_MS`.
pub const BACKOFF_STEP_MS: u64 = 1000;

/// How a retried request is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; a request is sent at most `max_retries + 1` times.
    pub max_retries: u32,
    /// Upper bound for each individual attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Delay before retry number `retry` (1-based). Linear, no jitter.
pub fn backoff_delay(retry: u32) -> Duration {
    Duration::from_millis(BACKOFF_STEP_MS * u64::from(retry))
}

/// Failure of a single HTTP attempt, as seen by the retry loop.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The per-attempt timeout elapsed before a response arrived.
    #[error("request timed out")]
    Timeout,
    /// No response was received (refused, reset, DNS failure).
    #[error("connection failed: {0}")]
    Connect(String),
    /// A response arrived with a non-success status.
    #[error("HTTP {}: {}", .0.as_u16(), .0.canonical_reason().unwrap_or("Unknown"))]
    Status(StatusCode),
    /// The response body was not what we expected.
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Connectivity failures, timeouts and 5xx responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout | TransportError::Connect(_) => true,
            TransportError::Status(status) => status.is_server_error(),
            TransportError::Decode(_) | TransportError::Other(_) => false,
        }
    }
}

/// Classifies a reqwest error into a [`TransportError`].
pub fn classify_error(error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout;
    }

    if let Some(status) = error.status() {
        return TransportError::Status(status);
    }

    if error.is_connect() || error.is_request() || error.is_body() {
        return TransportError::Connect(error.to_string());
    }

    if error.is_decode() {
        return TransportError::Decode(error.to_string());
    }

    TransportError::Other(error.to_string())
}

/// Waits between attempts. Abstracted so backoff can be observed in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::closed_port_url;

    async fn status_error(status: usize) -> reqwest::Error {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(status)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let response = client.get(server.url()).send().await.unwrap();
        response.error_for_status().unwrap_err()
    }

    #[test]
    fn test_backoff_is_linear() {
        let delays: Vec<u64> = (1..=3).map(|n| backoff_delay(n).as_millis() as u64).collect();
        assert_eq!(delays, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_status_display() {
        let err = TransportError::Status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");

        let err = TransportError::Status(StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "HTTP 401: Unauthorized");
    }

    #[test]
    fn test_is_retryable() {
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Connect("refused".to_string()).is_retryable());
        assert!(TransportError::Status(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(TransportError::Status(StatusCode::SERVICE_UNAVAILABLE).is_retryable());

        assert!(!TransportError::Status(StatusCode::UNAUTHORIZED).is_retryable());
        assert!(!TransportError::Status(StatusCode::BAD_REQUEST).is_retryable());
        assert!(!TransportError::Status(StatusCode::NOT_FOUND).is_retryable());
        assert!(!TransportError::Decode("eof".to_string()).is_retryable());
        assert!(!TransportError::Other("builder".to_string()).is_retryable());
    }

    #[tokio::test]
    async fn test_classify_error_unauthorized() {
        let err = status_error(401).await;
        assert!(matches!(
            classify_error(&err),
            TransportError::Status(StatusCode::UNAUTHORIZED)
        ));
    }

    #[tokio::test]
    async fn test_classify_error_server_error_is_retryable() {
        let err = status_error(503).await;
        let classified = classify_error(&err);
        assert!(matches!(
            classified,
            TransportError::Status(StatusCode::SERVICE_UNAVAILABLE)
        ));
        assert!(classified.is_retryable());
    }

    #[tokio::test]
    async fn test_classify_error_connection_refused() {
        let client = reqwest::Client::new();
        let err = client.get(closed_port_url()).send().await.unwrap_err();

        let classified = classify_error(&err);
        assert!(matches!(classified, TransportError::Connect(_)));
        assert!(classified.is_retryable());
    }

    #[tokio::test]
    async fn test_classify_error_decode() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let response = client.get(server.url()).send().await.unwrap();
        let err = response.json::<serde_json::Value>().await.unwrap_err();

        assert!(matches!(classify_error(&err), TransportError::Decode(_)));
    }
}
