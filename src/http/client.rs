//! HTTP client with bounded attempts and linear-backoff retry.

use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use super::retry::{RetryPolicy, Sleeper, TokioSleeper, TransportError, backoff_delay, classify_error};

/// HTTP client with built-in retry logic for the chat relay.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replaces the backoff sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// POSTs `body` as JSON and deserializes the JSON response.
    /// Each attempt is bounded by the policy timeout; transient errors are retried.
    #[tracing::instrument(skip(self, body))]
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST JSON to {}...", url);

        self.with_retry("POST JSON", || async {
            let response = self
                .client
                .post(url)
                .timeout(self.policy.timeout)
                .json(body)
                .send()
                .await
                .map_err(|e| classify_error(&e))?;

            let response = response.error_for_status().map_err(|e| classify_error(&e))?;

            response.json::<T>().await.map_err(|e| classify_error(&e))
        })
        .await
    }

    /// Performs a single GET bounded by `timeout` and deserializes the JSON response.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<T, TransportError> {
        debug!("GET JSON from {}...", url);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(&e))?;

        let response = response.error_for_status().map_err(|e| classify_error(&e))?;

        response.json::<T>().await.map_err(|e| classify_error(&e))
    }

    /// Performs a single GET bounded by `timeout` and returns the status,
    /// whatever it is. Only transport failures are errors.
    #[tracing::instrument(skip(self))]
    pub async fn probe(&self, url: &str, timeout: Duration) -> Result<StatusCode, TransportError> {
        debug!("Probing {}...", url);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(&e))?;

        Ok(response.status())
    }

    /// Runs `operation` up to `max_retries + 1` times.
    /// Retry `n` is preceded by a `backoff_delay(n)` wait; non-retryable errors return at once.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, TransportError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, TransportError>>,
    {
        let max_retries = self.policy.max_retries;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "{}: retrying ({}/{}) in {}ms...",
                    operation_name,
                    attempt,
                    max_retries,
                    delay.as_millis()
                );
                self.sleeper.sleep(delay).await;
            }

            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_retryable() => {
                    debug!("{}: non-retryable error: {}", operation_name, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("{}: attempt {} failed ({})", operation_name, attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            TransportError::Other(format!("{}: no attempt was made", operation_name))
        }))
    }
}
