use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;
use std::sync::Arc;

use super::types::{ChatCompletion, ChatOptions, ChatRequest, ChatResponse};
use super::ChatService;
use crate::config::{ClientConfig, ModelDefaults, PROBE_TIMEOUT};
use crate::credential;
use crate::error::ChatError;
use crate::http::{HttpClient, Sleeper, TransportError};

const USER_AGENT: &str = concat!("chatapi/", env!("CARGO_PKG_VERSION"));

/// Client for the chat relay. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct ChatClient {
    config: ClientConfig,
    defaults: ModelDefaults,
    http: HttpClient,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_http_client(config, client))
    }

    /// Builds the client around an existing reqwest Client.
    pub fn with_http_client(config: ClientConfig, client: Client) -> Self {
        let http = HttpClient::new(client, config.retry_policy());
        Self {
            config,
            defaults: ModelDefaults::default(),
            http,
        }
    }

    pub fn with_defaults(mut self, defaults: ModelDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.http = self.http.with_sleeper(sleeper);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn defaults(&self) -> &ModelDefaults {
        &self.defaults
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    /// GETs the base URL with a 5-second bound. `true` iff the relay answers 2xx.
    #[tracing::instrument(skip(self))]
    pub async fn test_connection(&self) -> bool {
        match self.http.probe(&self.config.base_url, PROBE_TIMEOUT).await {
            Ok(status) => {
                debug!("Connection test: HTTP {}", status);
                status.is_success()
            }
            Err(e) => {
                error!("Connection test failed: {}", e);
                false
            }
        }
    }

    /// Sends `message` and returns the reply text.
    #[tracing::instrument(skip(self, credential, options))]
    pub async fn send_message(
        &self,
        credential: &str,
        message: &str,
        options: &ChatOptions,
    ) -> Result<String, ChatError> {
        self.complete(credential, message, options)
            .await
            .map(|completion| completion.message)
    }

    /// Sends `message` and returns the whole completion, usage included.
    #[tracing::instrument(skip(self, credential, options))]
    pub async fn complete(
        &self,
        credential: &str,
        message: &str,
        options: &ChatOptions,
    ) -> Result<ChatCompletion, ChatError> {
        credential::validate(credential)?;

        let request = ChatRequest::new(credential, message, options, &self.defaults);
        debug!("Sending {:?}", request);

        let response: ChatResponse = self
            .http
            .post_json(&self.config.chat_url(), &request)
            .await
            .map_err(surface)?;

        let completion = response.into_result()?;
        info!(
            "Received reply from {} ({} tokens)",
            completion.model.as_deref().unwrap_or("unknown model"),
            completion.usage.as_ref().map_or(0, |u| u.total_tokens)
        );
        Ok(completion)
    }

    /// GETs the base URL with a 5-second bound and returns the parsed body.
    #[tracing::instrument(skip(self))]
    pub async fn api_status(&self) -> Result<serde_json::Value, ChatError> {
        self.http
            .get_json(&self.config.base_url, PROBE_TIMEOUT)
            .await
            .map_err(surface)
    }
}

/// Logs the transport detail and reduces it to a category.
fn surface(error: TransportError) -> ChatError {
    let detail = error.to_string();
    let category = ChatError::from(error);
    warn!("Request failed: {} (reported as: {})", detail, category);
    category
}

#[async_trait]
impl ChatService for ChatClient {
    async fn send_message(
        &self,
        credential: &str,
        message: &str,
        options: &ChatOptions,
    ) -> Result<String, ChatError> {
        ChatClient::send_message(self, credential, message, options).await
    }
}
