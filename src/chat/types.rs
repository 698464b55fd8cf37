//! Wire types for the relay's chat endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ModelDefaults;
use crate::credential;
use crate::error::ChatError;

/// Per-call overrides. Unset fields fall back to [`ModelDefaults`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Body of `POST <base><chat endpoint>`.
#[derive(Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Merges `options` over `defaults`.
    pub fn new(credential: &str, message: &str, options: &ChatOptions, defaults: &ModelDefaults) -> Self {
        Self {
            api_key: credential.to_string(),
            message: message.to_string(),
            model: Some(
                options
                    .model
                    .clone()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| defaults.model.clone()),
            ),
            temperature: Some(options.temperature.unwrap_or(defaults.temperature)),
            max_tokens: Some(options.max_tokens.unwrap_or(defaults.max_tokens)),
        }
    }
}

impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRequest")
            .field("api_key", &credential::mask(&self.api_key))
            .field("message", &self.message)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Payload of a successful envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Envelope returned by the chat endpoint.
///
/// `error` and `code` are kept as raw JSON: relays send them as strings,
/// numbers or objects, and their shape must not hide `message`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<ChatCompletion>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<Value>,
}

impl ChatResponse {
    /// Extracts the completion, or the failure the envelope describes.
    pub fn into_result(self) -> Result<ChatCompletion, ChatError> {
        if self.success {
            if let Some(data) = self.data.filter(|d| !d.message.is_empty()) {
                return Ok(data);
            }
        }

        let reported = self
            .message
            .filter(|m| !m.is_empty())
            .or_else(|| self.error.as_ref().and_then(error_text));

        match reported {
            Some(text) => Err(ChatError::from_api_message(&text)),
            None => Err(ChatError::MalformedResponse),
        }
    }
}

/// Text of an envelope `error`: the string itself, or the `message` of an
/// error object.
fn error_text(error: &Value) -> Option<String> {
    let text = match error {
        Value::String(text) => text.as_str(),
        Value::Object(fields) => fields.get("message").and_then(Value::as_str)?,
        _ => return None,
    };
    (!text.is_empty()).then(|| text.to_string())
}
