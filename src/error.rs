//! User-facing failure categories.
//!
//! Every failure that leaves [`crate::ChatClient`] is one of these. Transport
//! details are logged where the failure is mapped and never carried in the
//! displayed message.

use reqwest::StatusCode;
use thiserror::Error;

use crate::credential::CredentialError;
use crate::http::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Network connection error, please check your connection")]
    Network,
    #[error("Invalid API key format, please check your OpenAI API key")]
    CredentialInvalid,
    #[error("Please set your OpenAI API key first")]
    CredentialMissing,
    #[error("Server error, please try again later")]
    Server,
    #[error("Request timed out, please try again later")]
    Timeout,
    #[error("Cross-origin request blocked, please check the server configuration")]
    Cors,
    #[error("Unknown error, please try again later")]
    Unknown,
    /// The relay answered `success: false`; shown verbatim.
    #[error("{0}")]
    Api(String),
    #[error("The API returned data in an unexpected format")]
    MalformedResponse,
}

impl ChatError {
    /// Maps the text of a relay-reported failure onto a category.
    /// Text that matches no rule is kept as [`ChatError::Api`].
    pub fn from_api_message(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("cors") {
            ChatError::Cors
        } else if lower.contains("timeout") {
            ChatError::Timeout
        } else if lower.contains("api key") || message.contains("401") {
            ChatError::CredentialInvalid
        } else if ["500", "502", "503"].iter().any(|code| message.contains(code)) {
            ChatError::Server
        } else if message.is_empty() {
            ChatError::Unknown
        } else {
            ChatError::Api(message.to_string())
        }
    }

    /// Whether this failure came from the credential check or the relay
    /// rejecting the credential.
    pub fn is_credential_error(&self) -> bool {
        matches!(self, ChatError::CredentialInvalid | ChatError::CredentialMissing)
    }
}

impl From<CredentialError> for ChatError {
    fn from(error: CredentialError) -> Self {
        match error {
            CredentialError::Missing => ChatError::CredentialMissing,
            CredentialError::Malformed => ChatError::CredentialInvalid,
        }
    }
}

impl From<TransportError> for ChatError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Timeout => ChatError::Timeout,
            TransportError::Connect(_) => ChatError::Network,
            TransportError::Status(StatusCode::UNAUTHORIZED) => ChatError::CredentialInvalid,
            TransportError::Status(status) if status.is_server_error() => ChatError::Server,
            TransportError::Status(_) => ChatError::Unknown,
            TransportError::Decode(_) => ChatError::MalformedResponse,
            TransportError::Other(ref detail) if detail.to_lowercase().contains("cors") => {
                ChatError::Cors
            }
            TransportError::Other(_) => ChatError::Unknown,
        }
    }
}
