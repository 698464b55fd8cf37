//! Service factory for building command dependencies.
//!
//! Command-line overrides and environment lookups are resolved here, once,
//! into a [`ChatClient`] and the per-call [`ChatOptions`].

use anyhow::Result;
use log::debug;
use std::time::Duration;

use crate::{
    chat::{ChatClient, ChatOptions},
    config::ClientConfig,
    credential,
    runtime::Runtime,
};

/// Environment variable holding the credential when `--api-key` is not given.
pub const CREDENTIAL_ENV: &str = "CHATAPI_KEY";

/// Overrides for the client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOverrides {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

/// Build the chat client from the runtime environment and overrides.
pub fn build_client<R: Runtime>(runtime: &R, overrides: &ClientOverrides) -> Result<ChatClient> {
    let mut config = ClientConfig::from_runtime(runtime, overrides.base_url.clone());

    if let Some(ms) = overrides.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    if let Some(retries) = overrides.max_retries {
        config = config.with_max_retries(retries);
    }

    debug!("Client configuration: {:?}", config);
    ChatClient::new(config)
}

/// Returns the credential to send. An absent credential becomes the empty
/// string, which the client reports as missing.
pub fn resolve_credential<R: Runtime>(runtime: &R, explicit: Option<String>) -> String {
    if let Some(key) = explicit {
        return key;
    }

    match runtime.env_var(CREDENTIAL_ENV) {
        Ok(key) => {
            debug!(
                "Using {} for the credential: {}",
                CREDENTIAL_ENV,
                credential::mask(&key)
            );
            key
        }
        Err(_) => String::new(),
    }
}

pub fn build_options(
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
) -> ChatOptions {
    ChatOptions {
        model,
        temperature,
        max_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BASE_URL_ENV, DEFAULT_BASE_URL, ENVIRONMENT_ENV};
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn runtime_with_key(key: Option<&str>) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        let key = key.map(|k| k.to_string());
        runtime
            .expect_env_var()
            .with(eq(CREDENTIAL_ENV))
            .returning(move |_| key.clone().ok_or(std::env::VarError::NotPresent));
        runtime
            .expect_env_var()
            .with(eq(BASE_URL_ENV))
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
            .expect_env_var()
            .with(eq(ENVIRONMENT_ENV))
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
    }

    #[test]
    fn test_build_client_applies_overrides() {
        let runtime = runtime_with_key(None);
        let overrides = ClientOverrides {
            base_url: Some("http://relay:1".to_string()),
            timeout_ms: Some(1500),
            max_retries: Some(0),
        };

        let client = build_client(&runtime, &overrides).unwrap();
        assert_eq!(client.config().base_url, "http://relay:1");
        assert_eq!(client.config().timeout, Duration::from_millis(1500));
        assert_eq!(client.config().max_retries, 0);
    }

    #[test]
    fn test_build_client_defaults() {
        let runtime = runtime_with_key(None);
        let client = build_client(&runtime, &ClientOverrides::default()).unwrap();
        assert_eq!(client.config(), &ClientConfig::default());
        assert_eq!(client.config().base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_resolve_credential_prefers_explicit() {
        let runtime = runtime_with_key(Some("sk-from-environment-xxxxxx"));
        assert_eq!(
            resolve_credential(&runtime, Some("sk-explicit".to_string())),
            "sk-explicit"
        );
    }

    #[test]
    fn test_resolve_credential_from_env() {
        let runtime = runtime_with_key(Some("sk-from-environment-xxxxxx"));
        assert_eq!(
            resolve_credential(&runtime, None),
            "sk-from-environment-xxxxxx"
        );
    }

    #[test]
    fn test_resolve_credential_absent() {
        let runtime = runtime_with_key(None);
        assert_eq!(resolve_credential(&runtime, None), "");
    }

    #[test]
    fn test_build_options() {
        let options = build_options(Some("gpt-4o".to_string()), None, Some(5));
        assert_eq!(options, ChatOptions::default().model("gpt-4o").max_tokens(5));
    }
}
