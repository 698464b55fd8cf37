//! Relay connection diagnosis.

use log::{debug, warn};
use reqwest::{Method, StatusCode};
use serde_json::json;
use std::fmt;
use std::time::{Duration, Instant};

use super::ChatClient;
use crate::config::PROBE_TIMEOUT;
use crate::error::ChatError;
use crate::http::classify_error;

/// Deliberately malformed key sent to check that the relay rejects it.
pub const INVALID_PROBE_KEY: &str = "invalid-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Passed,
    Warning,
    Failed,
    Skipped,
}

impl CheckStatus {
    fn tag(self) -> &'static str {
        match self {
            CheckStatus::Passed => "[ok]  ",
            CheckStatus::Warning => "[warn]",
            CheckStatus::Failed => "[fail]",
            CheckStatus::Skipped => "[skip]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

/// CORS headers returned for the chat endpoint preflight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsHeaders {
    pub allow_origin: Option<String>,
    pub allow_methods: Option<String>,
    pub allow_headers: Option<String>,
}

impl CorsHeaders {
    fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };
        Self {
            allow_origin: get("access-control-allow-origin"),
            allow_methods: get("access-control-allow-methods"),
            allow_headers: get("access-control-allow-headers"),
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allow_origin.as_deref() == Some("*")
    }
}

impl fmt::Display for CorsHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "(none)".to_string());
        write!(
            f,
            "allow-origin={}, allow-methods={}, allow-headers={}",
            show(&self.allow_origin),
            show(&self.allow_methods),
            show(&self.allow_headers)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticReport {
    pub base_url: String,
    pub checks: Vec<Check>,
    /// Body of the base URL, when it was JSON.
    pub relay_info: Option<serde_json::Value>,
    pub cors: Option<CorsHeaders>,
    pub latency: Option<Duration>,
}

impl DiagnosticReport {
    fn record(&mut self, name: &'static str, status: CheckStatus, detail: impl Into<String>) {
        self.checks.push(Check {
            name,
            status,
            detail: detail.into(),
        });
    }

    /// No check failed.
    pub fn is_healthy(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Failed)
    }

    pub fn check(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diagnosing {}", self.base_url)?;
        for check in &self.checks {
            writeln!(f, "{} {}: {}", check.status.tag(), check.name, check.detail)?;
        }
        if let Some(info) = &self.relay_info {
            writeln!(f, "Relay info: {}", info)?;
        }
        if self.check(BASE).map(|c| c.status) == Some(CheckStatus::Failed) {
            writeln!(f, "If the base connection fails, check that:")?;
            writeln!(f, "  1. the relay is running at {}", self.base_url)?;
            writeln!(f, "  2. the port is not taken by another program")?;
            writeln!(f, "  3. no firewall is blocking the connection")?;
        }
        Ok(())
    }
}

pub(crate) const BASE: &str = "Base connectivity";
pub(crate) const REJECTION: &str = "Invalid key rejected";
pub(crate) const CORS: &str = "CORS preflight";
pub(crate) const LATENCY: &str = "Latency";

impl ChatClient {
    /// Runs the connection checks against the relay. Never fails; every
    /// problem is recorded in the report.
    #[tracing::instrument(skip(self))]
    pub async fn diagnose(&self) -> DiagnosticReport {
        let base_url = self.config().base_url.clone();
        let chat_url = self.config().chat_url();
        let client = self.http().inner();

        let mut report = DiagnosticReport {
            base_url: base_url.clone(),
            ..DiagnosticReport::default()
        };

        // 1. Base connection; nothing else is meaningful without it.
        match client.get(&base_url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => {
                let status = response.status();
                report.relay_info = response.json::<serde_json::Value>().await.ok();
                report.record(BASE, CheckStatus::Passed, status_text(status));
            }
            Ok(response) => {
                report.record(BASE, CheckStatus::Failed, status_text(response.status()));
                skip_remaining(&mut report);
                return report;
            }
            Err(e) => {
                report.record(BASE, CheckStatus::Failed, transport_detail(&e));
                skip_remaining(&mut report);
                return report;
            }
        }

        // 2. The chat endpoint must refuse a bogus key.
        let probe = json!({ "apiKey": INVALID_PROBE_KEY, "message": "test" });
        match client
            .post(&chat_url)
            .timeout(PROBE_TIMEOUT)
            .json(&probe)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                report.record(
                    REJECTION,
                    CheckStatus::Warning,
                    "relay accepted an invalid API key",
                );
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                debug!("Rejection body: {}", body);
                report.record(REJECTION, CheckStatus::Passed, status_text(status));
            }
            Err(e) => {
                report.record(REJECTION, CheckStatus::Failed, transport_detail(&e));
            }
        }

        // 3. CORS preflight.
        match client
            .request(Method::OPTIONS, &chat_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => {
                let cors = CorsHeaders::from_headers(response.headers());
                let status = if cors.allows_any_origin() {
                    CheckStatus::Passed
                } else {
                    CheckStatus::Warning
                };
                report.record(CORS, status, cors.to_string());
                report.cors = Some(cors);
            }
            Err(e) => {
                report.record(CORS, CheckStatus::Failed, transport_detail(&e));
            }
        }

        // 4. Round-trip latency.
        let started = Instant::now();
        match client.get(&base_url).timeout(PROBE_TIMEOUT).send().await {
            Ok(_) => {
                let elapsed = started.elapsed();
                report.record(
                    LATENCY,
                    CheckStatus::Passed,
                    format!("{}ms", elapsed.as_millis()),
                );
                report.latency = Some(elapsed);
            }
            Err(e) => {
                report.record(LATENCY, CheckStatus::Failed, transport_detail(&e));
            }
        }

        report
    }
}

fn status_text(status: StatusCode) -> String {
    format!(
        "HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
    .trim_end()
    .to_string()
}

fn transport_detail(error: &reqwest::Error) -> String {
    warn!("Diagnostic request failed: {}", error);
    ChatError::from(classify_error(error)).to_string()
}

fn skip_remaining(report: &mut DiagnosticReport) {
    for name in [REJECTION, CORS, LATENCY] {
        report.record(name, CheckStatus::Skipped, "base connection failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::test_utils::closed_port_url;

    fn client_for(base_url: &str) -> ChatClient {
        let config = ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        };
        ChatClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_healthy_relay() {
        let mut server = mockito::Server::new_async().await;

        let base = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "relay"}"#)
            .expect(2)
            .create_async()
            .await;
        let rejection = server
            .mock("POST", "/chat")
            .match_body(mockito::Matcher::Json(
                json!({"apiKey": "invalid-key", "message": "test"}),
            ))
            .with_status(401)
            .with_body(r#"{"success": false, "error": "Invalid API key"}"#)
            .create_async()
            .await;
        let preflight = server
            .mock("OPTIONS", "/chat")
            .with_status(204)
            .with_header("access-control-allow-origin", "*")
            .with_header("access-control-allow-methods", "POST, OPTIONS")
            .with_header("access-control-allow-headers", "Content-Type")
            .create_async()
            .await;

        let report = client_for(&server.url()).diagnose().await;

        base.assert_async().await;
        rejection.assert_async().await;
        preflight.assert_async().await;

        assert!(report.is_healthy());
        assert_eq!(report.checks.len(), 4);
        assert_eq!(report.check(BASE).unwrap().status, CheckStatus::Passed);
        assert_eq!(report.check(REJECTION).unwrap().status, CheckStatus::Passed);
        assert_eq!(report.check(CORS).unwrap().status, CheckStatus::Passed);
        assert_eq!(report.check(LATENCY).unwrap().status, CheckStatus::Passed);
        assert_eq!(report.relay_info, Some(json!({"name": "relay"})));
        assert!(report.cors.unwrap().allows_any_origin());
        assert!(report.latency.is_some());
    }

    #[tokio::test]
    async fn test_warns_on_accepted_key_and_restrictive_cors() {
        let mut server = mockito::Server::new_async().await;

        let _base = server
            .mock("GET", "/")
            .with_status(200)
            .create_async()
            .await;
        let _rejection = server
            .mock("POST", "/chat")
            .with_status(200)
            .create_async()
            .await;
        let _preflight = server
            .mock("OPTIONS", "/chat")
            .with_status(204)
            .with_header("access-control-allow-origin", "https://example.com")
            .create_async()
            .await;

        let report = client_for(&server.url()).diagnose().await;

        assert!(report.is_healthy());
        assert_eq!(report.check(REJECTION).unwrap().status, CheckStatus::Warning);
        assert_eq!(report.check(CORS).unwrap().status, CheckStatus::Warning);
        assert_eq!(report.relay_info, None);
        let rendered = report.to_string();
        assert!(rendered.contains("allow-origin=https://example.com"));
        assert!(rendered.contains("allow-methods=(none)"));
    }

    #[tokio::test]
    async fn test_base_failure_skips_the_rest() {
        let mut server = mockito::Server::new_async().await;

        let _base = server
            .mock("GET", "/")
            .with_status(500)
            .create_async()
            .await;
        let chat = server
            .mock("POST", "/chat")
            .expect(0)
            .create_async()
            .await;

        let report = client_for(&server.url()).diagnose().await;

        chat.assert_async().await;
        assert!(!report.is_healthy());
        assert_eq!(report.check(BASE).unwrap().detail, "HTTP 500 Internal Server Error");
        for name in [REJECTION, CORS, LATENCY] {
            assert_eq!(report.check(name).unwrap().status, CheckStatus::Skipped);
        }
        assert!(report.to_string().contains("the relay is running at"));
    }

    #[tokio::test]
    async fn test_unreachable_relay() {
        let report = client_for(&closed_port_url()).diagnose().await;

        assert!(!report.is_healthy());
        let base = report.check(BASE).unwrap();
        assert_eq!(base.status, CheckStatus::Failed);
        assert_eq!(base.detail, ChatError::Network.to_string());
    }
}
