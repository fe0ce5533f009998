//! Remote extraction agent.
//!
//! The agent crawls the target and writes the requested document; all of
//! that happens on the other side of an HTTP call. This side only ships the
//! request and interprets the response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, warn};

use docforge_core::ExtractionRequest;

use super::OperationError;

/// Longest upstream error body kept in a job's error message.
const MAX_ERROR_BODY: usize = 512;

/// Produces a markdown document for an extraction request.
#[async_trait]
pub trait ExtractionAgent: Send + Sync + 'static {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, OperationError>;
}

/// Agent used when no endpoint is configured: every job fails with a clear
/// message instead of the server refusing to start.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredAgent;

#[async_trait]
impl ExtractionAgent for UnconfiguredAgent {
    async fn extract(&self, _request: &ExtractionRequest) -> Result<String, OperationError> {
        Err(OperationError::NotConfigured)
    }
}

/// HTTP agent configuration.
#[derive(Debug, Clone)]
pub struct HttpAgentConfig {
    /// Endpoint receiving `POST {url, type, instructions}`
    pub endpoint: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpAgentConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Agent reached over HTTP.
///
/// Accepted responses: a JSON object with a string `markdown` (or `content`)
/// field, or any `text/*` body taken verbatim.
#[derive(Debug, Clone)]
pub struct HttpAgent {
    client: reqwest::Client,
    config: HttpAgentConfig,
}

#[derive(Debug, Deserialize)]
struct AgentResponse {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl HttpAgent {
    pub fn new(config: HttpAgentConfig) -> Result<Self, OperationError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl ExtractionAgent for HttpAgent {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, OperationError> {
        let mut req = self.client.post(&self.config.endpoint).json(request);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }

        debug!(endpoint = %self.config.endpoint, url = %request.url, kind = %request.kind, "calling agent");
        let res = req.send().await?;

        let status = res.status();
        let is_text = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/"));
        let body = res.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "agent returned an error status");
            return Err(OperationError::Upstream {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let markdown = if is_text {
            body
        } else {
            let parsed: AgentResponse = serde_json::from_str(&body)
                .map_err(|e| OperationError::InvalidResponse(e.to_string()))?;
            parsed.markdown.or(parsed.content).ok_or_else(|| {
                OperationError::InvalidResponse(
                    "expected a string `markdown` or `content` field".to_string(),
                )
            })?
        };

        if markdown.trim().is_empty() {
            return Err(OperationError::InvalidResponse(
                "agent returned an empty document".to_string(),
            ));
        }
        Ok(markdown)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
