//! HTTP transport seam.
//!
//! Scenarios only ever talk to the API through [`Transport`]. The default
//! implementation, [`UreqTransport`], uses `ureq` (sync) wrapped in
//! `tokio::task::spawn_blocking` so the async runtime is never blocked.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ConformanceError, ConformanceResult};

/// HTTP verbs the suite issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
}

/// A single request to the API under test or the token issuer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub bearer: Option<String>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        ApiRequest {
            method,
            url: url.into(),
            bearer: None,
            body: RequestBody::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(|t| t.to_string());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    /// `"GET http://..."`, used in assertion messages.
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// Status and raw body text of a response. Any status is a valid response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }

    /// Parse the body as JSON; `url` only feeds the error message.
    pub fn json(&self, url: &str) -> ConformanceResult<Value> {
        serde_json::from_str(&self.body).map_err(|e| ConformanceError::Parse {
            url: url.to_string(),
            message: format!("body is not JSON ({}): {}", e, excerpt(&self.body)),
        })
    }
}

/// First 200 characters of a body, for diagnostics.
pub fn excerpt(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.chars().count() <= LIMIT {
        body.to_string()
    } else {
        let head: String = body.chars().take(LIMIT).collect();
        format!("{}...", head)
    }
}

/// Anything that can carry an [`ApiRequest`] to the server.
///
/// Implementations must return `Ok` for every HTTP status, including 4xx
/// and 5xx; only failures to obtain a response are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ConformanceResult<ApiResponse>;
}

/// [`Transport`] backed by a blocking `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();
        UreqTransport {
            agent: ureq::Agent::new_with_config(config),
        }
    }

    fn send_blocking(agent: &ureq::Agent, request: &ApiRequest) -> Result<ApiResponse, String> {
        let auth = request.bearer.as_ref().map(|t| format!("Bearer {}", t));

        let response = match (request.method, &request.body) {
            (Method::Get, _) => {
                let mut builder = agent.get(&request.url);
                if let Some(ref auth) = auth {
                    builder = builder.header("Authorization", auth);
                }
                builder.call()
            }
            (Method::Delete, _) => {
                let mut builder = agent.delete(&request.url);
                if let Some(ref auth) = auth {
                    builder = builder.header("Authorization", auth);
                }
                builder.call()
            }
            (Method::Post, body) => {
                let mut builder = agent.post(&request.url);
                if let Some(ref auth) = auth {
                    builder = builder.header("Authorization", auth);
                }
                match body {
                    RequestBody::Empty => builder.send_empty(),
                    RequestBody::Json(value) => builder.send_json(value),
                    RequestBody::Form(pairs) => {
                        builder.send_form(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    }
                }
            }
        }
        .map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| format!("failed to read response body: {}", e))?;

        Ok(ApiResponse { status, body })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS))
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: ApiRequest) -> ConformanceResult<ApiResponse> {
        let agent = self.agent.clone();
        let method = request.method.to_string();
        let url = request.url.clone();

        let result = tokio::task::spawn_blocking(move || {
            Self::send_blocking(&agent, &request)
        })
        .await
        .map_err(|e| ConformanceError::Transport {
            method: method.clone(),
            url: url.clone(),
            message: format!("task join error: {}", e),
        })?;

        match result {
            Ok(response) => {
                tracing::debug!(%method, %url, status = response.status, "response received");
                Ok(response)
            }
            Err(message) => {
                tracing::debug!(%method, %url, error = %message, "request failed");
                Err(ConformanceError::Transport {
                    method,
                    url,
                    message,
                })
            }
        }
    }
}
