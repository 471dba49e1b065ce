//! Introspection over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use voyager_core::{Introspection, RequestToken, INTROSPECTION_QUERY};

use crate::error::{FetchError, OpsError, OpsResult};

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Attach credentials to the request.
    pub with_credentials: bool,
    /// Bearer token, only sent when `with_credentials` is set.
    pub auth_token: Option<String>,
}

impl FetchOptions {
    pub fn with_credentials(mut self, token: Option<String>) -> Self {
        self.with_credentials = true;
        self.auth_token = token;
        self
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Sends the introspection query to GraphQL endpoints.
#[derive(Debug, Clone)]
pub struct IntrospectionClient {
    client: reqwest::Client,
}

impl IntrospectionClient {
    /// Build a client with the given request timeout.
    pub fn new(timeout: Duration) -> OpsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpsError::configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Fetch and validate the introspection result of `endpoint`.
    pub async fn fetch(
        &self,
        endpoint: &str,
        options: &FetchOptions,
    ) -> Result<Introspection, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if options.with_credentials {
            if let Some(token) = &options.auth_token {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| FetchError::Transport(format!("invalid auth token: {}", e)))?;
                headers.insert(AUTHORIZATION, value);
            }
        }

        debug!(%endpoint, with_credentials = options.with_credentials, "Sending introspection query");

        let response = self
            .client
            .post(endpoint)
            .headers(headers)
            .json(&json!({
                "query": INTROSPECTION_QUERY,
                "operationName": "IntrospectionQuery",
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(%endpoint, status = status.as_u16(), "Introspection request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<Introspection, FetchError> {
    let response: GraphQlResponse =
        serde_json::from_str(body).map_err(|e| FetchError::InvalidPayload(e.to_string()))?;

    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        return Err(FetchError::GraphQl {
            messages: errors.into_iter().map(|e| e.message).collect(),
        });
    }

    let data = response
        .data
        .ok_or_else(|| FetchError::InvalidPayload("response has no data".to_string()))?;

    Introspection::from_value(data).map_err(|e| FetchError::InvalidPayload(e.to_string()))
}

/// Issues monotonically increasing [`RequestToken`]s.
#[derive(Debug, Default)]
pub struct RequestTokens {
    last: AtomicU64,
}

impl RequestTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token newer than every token issued before it.
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// The most recently issued token.
    pub fn latest(&self) -> Option<RequestToken> {
        match self.last.load(Ordering::SeqCst) {
            0 => None,
            n => Some(RequestToken(n)),
        }
    }
}
