//! Request gateway: the single path every API call goes through.
//!
//! The gateway owns three concerns. It attaches the bearer token to
//! outgoing requests whenever one is present, it classifies every
//! failure into the three-way [`GatewayError`] taxonomy, and it hides
//! which transport actually serves the request. The live HTTP transport
//! and the seeded in-process fixture implement the same [`ApiTransport`]
//! trait, so everything above the gateway is oblivious to the swap.

mod fixture;
mod http;

pub use fixture::{FixtureTransport, FIXTURE_PASSWORD, FIXTURE_TOKEN, FIXTURE_USERNAME};
pub use http::HttpTransport;

use crate::config::{Config, SourceConfig};
use crate::types::ApiMessage;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by API calls, classified by where they arose.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The request never produced a response: DNS, connect, timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The server answered 2xx but the body was not what we expect.
    #[error("unexpected response body: {0}")]
    Parse(String),
}

impl GatewayError {
    /// True for responses that mean the session is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Server { status: 401, .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, GatewayError::Network(_))
    }
}

/// HTTP method subset the API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// One part of a multipart form body.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub kind: PartKind,
}

#[derive(Debug, Clone)]
pub enum PartKind {
    /// Plain text field.
    Text(String),
    /// File upload with content and metadata.
    File {
        file_name: String,
        content_type: String,
        data: Bytes,
    },
}

impl Part {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PartKind::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
    ) -> Self {
        Self {
            name: name.into(),
            kind: PartKind::File {
                file_name: file_name.into(),
                content_type: content_type.into(),
                data,
            },
        }
    }
}

/// Body attached to an outgoing request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<Part>),
}

/// A transport-neutral request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API root, always starting with '/'.
    pub path: String,
    /// Bearer token to attach, when the session has one.
    pub bearer: Option<String>,
    pub body: RequestBody,
}

/// A transport-neutral response: status plus raw body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract transport executing API requests.
///
/// Only network-level failure is an `Err` here; a served non-2xx comes
/// back as a response and is classified by the gateway.
///
/// This trait is object-safe and can be used with `Box<dyn ApiTransport>`.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, GatewayError>;
}

// Shared handles delegate, so a caller can keep a transport (e.g. the
// fixture, to flip it offline) while the gateway owns a boxed clone.
#[async_trait]
impl<T: ApiTransport + ?Sized> ApiTransport for Arc<T> {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, GatewayError> {
        (**self).execute(request).await
    }
}

/// Shared cell holding the current bearer token.
///
/// The session manager writes it on login/logout; the gateway reads it
/// on every request. Lock-free on the read path.
#[derive(Default)]
pub struct TokenCell(ArcSwapOption<String>);

impl TokenCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: Option<String>) {
        self.0.store(token.map(Arc::new));
    }

    pub fn get(&self) -> Option<Arc<String>> {
        self.0.load_full()
    }
}

/// Gateway over a dynamic transport.
pub struct Gateway {
    transport: Box<dyn ApiTransport>,
    token: Arc<TokenCell>,
}

impl Gateway {
    pub fn new(transport: Box<dyn ApiTransport>, token: Arc<TokenCell>) -> Self {
        Self { transport, token }
    }

    /// Create a gateway with the transport the configuration selects.
    pub fn from_config(config: &Config, token: Arc<TokenCell>) -> Result<Self, GatewayError> {
        let transport: Box<dyn ApiTransport> = match &config.source {
            SourceConfig::Network { base_url } => {
                Box::new(HttpTransport::new(base_url, config.http_timeout())?)
            }
            SourceConfig::Fixture => Box::new(FixtureTransport::new()),
        };
        Ok(Self::new(transport, token))
    }

    /// GET a JSON document.
    pub async fn get_json(&self, path: &str) -> Result<Value, GatewayError> {
        let response = self.execute(Method::Get, path, RequestBody::Empty).await?;
        expect_json(response)
    }

    /// POST a JSON body, expecting a JSON document back.
    pub async fn post_json(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<Value, GatewayError> {
        let value =
            serde_json::to_value(body).map_err(|e| GatewayError::Parse(e.to_string()))?;
        let response = self
            .execute(Method::Post, path, RequestBody::Json(value))
            .await?;
        expect_json(response)
    }

    /// Send a multipart form, expecting a JSON document back.
    pub async fn send_multipart(
        &self,
        method: Method,
        path: &str,
        parts: Vec<Part>,
    ) -> Result<Value, GatewayError> {
        let response = self
            .execute(method, path, RequestBody::Multipart(parts))
            .await?;
        expect_json(response)
    }

    /// POST with no body, discarding any success payload.
    pub async fn post_empty(&self, path: &str) -> Result<(), GatewayError> {
        let response = self.execute(Method::Post, path, RequestBody::Empty).await?;
        expect_success(response)
    }

    /// DELETE, discarding any success payload.
    pub async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        let response = self
            .execute(Method::Delete, path, RequestBody::Empty)
            .await?;
        expect_success(response)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<ApiResponse, GatewayError> {
        // Correlates the dispatch and outcome lines when calls
        // interleave under concurrent cache fetches.
        let request_id = short_request_id();
        let bearer = self.token.get().map(|t| t.as_ref().clone());
        debug!(
            %request_id,
            method = method.as_str(),
            path,
            authenticated = bearer.is_some(),
            "dispatching request"
        );
        let result = self
            .transport
            .execute(ApiRequest {
                method,
                path: path.to_string(),
                bearer,
                body,
            })
            .await;
        match &result {
            Ok(response) => debug!(%request_id, status = response.status, "request served"),
            Err(e) => debug!(%request_id, error = %e, "request failed before a response"),
        }
        result
    }
}

/// Eight hex characters are plenty to match up log lines.
fn short_request_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Map a served response to its JSON body or a classified error.
fn expect_json(response: ApiResponse) -> Result<Value, GatewayError> {
    if !response.is_success() {
        return Err(classify_failure(response));
    }
    serde_json::from_slice(&response.body).map_err(|e| GatewayError::Parse(e.to_string()))
}

/// Map a served response to success, ignoring any body.
fn expect_success(response: ApiResponse) -> Result<(), GatewayError> {
    if !response.is_success() {
        return Err(classify_failure(response));
    }
    Ok(())
}

/// Build a `Server` error from a non-2xx response, pulling the message
/// out of the standard `{"message": ...}` body when it is there.
fn classify_failure(response: ApiResponse) -> GatewayError {
    let message = serde_json::from_slice::<ApiMessage>(&response.body)
        .map(|m| m.message)
        .unwrap_or_else(|_| {
            let raw = String::from_utf8_lossy(&response.body);
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", response.status)
            } else {
                // Keep diagnostics bounded for HTML error pages and the like.
                trimmed.chars().take(200).collect()
            }
        });
    GatewayError::Server {
        status: response.status,
        message,
    }
}
