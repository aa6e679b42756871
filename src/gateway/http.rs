//! HTTP transport backed by reqwest

use super::{ApiRequest, ApiResponse, ApiTransport, GatewayError, Method, Part, PartKind};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Transport that sends requests to a live backend.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for the given API root.
    ///
    /// A trailing slash on the base URL is tolerated; request paths
    /// always carry the leading one.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn build_form(parts: Vec<Part>) -> Result<reqwest::multipart::Form, GatewayError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part.kind {
            PartKind::Text(value) => form.text(part.name, value),
            PartKind::File {
                file_name,
                content_type,
                data,
            } => {
                let file_part = reqwest::multipart::Part::bytes(data.to_vec())
                    .file_name(file_name)
                    .mime_str(&content_type)
                    .map_err(|e| GatewayError::Network(format!("invalid content type: {e}")))?;
                form.part(part.name, file_part)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, GatewayError> {
        let url = self.url_for(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            super::RequestBody::Empty => builder,
            super::RequestBody::Json(value) => builder.json(&value),
            super::RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        // Everything up to a served response is a network failure; the
        // gateway classifies non-2xx statuses afterwards.
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        debug!(url, status, bytes = body.len(), "received response");
        Ok(ApiResponse { status, body })
    }
}
