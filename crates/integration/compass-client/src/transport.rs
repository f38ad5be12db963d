//! Transport seam between the typed client and the network.

use crate::request::{HttpRequest, HttpResponse};
use crate::{ClientError, Result};
use async_trait::async_trait;
use std::time::Instant;
use tracing::debug;

/// Executes one request. Non-2xx statuses are responses, not errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let start = Instant::now();
        let mut builder = self.http.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        debug!(
            method = %request.method,
            url = %request.url,
            status,
            latency_ms = start.elapsed().as_millis() as u64,
            "request completed"
        );
        Ok(HttpResponse { status, body })
    }
}
