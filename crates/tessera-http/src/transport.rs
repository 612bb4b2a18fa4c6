//! HTTP transport capability
//!
//! The executor talks to the network through [`HttpTransport`], an
//! injectable capability exposing an async path and an optional blocking
//! path, each gated by a support flag. [`ReqwestTransport`] is the default
//! implementation.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use tessera_core::{Error, Result};

use crate::message::{Headers, HttpRequest, HttpResponse};

/// Pluggable HTTP transport.
///
/// Implementations advertise which execution paths they support; the
/// request executor fails fast with an unsupported-operation error when
/// the required path's flag is false.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Whether [`HttpTransport::execute`] is available.
    fn supports_async(&self) -> bool {
        true
    }

    /// Whether [`HttpTransport::execute_blocking`] is available.
    fn supports_blocking(&self) -> bool {
        false
    }

    /// Execute a single wire request. Network-level failures map to
    /// [`Error::Transport`]; cancellation of the in-flight call maps to
    /// [`Error::Cancelled`].
    async fn execute(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse>;

    /// Execute a single wire request on the calling thread.
    fn execute_blocking(&self, _request: &HttpRequest) -> Result<HttpResponse> {
        Err(Error::unsupported(
            "this transport has no blocking execution path",
        ))
    }
}

/// Default transport over [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tessera/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InvalidConfig {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Wrap a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_request(&self, request: &HttpRequest) -> Result<reqwest::RequestBuilder> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| Error::transport(format!("invalid method: {e}")))?;
        let mut builder = self.client.request(method, request.uri.to_string());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        Ok(builder)
    }

    async fn read_response(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.append(name.as_str(), value);
            }
        }
        let body = response.text().await.map_err(|e| Error::Transport {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        let body = if body.is_empty() { None } else { Some(body) };
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        trace!(method = %request.method, uri = %request.uri, "executing HTTP request");
        let builder = self.build_request(request)?;
        let send = async {
            let response = builder.send().await.map_err(|e| Error::Transport {
                message: format!("request failed: {e}"),
                source: Some(Box::new(e)),
            })?;
            Self::read_response(response).await
        };
        tokio::select! {
            () = cancel.cancelled() => Err(Error::Cancelled),
            outcome = send => outcome,
        }
    }
}
