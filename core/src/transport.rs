//! Executes `HttpRequest` values against the network.
//!
//! `ApiClient` depends only on the `Transport` trait. `UreqTransport` is the
//! production implementation; tests substitute recording or failing fakes.

use thiserror::Error;
use tracing::debug;

use crate::error::UNKNOWN_ERROR;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// The request could not be completed at the transport level.
///
/// An empty message is stored as `None` and rendered as the generic fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .message.as_deref().unwrap_or(UNKNOWN_ERROR))]
pub struct TransportError {
    message: Option<String>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: (!message.trim().is_empty()).then_some(message),
        }
    }

    pub fn unknown() -> Self {
        Self { message: None }
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(UNKNOWN_ERROR)
    }
}

/// Performs one HTTP round-trip. Implementations must return non-2xx
/// responses as `Ok` data and must not retry.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
///
/// Status-as-error is disabled so 4xx/5xx responses come back as data and the
/// client's normalizer decides what they mean.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(&request.url), &request.headers).call(),
            HttpMethod::Delete => {
                with_headers(self.agent.delete(&request.url), &request.headers).call()
            }
            HttpMethod::Post => {
                let builder = with_headers(self.agent.post(&request.url), &request.headers);
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = with_headers(self.agent.put(&request.url), &request.headers);
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // A connection dropped mid-body is a transport failure, whatever the status.
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::new(e.to_string()))?;

        debug!(status, "received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
