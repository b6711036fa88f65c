//! 传输层：单次非阻塞 HTTP 往返，以及把原始响应解码为响应信封。
//!
//! Transport layer: one non-blocking HTTP round trip per attempt, and decoding of
//! the raw response into a [`ResponseEnvelope`]. No retry happens here.

pub mod adapter;
pub mod decode;
pub mod http;

pub use adapter::TransportAdapter;
pub use decode::decode;
pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use reqwest::header::HeaderMap;
use std::error::Error as StdError;
use std::time::Duration;

use crate::request::RequestDescriptor;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode response body: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Other(String),
}

const DNS_MARKERS: &[&str] = &[
    "dns",
    "name or service not known",
    "failed to lookup address",
    "nodename nor servname",
    "no such host",
];

impl TransportError {
    /// The request never reached a server.
    pub fn is_connect(&self) -> bool {
        match self {
            TransportError::Http(e) => e.is_connect(),
            TransportError::Connect(_) => true,
            _ => false,
        }
    }

    /// Connection failure whose cause chain reads like a name-resolution error.
    pub fn looks_like_dns(&self) -> bool {
        if !self.is_connect() {
            return false;
        }
        let text = error_chain(self).to_lowercase();
        DNS_MARKERS.iter().any(|m| text.contains(m))
    }
}

/// Render an error and all of its sources on one line.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Status line, headers and unread body of a response.
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: BoxStream<'static, std::result::Result<Bytes, TransportError>>,
}

impl RawResponse {
    /// Response with an in-memory body; used by test transports.
    pub fn from_bytes(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let chunk: Bytes = body.into();
        Self {
            status,
            headers,
            body: Box::pin(futures::stream::once(async move { Ok(chunk) })),
        }
    }
}

impl std::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Fully buffered response handed to the parser.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub headers: HeaderMap,
    pub status_code: u16,
    pub body: Bytes,
}

/// Status and headers of the final response, kept after parsing.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HeaderMap,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status_code < 300
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl From<&ResponseEnvelope> for HttpResponse {
    fn from(env: &ResponseEnvelope) -> Self {
        Self {
            status_code: env.status_code,
            headers: env.headers.clone(),
        }
    }
}

/// One request/response round trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> std::result::Result<RawResponse, TransportError>;
}
