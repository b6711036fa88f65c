use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Proxy};
use tracing::debug;

use super::{RawResponse, Transport, TransportError};
use crate::config::ClientConfig;
use crate::request::RequestDescriptor;
use crate::Result;

/// reqwest-backed transport. Holds one connection pool; cheap to share.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(config.pool_idle_timeout()))
            .user_agent(config.user_agent.as_str())
            .http2_adaptive_window(true);

        if let Some(proxy_url) = config.proxy_url.as_deref() {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => debug!(proxy = proxy_url, error = %e, "ignoring invalid proxy url"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_headers(request: &RequestDescriptor) -> std::result::Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::with_capacity(request.headers.len());
        for (k, v) in &request.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|e| TransportError::Other(format!("invalid header name '{}': {}", k, e)))?;
            let value = HeaderValue::from_str(v)
                .map_err(|e| TransportError::Other(format!("invalid value for header '{}': {}", k, e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> std::result::Result<RawResponse, TransportError> {
        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|e| TransportError::Other(format!("invalid method '{}': {}", request.method, e)))?;
        let headers = Self::build_headers(request)?;
        let body = request
            .body_bytes()
            .await
            .map_err(|e| TransportError::Other(format!("failed to read request body: {}", e)))?;

        let resp = self
            .client
            .request(method, request.url.clone())
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes_stream().map_err(TransportError::Http);

        Ok(RawResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}
