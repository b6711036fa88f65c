use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{decode, error_chain, HttpResponse, RawResponse, Transport, TransportError};
use crate::endpoint::AttemptOutcome;
use crate::model::OperationModel;
use crate::parser::ParserFactory;
use crate::request::RequestDescriptor;
use crate::{Error, Result};

/// Runs one attempt: send, decode, parse. Every expected failure comes back
/// as [`AttemptOutcome::Failure`]; nothing here retries.
#[derive(Clone)]
pub struct TransportAdapter {
    transport: Arc<dyn Transport>,
    parsers: Arc<dyn ParserFactory>,
    endpoint_url: String,
    attempt_timeout: Option<Duration>,
}

impl TransportAdapter {
    pub fn new(transport: Arc<dyn Transport>, parsers: Arc<dyn ParserFactory>, endpoint_url: impl Into<String>) -> Self {
        Self {
            transport,
            parsers,
            endpoint_url: endpoint_url.into(),
            attempt_timeout: None,
        }
    }

    /// Bound each round trip (send plus body read).
    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub async fn get_response(&self, request: &RequestDescriptor, operation_model: &OperationModel) -> AttemptOutcome {
        match self.round_trip(request, operation_model).await {
            Ok((http, parsed)) => AttemptOutcome::Success { http, parsed },
            Err(e) => {
                debug!(
                    operation = operation_model.name.as_str(),
                    attempt = request.attempt,
                    error = %error_chain(&e),
                    "Exception received when sending HTTP request"
                );
                AttemptOutcome::Failure(e)
            }
        }
    }

    async fn round_trip(
        &self,
        request: &RequestDescriptor,
        operation_model: &OperationModel,
    ) -> Result<(HttpResponse, serde_json::Value)> {
        debug!(
            method = request.method.as_str(),
            url = request.url.as_str(),
            attempt = request.attempt,
            "Sending http request"
        );
        let start = Instant::now();

        let exchange = async {
            let raw = self.send(request).await?;
            decode(raw, operation_model).await
        };
        let envelope = match self.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| Error::Transport(TransportError::Timeout(limit)))??,
            None => exchange.await?,
        };

        debug!(
            operation = operation_model.name.as_str(),
            http_status = envelope.status_code,
            duration_ms = start.elapsed().as_millis() as u64,
            "Response received"
        );

        let parser = self.parsers.create_parser(operation_model.protocol())?;
        // An undecodable body is a decode failure of this attempt, retried like transport errors
        let parsed = parser
            .parse(&envelope, operation_model.output_shape.as_ref())
            .map_err(|e| match e {
                Error::Parse { .. } => Error::Transport(TransportError::Decode(e.to_string())),
                other => other,
            })?;
        Ok((HttpResponse::from(&envelope), parsed))
    }

    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        self.transport.send(request).await.map_err(|e| {
            if e.looks_like_dns() {
                Error::EndpointConnection {
                    endpoint_url: self.endpoint_url.clone(),
                    source: e,
                }
            } else {
                Error::Transport(e)
            }
        })
    }
}
