//! 端点与尝试循环：构建 → 发送 → 评估 → 重试 / 成功 / 失败。
//!
//! The attempt loop. One logical call may make several attempts; they run
//! strictly one after another and each gets a freshly built, freshly signed
//! request. The only state carried between attempts is the attempt counter
//! and the (rewound) request body.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::model::OperationModel;
use crate::parser::{set_retry_attempts, ParserFactory};
use crate::request::{RequestDescriptor, RequestDict};
use crate::retry::RetryPolicy;
use crate::signer::RequestSigner;
use crate::transport::{HttpResponse, Transport, TransportAdapter};
use crate::{Error, ErrorContext, Result};

/// Result of a single attempt. Exactly one side is populated.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// A response arrived and was parsed; its status may still be an error.
    Success { http: HttpResponse, parsed: Value },
    Failure(Error),
}

impl AttemptOutcome {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AttemptOutcome::Success { http, .. } => Some(http.status_code),
            AttemptOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            AttemptOutcome::Failure(e) => Some(e),
            AttemptOutcome::Success { .. } => None,
        }
    }

    /// Parsed `Error.Code`, if the response carried one.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            AttemptOutcome::Success { parsed, .. } => parsed
                .get("Error")
                .and_then(|e| e.get("Code"))
                .and_then(|c| c.as_str()),
            AttemptOutcome::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<(HttpResponse, Value)> {
        match self {
            AttemptOutcome::Success { http, parsed } => Ok((http, parsed)),
            AttemptOutcome::Failure(e) => Err(e),
        }
    }
}

/// A service endpoint: base URL plus the collaborators needed to run calls
/// against it.
#[derive(Clone)]
pub struct Endpoint {
    host: Url,
    adapter: TransportAdapter,
    signer: Arc<dyn RequestSigner>,
    retry_policy: Arc<dyn RetryPolicy>,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host.as_str())
            .field("max_attempts", &self.retry_policy.max_attempts())
            .finish()
    }
}

impl Endpoint {
    pub fn new(
        endpoint_url: &str,
        transport: Arc<dyn Transport>,
        parsers: Arc<dyn ParserFactory>,
        signer: Arc<dyn RequestSigner>,
        retry_policy: Arc<dyn RetryPolicy>,
    ) -> Result<Self> {
        let host = Url::parse(endpoint_url).map_err(|e| Error::Configuration {
            message: format!("invalid endpoint url '{}': {}", endpoint_url, e),
            context: ErrorContext::new().with_source("endpoint"),
        })?;
        if host.cannot_be_a_base() {
            return Err(Error::configuration(format!(
                "endpoint url '{}' cannot be used as a base url",
                endpoint_url
            )));
        }
        Ok(Self {
            adapter: TransportAdapter::new(transport, parsers, endpoint_url),
            host,
            signer,
            retry_policy,
        })
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.adapter = self.adapter.with_attempt_timeout(timeout);
        self
    }

    pub fn host(&self) -> &Url {
        &self.host
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry_policy.max_attempts()
    }

    fn resolve_url(&self, operation_model: &OperationModel, dict: &RequestDict) -> Result<Url> {
        let base = self.host.as_str().trim_end_matches('/');
        let path = if dict.url_path.starts_with('/') {
            dict.url_path.clone()
        } else {
            format!("/{}", dict.url_path)
        };
        let mut url = Url::parse(&format!("{}{}", base, path)).map_err(|e| {
            Error::serialization_with_context(
                format!("cannot build request url: {}", e),
                ErrorContext::new()
                    .with_operation(operation_model.name.clone())
                    .with_details(path.clone())
                    .with_source("endpoint"),
            )
        })?;
        if !dict.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(dict.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    /// Build and sign the request for one attempt.
    pub async fn create_request(
        &self,
        operation_model: &OperationModel,
        dict: &RequestDict,
        attempt: u32,
    ) -> Result<RequestDescriptor> {
        let mut request = RequestDescriptor {
            method: dict.method.clone(),
            url: self.resolve_url(operation_model, dict)?,
            headers: dict.headers.clone(),
            body: dict.body.clone(),
            attempt,
        };
        self.signer.sign(operation_model, &mut request).await?;
        Ok(request)
    }

    /// Run the attempt loop to completion.
    ///
    /// Returns the final response even when its status is an error; only
    /// failures that produced no response come back as `Err`.
    pub async fn make_request(
        &self,
        operation_model: &OperationModel,
        dict: &RequestDict,
    ) -> Result<(HttpResponse, Value)> {
        let mut attempts: u32 = 1;
        let mut request = self.create_request(operation_model, dict, attempts).await?;

        loop {
            debug!(
                operation = operation_model.name.as_str(),
                attempt = attempts,
                "Sending attempt"
            );
            let outcome = self.adapter.get_response(&request, operation_model).await;

            if self
                .retry_policy
                .should_retry(attempts, operation_model, &outcome)
                .await
            {
                debug!(
                    operation = operation_model.name.as_str(),
                    attempt = attempts,
                    http_status = outcome.status_code(),
                    "Retrying request"
                );
                request.reset_stream().await?;
                attempts += 1;
                request = self.create_request(operation_model, dict, attempts).await?;
                continue;
            }

            debug!(
                operation = operation_model.name.as_str(),
                attempts,
                succeeded = outcome.error().is_none(),
                "Attempt loop finished"
            );
            let (http, mut parsed) = outcome.into_result()?;
            set_retry_attempts(&mut parsed, attempts - 1);
            return Ok((http, parsed));
        }
    }
}
