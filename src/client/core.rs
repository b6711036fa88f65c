use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::error::ClientError;
use crate::events::{CallEvent, EventEmitter, AFTER_CALL};
use crate::model::ServiceModel;
use crate::serialize::RequestSerializer;
use crate::{Error, Result};

pub(crate) struct ClientInner {
    pub(crate) service_model: Arc<ServiceModel>,
    pub(crate) serializer: Arc<dyn RequestSerializer>,
    pub(crate) endpoint: Endpoint,
    pub(crate) events: Arc<EventEmitter>,
}

/// Client bound to one service model and one endpoint.
///
/// Cloning is cheap; clones share every collaborator, so independent calls
/// can run concurrently from different tasks.
#[derive(Clone)]
pub struct ServiceClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("service", &self.inner.service_model.service_name())
            .field("endpoint", &self.inner.endpoint)
            .finish()
    }
}

impl ServiceClient {
    pub fn service_model(&self) -> &ServiceModel {
        &self.inner.service_model
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    /// Hook registry used by this client.
    pub fn events(&self) -> &EventEmitter {
        &self.inner.events
    }

    /// Invoke `operation_name` with `api_params`.
    ///
    /// Returns the parsed output when the final response status is below 300.
    /// A final status of 300 or more becomes [`Error::Client`]; a failure that
    /// produced no response is returned as is.
    pub async fn invoke(&self, operation_name: &str, api_params: Value) -> Result<Value> {
        let inner = &self.inner;
        let operation_model = inner.service_model.operation_model(operation_name)?;
        let request_dict = inner.serializer.serialize(&api_params, &operation_model)?;

        let start = Instant::now();
        let (http, parsed) = inner
            .endpoint
            .make_request(&operation_model, &request_dict)
            .await?;

        let event_name = format!(
            "{}.{}.{}",
            AFTER_CALL,
            operation_model.endpoint_prefix(),
            operation_model.name
        );
        let event = CallEvent {
            name: event_name.clone(),
            http_response: http,
            parsed,
            model: operation_model,
        };
        let hooks = inner.events.emit(&event_name, &event).await;
        debug!(event = event_name.as_str(), hooks, "after-call emitted");

        let CallEvent {
            http_response,
            parsed,
            model,
            ..
        } = event;

        info!(
            operation = model.name.as_str(),
            http_status = http_response.status_code,
            retry_attempts = parsed["ResponseMetadata"]["RetryAttempts"].as_u64().unwrap_or(0),
            endpoint = inner.endpoint.host().as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "service call completed"
        );

        if http_response.status_code >= 300 {
            return Err(Error::Client(ClientError::from_parsed(
                parsed,
                model.name,
                http_response.status_code,
            )));
        }
        Ok(parsed)
    }
}
