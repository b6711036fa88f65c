//! Raw response → [`ResponseEnvelope`].

use bytes::BytesMut;
use futures::StreamExt;
use tracing::debug;

use super::{RawResponse, ResponseEnvelope, TransportError};
use crate::model::OperationModel;
use crate::Result;

/// Read the response body and package it with status and headers.
///
/// Error responses and ordinary outputs are read eagerly. Outputs whose model
/// declares a streaming payload are buffered as well; the parser receives the
/// full body either way. A read failure returns an error and no partial
/// envelope.
pub async fn decode(raw: RawResponse, operation_model: &OperationModel) -> Result<ResponseEnvelope> {
    let RawResponse {
        status,
        headers,
        mut body,
    } = raw;

    if status < 300 && operation_model.has_streaming_output {
        debug!(
            operation = operation_model.name.as_str(),
            http_status = status,
            "buffering streaming output body"
        );
    }

    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| match e {
            TransportError::Http(e) => TransportError::Decode(e.to_string()),
            other => other,
        })?;
        buf.extend_from_slice(&chunk);
    }

    Ok(ResponseEnvelope {
        headers,
        status_code: status,
        body: buf.freeze(),
    })
}
