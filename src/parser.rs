//! Response parsers, selected by the service's wire protocol.
//!
//! Parsers turn a [`ResponseEnvelope`] into a JSON object. Error responses must
//! still parse: the result carries at least `Error.Code` and `Error.Message`.
//! Every result carries a `ResponseMetadata` block.

use base64::Engine as _;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::model::Shape;
use crate::transport::ResponseEnvelope;
use crate::{Error, ErrorContext, Result};

pub trait ResponseParser: Send + Sync {
    fn parse(&self, response: &ResponseEnvelope, shape: Option<&Shape>) -> Result<Value>;
}

pub trait ParserFactory: Send + Sync {
    fn create_parser(&self, protocol: &str) -> Result<Arc<dyn ResponseParser>>;
}

/// Knows the JSON-family protocols (`json`, `rest-json`).
#[derive(Clone)]
pub struct DefaultParserFactory {
    json: Arc<JsonParser>,
}

impl DefaultParserFactory {
    pub fn new() -> Self {
        Self {
            json: Arc::new(JsonParser),
        }
    }
}

impl Default for DefaultParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory for DefaultParserFactory {
    fn create_parser(&self, protocol: &str) -> Result<Arc<dyn ResponseParser>> {
        match protocol {
            "json" | "rest-json" => Ok(self.json.clone()),
            other => Err(Error::parse_with_context(
                format!("no response parser for protocol '{}'", other),
                ErrorContext::new().with_source("parser_factory"),
            )),
        }
    }
}

const REQUEST_ID_HEADERS: &[&str] = &["x-amzn-requestid", "x-amz-request-id", "x-request-id"];

/// `ResponseMetadata` block for a response. `RetryAttempts` starts at 0 and
/// is filled in by the endpoint once the attempt loop finishes.
pub fn response_metadata(response: &ResponseEnvelope) -> Value {
    let mut headers = Map::new();
    for (name, value) in &response.headers {
        if let Ok(v) = value.to_str() {
            headers.insert(name.as_str().to_string(), Value::String(v.to_string()));
        }
    }
    let request_id = REQUEST_ID_HEADERS
        .iter()
        .find_map(|h| response.headers.get(*h))
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    json!({
        "RequestId": request_id,
        "HTTPStatusCode": response.status_code,
        "HTTPHeaders": headers,
        "RetryAttempts": 0,
    })
}

/// Record how many retries a call took (`attempts - 1`).
pub fn set_retry_attempts(parsed: &mut Value, retries: u32) {
    if let Some(meta) = parsed
        .get_mut("ResponseMetadata")
        .and_then(|m| m.as_object_mut())
    {
        meta.insert("RetryAttempts".to_string(), json!(retries));
    }
}

/// Parser for the JSON-family protocols.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl JsonParser {
    fn parse_error(&self, response: &ResponseEnvelope, body: Option<&Value>) -> Value {
        // Header wins; values look like "ValidationException:http://internal.amazon.com/..."
        let from_header = response
            .headers
            .get("x-amzn-errortype")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(':').next().unwrap_or(v).to_string());

        let field = |names: &[&str]| {
            body.and_then(|b| names.iter().find_map(|n| b.get(*n)))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        let code = from_header
            .or_else(|| field(&["__type", "code", "Code"]))
            .map(|c| c.rsplit('#').next().unwrap_or(&c).to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| response.status_code.to_string());

        let message = field(&["message", "Message", "errorMessage"]).unwrap_or_else(|| {
            if body.is_none() {
                String::from_utf8_lossy(&response.body).trim().to_string()
            } else {
                String::new()
            }
        });

        json!({ "Code": code, "Message": message })
    }

    fn shape_output(body: Value, response: &ResponseEnvelope, shape: Option<&Shape>) -> Map<String, Value> {
        if let Some(payload) = shape.and_then(|s| s.payload.as_deref()) {
            let mut out = Map::new();
            let value = if body.is_null() {
                Value::String(base64::engine::general_purpose::STANDARD.encode(&response.body))
            } else {
                body
            };
            out.insert(payload.to_string(), value);
            return out;
        }
        match body {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut out = Map::new();
                out.insert("Body".to_string(), other);
                out
            }
        }
    }
}

impl ResponseParser for JsonParser {
    fn parse(&self, response: &ResponseEnvelope, shape: Option<&Shape>) -> Result<Value> {
        let body: Option<Value> = if response.body.iter().all(|b| b.is_ascii_whitespace()) {
            None
        } else {
            serde_json::from_slice(&response.body).ok()
        };
        let metadata = response_metadata(response);

        if response.status_code >= 300 {
            let error = self.parse_error(response, body.as_ref());
            return Ok(json!({ "Error": error, "ResponseMetadata": metadata }));
        }

        let body = match body {
            Some(v) => v,
            None if response.body.iter().all(|b| b.is_ascii_whitespace()) => Value::Null,
            // Undecodable payload members are carried as base64
            None if shape.and_then(|s| s.payload.as_ref()).is_some() => Value::Null,
            None => {
                return Err(Error::parse_with_context(
                    "response body is not valid JSON",
                    ErrorContext::new()
                        .with_details(format!("status {}", response.status_code))
                        .with_source("json_parser"),
                ))
            }
        };

        let mut out = Self::shape_output(body, response, shape);
        out.insert("ResponseMetadata".to_string(), metadata);
        Ok(Value::Object(out))
    }
}
