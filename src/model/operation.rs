//! Read-only operation descriptions handed to the execution core.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::service::ServiceMetadata;

/// HTTP binding of an operation (verb + request URI template).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpBinding {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_request_uri")]
    pub request_uri: String,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_request_uri() -> String {
    "/".to_string()
}

impl Default for HttpBinding {
    fn default() -> Self {
        Self {
            method: default_method(),
            request_uri: default_request_uri(),
        }
    }
}

/// Reference from an operation or structure member to a named shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRef {
    pub shape: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
}

/// A named data shape from the service model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub members: BTreeMap<String, ShapeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default)]
    pub streaming: bool,
}

/// Raw operation definition as it appears in a service model document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub http: HttpBinding,
    #[serde(default)]
    pub input: Option<ShapeRef>,
    #[serde(default)]
    pub output: Option<ShapeRef>,
}

/// Resolved, self-contained view of one operation.
///
/// Owned by the service model; the execution core only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationModel {
    pub name: String,
    pub http: HttpBinding,
    pub metadata: ServiceMetadata,
    pub input_shape: Option<Shape>,
    pub output_shape: Option<Shape>,
    pub has_streaming_output: bool,
}

impl OperationModel {
    /// Wire protocol used to pick the response parser (e.g. "json", "rest-json").
    pub fn protocol(&self) -> &str {
        &self.metadata.protocol
    }

    /// Service namespace used in event names.
    pub fn endpoint_prefix(&self) -> &str {
        &self.metadata.endpoint_prefix
    }

    /// Minimal operation model for tests and ad-hoc calls.
    pub fn new(name: impl Into<String>, metadata: ServiceMetadata) -> Self {
        Self {
            name: name.into(),
            http: HttpBinding::default(),
            metadata,
            input_shape: None,
            output_shape: None,
            has_streaming_output: false,
        }
    }

    pub fn with_http(mut self, method: impl Into<String>, request_uri: impl Into<String>) -> Self {
        self.http = HttpBinding {
            method: method.into(),
            request_uri: request_uri.into(),
        };
        self
    }

    pub fn with_streaming_output(mut self, streaming: bool) -> Self {
        self.has_streaming_output = streaming;
        self
    }
}
