use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::ModelError;
use super::operation::{OperationDefinition, OperationModel, Shape, ShapeRef};

/// Service-wide metadata shared by every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    #[serde(default)]
    pub api_version: String,
    pub endpoint_prefix: String,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
}

impl ServiceMetadata {
    pub fn new(endpoint_prefix: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self {
            api_version: String::new(),
            endpoint_prefix: endpoint_prefix.into(),
            protocol: protocol.into(),
            target_prefix: None,
            json_version: None,
            signing_name: None,
            service_id: None,
        }
    }

    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = Some(prefix.into());
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
}

/// Description of a versioned service API: which operations exist and which
/// HTTP binding and shapes each one uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceModel {
    pub metadata: ServiceMetadata,
    #[serde(default)]
    pub operations: BTreeMap<String, OperationDefinition>,
    #[serde(default)]
    pub shapes: BTreeMap<String, Shape>,
}

impl ServiceModel {
    pub fn from_json_str(content: &str) -> Result<Self, ModelError> {
        let model: ServiceModel = serde_json::from_str(content)
            .map_err(|e| ModelError::ValidationError(format!("Invalid JSON service model: {}", e)))?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ModelError> {
        let model: ServiceModel =
            serde_yaml::from_str(content).map_err(|e| ModelError::YamlError(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    /// Check that every shape referenced by an operation or member is defined.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.metadata.endpoint_prefix.trim().is_empty() {
            return Err(ModelError::ValidationError(
                "metadata.endpointPrefix must be non-empty".to_string(),
            ));
        }
        if self.metadata.protocol.trim().is_empty() {
            return Err(ModelError::ValidationError(
                "metadata.protocol must be non-empty".to_string(),
            ));
        }

        for (op_name, op) in &self.operations {
            for shape_ref in op.input.iter().chain(op.output.iter()) {
                self.require_shape(shape_ref, &format!("operation {}", op_name))?;
            }
        }
        for (shape_name, shape) in &self.shapes {
            for (member_name, member) in &shape.members {
                self.require_shape(member, &format!("{}.{}", shape_name, member_name))?;
            }
        }
        Ok(())
    }

    fn require_shape(&self, shape_ref: &ShapeRef, referenced_by: &str) -> Result<(), ModelError> {
        if self.shapes.contains_key(&shape_ref.shape) {
            Ok(())
        } else {
            Err(ModelError::MissingShape {
                shape: shape_ref.shape.clone(),
                referenced_by: referenced_by.to_string(),
            })
        }
    }

    pub fn endpoint_prefix(&self) -> &str {
        &self.metadata.endpoint_prefix
    }

    /// Human-facing service name; prefers `serviceId` over the endpoint prefix.
    pub fn service_name(&self) -> &str {
        self.metadata
            .service_id
            .as_deref()
            .unwrap_or(&self.metadata.endpoint_prefix)
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(|s| s.as_str())
    }

    /// Resolve an operation by name.
    pub fn operation_model(&self, name: &str) -> Result<OperationModel, ModelError> {
        let op = self
            .operations
            .get(name)
            .ok_or_else(|| ModelError::UnknownOperation {
                name: name.to_string(),
                service: self.service_name().to_string(),
            })?;

        let resolve = |r: &Option<ShapeRef>| r.as_ref().and_then(|r| self.shapes.get(&r.shape)).cloned();
        let input_shape = resolve(&op.input);
        let output_shape = resolve(&op.output);
        let has_streaming_output = output_shape
            .as_ref()
            .map(|s| self.has_streaming_payload(s))
            .unwrap_or(false);

        Ok(OperationModel {
            name: op.name.clone().unwrap_or_else(|| name.to_string()),
            http: op.http.clone(),
            metadata: self.metadata.clone(),
            input_shape,
            output_shape,
            has_streaming_output,
        })
    }

    fn has_streaming_payload(&self, output: &Shape) -> bool {
        output
            .payload
            .as_ref()
            .and_then(|p| output.members.get(p))
            .and_then(|m| self.shapes.get(&m.shape))
            .map(|s| s.streaming)
            .unwrap_or(false)
    }
}
