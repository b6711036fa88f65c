//! Input serializers: operation parameters → [`RequestDict`].

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::model::{OperationModel, ShapeRef};
use crate::request::{RequestBody, RequestDict};
use crate::{Error, ErrorContext, Result};

pub trait RequestSerializer: Send + Sync {
    fn serialize(&self, params: &Value, operation_model: &OperationModel) -> Result<RequestDict>;
}

/// Serializer for the `json` and `rest-json` protocols.
///
/// `json` posts the whole parameter object with an `X-Amz-Target` header.
/// `rest-json` fills `{Label}` / `{Label+}` URI placeholders, routes members
/// bound to `header` or `querystring` locations, and sends the rest as the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

fn serialize_error(op: &OperationModel, msg: impl Into<String>) -> Error {
    Error::serialization_with_context(
        msg,
        ErrorContext::new()
            .with_operation(op.name.clone())
            .with_source("json_serializer"),
    )
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl JsonSerializer {
    fn params_object(params: &Value, op: &OperationModel) -> Result<Map<String, Value>> {
        match params {
            Value::Null => Ok(Map::new()),
            Value::Object(map) => Ok(map.clone()),
            _ => Err(serialize_error(op, "operation parameters must be a JSON object")),
        }
    }

    fn serialize_json(&self, params: Map<String, Value>, op: &OperationModel) -> Result<RequestDict> {
        let json_version = op.metadata.json_version.as_deref().unwrap_or("1.0");
        let body = serde_json::to_vec(&Value::Object(params))?;

        let mut dict = RequestDict::new(op.http.method.clone(), op.http.request_uri.clone())
            .with_header("Content-Type", format!("application/x-amz-json-{}", json_version))
            .with_body(body);
        if let Some(prefix) = op.metadata.target_prefix.as_deref() {
            dict = dict.with_header("X-Amz-Target", format!("{}.{}", prefix, op.name));
        }
        Ok(dict)
    }

    fn expand_uri(template: &str, params: &mut Map<String, Value>, op: &OperationModel) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let end = rest[start..]
                .find('}')
                .map(|e| start + e)
                .ok_or_else(|| serialize_error(op, format!("unterminated label in '{}'", template)))?;
            let label = &rest[start + 1..end];
            let (name, greedy) = match label.strip_suffix('+') {
                Some(n) => (n, true),
                None => (label, false),
            };
            let value = params
                .remove(name)
                .as_ref()
                .and_then(scalar_to_string)
                .ok_or_else(|| serialize_error(op, format!("missing required URI parameter '{}'", name)))?;
            if greedy {
                let encoded: Vec<String> = value.split('/').map(encode_segment).collect();
                out.push_str(&encoded.join("/"));
            } else {
                out.push_str(&encode_segment(&value));
            }
            rest = &rest[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn serialize_rest_json(&self, mut params: Map<String, Value>, op: &OperationModel) -> Result<RequestDict> {
        // Templates may carry a fixed query part ("/path?list-type=2")
        let (path_template, fixed_query) = match op.http.request_uri.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (op.http.request_uri.as_str(), None),
        };
        let path = Self::expand_uri(path_template, &mut params, op)?;
        let mut dict = RequestDict::new(op.http.method.clone(), path);

        if let Some(q) = fixed_query {
            for (k, v) in url::form_urlencoded::parse(q.as_bytes()) {
                dict = dict.with_query(k.into_owned(), v.into_owned());
            }
        }

        let members: BTreeMap<String, ShapeRef> = op
            .input_shape
            .as_ref()
            .map(|s| s.members.clone())
            .unwrap_or_default();
        for (name, member) in &members {
            let Some(location) = member.location.as_deref() else {
                continue;
            };
            let wire_name = member.location_name.clone().unwrap_or_else(|| name.clone());
            match location {
                "header" | "querystring" => {
                    if let Some(value) = params.remove(name) {
                        let text = scalar_to_string(&value).ok_or_else(|| {
                            serialize_error(op, format!("member '{}' must be a scalar", name))
                        })?;
                        dict = if location == "header" {
                            dict.with_header(wire_name, text)
                        } else {
                            dict.with_query(wire_name, text)
                        };
                    }
                }
                // URI members were consumed by the template
                _ => {
                    params.remove(name);
                }
            }
        }

        let payload = op.input_shape.as_ref().and_then(|s| s.payload.clone());
        let body = match payload {
            Some(member) => match params.remove(&member) {
                Some(Value::String(s)) => RequestBody::from(s),
                Some(Value::Null) | None => RequestBody::Empty,
                Some(other) => {
                    dict = dict.with_header("Content-Type", "application/json");
                    RequestBody::from(serde_json::to_vec(&other)?)
                }
            },
            None if params.is_empty() => RequestBody::Empty,
            None => {
                dict = dict.with_header("Content-Type", "application/json");
                RequestBody::from(serde_json::to_vec(&Value::Object(params))?)
            }
        };
        Ok(dict.with_body(body))
    }
}

impl RequestSerializer for JsonSerializer {
    fn serialize(&self, params: &Value, operation_model: &OperationModel) -> Result<RequestDict> {
        let params = Self::params_object(params, operation_model)?;
        match operation_model.protocol() {
            "json" => self.serialize_json(params, operation_model),
            "rest-json" => self.serialize_rest_json(params, operation_model),
            other => Err(serialize_error(
                operation_model,
                format!("unsupported protocol '{}'", other),
            )),
        }
    }
}
