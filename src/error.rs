use crate::model::ModelError;
use crate::transport::TransportError;
use serde_json::Value;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Operation being invoked when the error occurred (e.g., "GetItem")
    pub operation: Option<String>,
    /// Attempt number (1-based) the error belongs to
    pub attempt: Option<u32>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "json_serializer", "content_hash_signer")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Error code and message extracted from an error-shaped response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

/// A service-level failure: the final HTTP response carried a status >= 300.
#[derive(Debug, Clone)]
pub struct ClientError {
    pub error: ApiErrorDetail,
    pub operation_name: String,
    pub status_code: u16,
    /// The full parsed response, including `ResponseMetadata`.
    pub response: Value,
}

impl ClientError {
    /// Build a client error from a parsed error response.
    ///
    /// Parsers are required to expose at least `Error.Code` / `Error.Message`;
    /// missing fields fall back to `"Unknown"`.
    pub fn from_parsed(parsed: Value, operation_name: impl Into<String>, status_code: u16) -> Self {
        let field = |name: &str| {
            parsed
                .get("Error")
                .and_then(|e| e.get(name))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("Unknown")
                .to_string()
        };
        Self {
            error: ApiErrorDetail {
                code: field("Code"),
                message: field("Message"),
            },
            operation_name: operation_name.into(),
            status_code,
            response: parsed,
        }
    }

    pub fn code(&self) -> &str {
        &self.error.code
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "An error occurred ({}) when calling the {} operation: {}",
            self.error.code, self.operation_name, self.error.message
        )
    }
}

impl std::error::Error for ClientError {}

/// Unified error type for the service runtime.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Service model error: {0}")]
    Model(#[from] ModelError),

    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Could not connect to the endpoint URL: \"{endpoint_url}\"")]
    EndpointConnection {
        endpoint_url: String,
        #[source]
        source: TransportError,
    },

    #[error("Serialization error: {message}{}", format_context(.context))]
    Serialization {
        message: String,
        context: ErrorContext,
    },

    #[error("Signing error: {message}{}", format_context(.context))]
    Signing {
        message: String,
        context: ErrorContext,
    },

    #[error("Response parse error: {message}{}", format_context(.context))]
    Parse {
        message: String,
        context: ErrorContext,
    },

    #[error("Request body cannot be rewound for retry attempt {attempt}")]
    BodyNotRewindable { attempt: u32 },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref op) = ctx.operation {
        parts.push(format!("operation: {}", op));
    }
    if let Some(attempt) = ctx.attempt {
        parts.push(format!("attempt: {}", attempt));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn serialization_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Serialization {
            message: msg.into(),
            context,
        }
    }

    pub fn signing_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Signing {
            message: msg.into(),
            context,
        }
    }

    pub fn parse_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Parse {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Transport-class failures: the request may not have reached the service,
    /// or its response could not be read. These are candidates for retry.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::EndpointConnection { .. })
    }

    /// True for the unknown-operation failure raised by the service model.
    pub fn is_unknown_operation(&self) -> bool {
        matches!(self, Error::Model(ModelError::UnknownOperation { .. }))
    }

    /// The structured service error, if this is one.
    pub fn as_client_error(&self) -> Option<&ClientError> {
        match self {
            Error::Client(e) => Some(e),
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Serialization { context, .. }
            | Error::Signing { context, .. }
            | Error::Parse { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}
