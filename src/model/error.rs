//! Service model error types

/// Service model error types
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to load service model from {path}: {reason}{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    LoadError {
        path: String,
        reason: String,
        hint: Option<String>,
    },

    #[error("Operation not found: '{name}' is not defined by service '{service}'")]
    UnknownOperation { name: String, service: String },

    #[error("Service model not found: {id}{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    NotFound { id: String, hint: Option<String> },

    #[error("Shape '{shape}' referenced by {referenced_by} is not defined")]
    MissingShape {
        shape: String,
        referenced_by: String,
    },

    #[error("Service model validation failed: {0}")]
    ValidationError(String),

    #[error("Internal model error: {0}")]
    Internal(String),

    #[error("YAML syntax error: {0}")]
    YamlError(String),
}

impl ModelError {
    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        match self {
            ModelError::LoadError { ref mut hint, .. } => *hint = hint_val,
            ModelError::NotFound { ref mut hint, .. } => *hint = hint_val,
            _ => (),
        }
        self
    }
}
