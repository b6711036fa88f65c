//! Request signers. Called once per attempt on a freshly built descriptor.

use async_trait::async_trait;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::model::OperationModel;
use crate::request::{RequestBody, RequestDescriptor};
use crate::{Error, ErrorContext, Result};

pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

#[async_trait]
pub trait RequestSigner: Send + Sync {
    async fn sign(&self, operation_model: &OperationModel, request: &mut RequestDescriptor) -> Result<()>;
}

/// Leaves requests untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSigner;

#[async_trait]
impl RequestSigner for NoopSigner {
    async fn sign(&self, _operation_model: &OperationModel, _request: &mut RequestDescriptor) -> Result<()> {
        Ok(())
    }
}

/// Static key pair used by [`ContentHashSigner`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

fn hex_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

/// Stamps a date, a body digest and a per-attempt invocation id, and, when
/// credentials are present, a keyed signature over method, path and digest.
///
/// One-shot stream bodies cannot be hashed without consuming them and are
/// marked `UNSIGNED-PAYLOAD`.
#[derive(Debug, Clone, Default)]
pub struct ContentHashSigner {
    credentials: Option<Credentials>,
}

impl ContentHashSigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        });
        self
    }

    async fn payload_hash(request: &RequestDescriptor) -> std::io::Result<String> {
        match &request.body {
            RequestBody::Empty => Ok(hex_digest(b"")),
            RequestBody::Bytes(b) => Ok(hex_digest(b)),
            RequestBody::Stream(s) => Ok(s
                .peek_bytes()
                .await?
                .map(|b| hex_digest(&b))
                .unwrap_or_else(|| UNSIGNED_PAYLOAD.to_string())),
        }
    }
}

#[async_trait]
impl RequestSigner for ContentHashSigner {
    async fn sign(&self, operation_model: &OperationModel, request: &mut RequestDescriptor) -> Result<()> {
        let payload_hash = Self::payload_hash(request).await.map_err(|e| {
            Error::signing_with_context(
                format!("failed to hash request body: {}", e),
                ErrorContext::new()
                    .with_operation(operation_model.name.clone())
                    .with_attempt(request.attempt)
                    .with_source("content_hash_signer"),
            )
        })?;
        let date = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

        request.headers.insert("X-Amz-Date".to_string(), date.clone());
        request
            .headers
            .insert("X-Amz-Content-Sha256".to_string(), payload_hash.clone());
        request.headers.insert(
            "amz-sdk-invocation-id".to_string(),
            uuid::Uuid::new_v4().to_string(),
        );
        request
            .headers
            .insert("amz-sdk-request".to_string(), format!("attempt={}", request.attempt));

        if let Some(creds) = &self.credentials {
            let scope = operation_model
                .metadata
                .signing_name
                .as_deref()
                .unwrap_or(operation_model.endpoint_prefix());
            let canonical = format!(
                "{}\n{}\n{}\n{}",
                request.method.to_uppercase(),
                request.url.path(),
                date,
                payload_hash
            );
            let mut hasher = Sha256::new();
            hasher.update(creds.secret_key.as_bytes());
            hasher.update(canonical.as_bytes());
            let signature = base64::engine::general_purpose::STANDARD.encode(hasher.finalize());
            request.headers.insert(
                "Authorization".to_string(),
                format!(
                    "SVC-SHA256 Credential={}/{}/{}, Signature={}",
                    creds.access_key,
                    &date[..8],
                    scope,
                    signature
                ),
            );
        }
        Ok(())
    }
}
