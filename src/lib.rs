//! # svc-lib-rust
//!
//! 面向签名、带版本的 HTTP 服务 API 的请求执行运行时：把一次操作调用变成若干次 HTTP 尝试，
//! 并返回解析后的结果或结构化错误。
//!
//! Request execution runtime for signed, versioned HTTP service APIs. An
//! operation invocation becomes zero or more HTTP attempts; each response is
//! classified as success, retryable failure or fatal failure, and the call
//! returns either the parsed output or a terminal error.
//!
//! ## Overview
//!
//! Nothing about a particular operation is hardcoded. The [`model::ServiceModel`]
//! describes every operation's HTTP binding and wire protocol; the serializer,
//! signer, parser and retry policy are collaborators behind traits, supplied by
//! a [`session::ComponentFactory`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use svc_lib_rust::{get_session, ServiceModel};
//!
//! #[tokio::main]
//! async fn main() -> svc_lib_rust::Result<()> {
//!     let model = ServiceModel::from_json_str(&std::fs::read_to_string("models/table/service.json")?)?;
//!     let client = get_session(None).create_client(Arc::new(model), Some("http://localhost:8000"))?;
//!
//!     let item = client
//!         .invoke("GetItem", serde_json::json!({"TableName": "users", "Key": {"id": {"S": "42"}}}))
//!         .await?;
//!     println!("{}", item["ResponseMetadata"]["RequestId"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | `ServiceClient::invoke` and its builder |
//! | [`endpoint`] | Attempt loop and attempt outcomes |
//! | [`retry`] | Response classifier and backoff policy |
//! | [`transport`] | HTTP transport, adapter and response decoder |
//! | [`model`] | Service and operation models, model loader |
//! | [`serialize`] / [`signer`] / [`parser`] | Request and response collaborators |
//! | [`events`] | Hierarchical `after-call` hooks |
//! | [`session`] | Shared configuration and component factory |

pub mod client;
pub mod config;
pub mod endpoint;
pub mod events;
pub mod model;
pub mod parser;
pub mod request;
pub mod retry;
pub mod serialize;
pub mod session;
pub mod signer;
pub mod transport;

// Re-export main types for convenience
pub use client::{ClientBuilder, ServiceClient};
pub use config::{ClientConfig, EnvVars};
pub use endpoint::{AttemptOutcome, Endpoint};
pub use events::{CallEvent, EventEmitter, EventHook};
pub use model::{OperationModel, ServiceModel, ServiceModelLoader};
pub use request::{RequestBody, RequestDescriptor, RequestDict, StreamBody};
pub use retry::{RetryClassifier, RetryPolicy, StandardClassifier, StandardRetryPolicy};
pub use session::{get_session, ComponentFactory, DefaultComponentFactory, Session};
pub use transport::{HttpResponse, HttpTransport, RawResponse, ResponseEnvelope, Transport, TransportError};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{ClientError, Error, ErrorContext};
