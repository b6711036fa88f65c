//! 服务模型层：描述每个操作对应的 URL、HTTP 方法与数据形状。
//!
//! # Service Model Layer
//!
//! Read-only descriptions of a versioned service API. The execution core never
//! hardcodes an operation: it asks the [`ServiceModel`] for an [`OperationModel`]
//! and reads the HTTP binding, wire protocol and output shape from it.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`service`] | Service document, metadata and operation resolution |
//! | [`operation`] | Operation model, HTTP binding and shapes |
//! | [`loader`] | JSON/YAML loading with an LRU cache |
//! | [`error`] | Model-specific error types |

pub mod error;
pub mod loader;
pub mod operation;
pub mod service;

pub use error::ModelError;
pub use loader::ServiceModelLoader;
pub use operation::{HttpBinding, OperationDefinition, OperationModel, Shape, ShapeRef};
pub use service::{ServiceMetadata, ServiceModel};
