//! 重试决策：响应分类器与带退避的重试策略。
//!
//! Retry decisions. The [`classifier`] answers "is this outcome worth another
//! attempt?" without side effects; the [`policy`] wraps it with the backoff
//! delay, so the attempt loop only ever asks a yes/no question.

pub mod classifier;
pub mod policy;

pub use classifier::{is_throttling_code, RetryClassifier, StandardClassifier};
pub use policy::{RetryPolicy, StandardRetryPolicy};
