use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::endpoint::AttemptOutcome;
use crate::model::OperationModel;

static THROTTLING_CODES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Throttling",
        "ThrottlingException",
        "ThrottledException",
        "RequestThrottledException",
        "TooManyRequestsException",
        "ProvisionedThroughputExceededException",
        "TransactionInProgressException",
        "RequestLimitExceeded",
        "BandwidthLimitExceeded",
        "LimitExceededException",
        "RequestThrottled",
        "SlowDown",
        "PriorRequestNotComplete",
        "EC2ThrottledException",
    ]
    .into_iter()
    .collect()
});

/// Error codes the service uses to signal throttling.
pub fn is_throttling_code(code: &str) -> bool {
    THROTTLING_CODES.contains(code)
}

/// Decides whether an attempt outcome warrants another attempt.
///
/// Implementations must be pure: same inputs, same answer, no side effects.
pub trait RetryClassifier: Send + Sync {
    fn needs_retry(&self, attempt: u32, operation_model: &OperationModel, outcome: &AttemptOutcome) -> bool;
}

/// Retries transport failures, 5xx, 429 and throttling error codes, up to
/// `max_attempts` total attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardClassifier {
    pub max_attempts: u32,
}

impl StandardClassifier {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    fn is_retryable_status(status: u16) -> bool {
        (500..=599).contains(&status) || status == 429
    }
}

impl RetryClassifier for StandardClassifier {
    fn needs_retry(&self, attempt: u32, _operation_model: &OperationModel, outcome: &AttemptOutcome) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        match outcome {
            AttemptOutcome::Failure(err) => err.is_transport(),
            AttemptOutcome::Success { http, .. } => {
                Self::is_retryable_status(http.status_code)
                    || (http.status_code >= 300 && outcome.error_code().map(is_throttling_code).unwrap_or(false))
            }
        }
    }
}
