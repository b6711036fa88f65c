use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::classifier::{RetryClassifier, StandardClassifier};
use crate::endpoint::AttemptOutcome;
use crate::model::OperationModel;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(50);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(20);

/// Answers the attempt loop's one question: go again?
///
/// When the answer is `true` the policy has already waited out any backoff.
#[async_trait]
pub trait RetryPolicy: Send + Sync {
    fn max_attempts(&self) -> u32;

    async fn should_retry(&self, attempt: u32, operation_model: &OperationModel, outcome: &AttemptOutcome) -> bool;
}

/// Classifier plus capped exponential backoff with optional full jitter.
#[derive(Clone)]
pub struct StandardRetryPolicy {
    classifier: Arc<dyn RetryClassifier>,
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl StandardRetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        let max_attempts = max_attempts.max(1);
        Self {
            classifier: Arc::new(StandardClassifier::new(max_attempts)),
            max_attempts,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: true,
        }
    }

    /// Same decisions, zero delay.
    pub fn no_backoff(max_attempts: u32) -> Self {
        Self::new(max_attempts)
            .with_base_delay(Duration::ZERO)
            .with_jitter(false)
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replace the classifier. The attempt ceiling still applies.
    pub fn with_classifier(mut self, classifier: Arc<dyn RetryClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Upper bound of the delay before attempt `attempt + 1`:
    /// `base * 2^(attempt - 1)`, capped at `max_delay`.
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let factor = 1u32.checked_shl(exp).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let ceiling = self.backoff_ceiling(attempt);
        if !self.jitter || ceiling.is_zero() {
            return ceiling;
        }
        let ms = ceiling.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=ms))
    }
}

impl Default for StandardRetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

#[async_trait]
impl RetryPolicy for StandardRetryPolicy {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    async fn should_retry(&self, attempt: u32, operation_model: &OperationModel, outcome: &AttemptOutcome) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        if !self.classifier.needs_retry(attempt, operation_model, outcome) {
            return false;
        }

        let delay = self.backoff_delay(attempt);
        warn!(
            operation = operation_model.name.as_str(),
            attempt,
            http_status = outcome.status_code(),
            delay_ms = delay.as_millis() as u64,
            "retryable outcome; backing off"
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        true
    }
}
