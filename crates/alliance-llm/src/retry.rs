//! Retry decorator for any [`LlmProvider`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};

use crate::error::Result;
use crate::types::{CompletionRequest, CompletionResponse};
use crate::LlmProvider;

/// Retries transient provider failures with exponential backoff.
///
/// Only errors for which [`LlmError::is_retryable`](crate::LlmError::is_retryable)
/// holds are retried; quota and configuration errors surface immediately.
pub struct RetryWrapper {
    inner: Arc<dyn LlmProvider>,
    max_retries: usize,
    min_delay: Duration,
}

impl RetryWrapper {
    /// Wraps a provider with 3 retries starting at 500 ms.
    pub fn new(inner: Arc<dyn LlmProvider>) -> Self {
        Self {
            inner,
            max_retries: 3,
            min_delay: Duration::from_millis(500),
        }
    }

    /// Sets the number of retries after the first attempt.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the first backoff delay.
    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }
}

#[async_trait]
impl LlmProvider for RetryWrapper {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_times(self.max_retries)
            .with_jitter();

        (|| async { self.inner.complete(request.clone()).await })
            .retry(backoff)
            .when(|e| e.is_retryable())
            .notify(|err, delay| {
                tracing::warn!(error = %err, ?delay, "Retrying LLM call");
            })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{LlmError, Message, MockLlmProvider};

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![Message::user("ping")])
    }

    fn overloaded() -> LlmError {
        LlmError::Api {
            status: 503,
            message: "overloaded".into(),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let mock = Arc::new(
            MockLlmProvider::with_response("pong")
                .with_failures(vec![overloaded(), overloaded()]),
        );
        let wrapper = RetryWrapper::new(mock.clone()).with_min_delay(Duration::from_millis(1));

        let response = wrapper.complete(request()).await.unwrap();
        assert_eq!(response.content, "pong");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let failures = (0..5).map(|_| overloaded()).collect();
        let mock = Arc::new(MockLlmProvider::with_response("pong").with_failures(failures));
        let wrapper = RetryWrapper::new(mock.clone())
            .with_max_retries(2)
            .with_min_delay(Duration::from_millis(1));

        assert!(wrapper.complete(request()).await.is_err());
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_quota_errors() {
        let mock = Arc::new(MockLlmProvider::with_response("pong").with_failures(vec![
            LlmError::QuotaExceeded {
                message: "quota".into(),
            },
        ]));
        let wrapper = RetryWrapper::new(mock.clone()).with_min_delay(Duration::from_millis(1));

        let err = wrapper.complete(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::QuotaExceeded { .. }));
        assert_eq!(mock.call_count(), 1);
    }
}
