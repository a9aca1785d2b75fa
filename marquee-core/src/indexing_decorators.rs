use std::fmt::Debug;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::LanguageModelError;
use crate::prompt::Prompt;
use crate::{EmbeddingModel, Embeddings, SimplePrompt};

/// Backoff configuration for api calls.
/// Each time an api call fails backoff will wait an increasing, randomized period of time before
/// the next attempt, up to `max_attempts` attempts in total. see
/// <https://docs.rs/backoff/latest/backoff/> for more details.
#[derive(Debug, Clone, Copy)]
pub struct BackoffConfiguration {
    /// Interval before the first retry
    pub initial_interval: Duration,
    /// The factor by which the interval is multiplied on each retry attempt
    pub multiplier: f64,
    /// Introduces randomness to avoid retry storms
    pub randomization_factor: f64,
    /// Upper bound for a single wait between attempts
    pub max_interval: Duration,
    /// Total number of attempts, including the first one
    pub max_attempts: usize,
}

impl Default for BackoffConfiguration {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            multiplier: 2.0,
            randomization_factor: 0.5,
            max_interval: Duration::from_secs(20),
            max_attempts: 6,
        }
    }
}

/// Retries a language model with a randomized exponential backoff.
///
/// Every failure is retried except [`LanguageModelError::ContextLengthExceeded`]; once
/// `max_attempts` calls failed, the last error is returned.
#[derive(Debug, Clone)]
pub struct LanguageModelWithBackOff<P: Clone> {
    pub(crate) inner: P,
    config: BackoffConfiguration,
}

impl<P: Clone> LanguageModelWithBackOff<P> {
    pub fn new(client: P, config: BackoffConfiguration) -> Self {
        Self {
            inner: client,
            config,
        }
    }

    pub(crate) fn strategy(&self) -> backoff::ExponentialBackoff {
        backoff::ExponentialBackoffBuilder::default()
            .with_initial_interval(self.config.initial_interval)
            .with_multiplier(self.config.multiplier)
            .with_randomization_factor(self.config.randomization_factor)
            .with_max_interval(self.config.max_interval)
            .with_max_elapsed_time(None)
            .build()
    }

    async fn retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, LanguageModelError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LanguageModelError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let attempts = AtomicUsize::new(0);

        let op = || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let fut = call();
            async move {
                fut.await.map_err(|error| {
                    if !error.is_retryable() {
                        backoff::Error::Permanent(error)
                    } else if attempt >= max_attempts {
                        tracing::error!(operation, attempt, %error, "Giving up after {attempt} attempts");
                        backoff::Error::Permanent(error)
                    } else {
                        tracing::warn!(operation, attempt, %error, "Attempt failed, retrying");
                        backoff::Error::transient(error)
                    }
                })
            }
        };

        backoff::future::retry(self.strategy(), op).await
    }
}

#[async_trait]
impl<P: SimplePrompt + Clone> SimplePrompt for LanguageModelWithBackOff<P> {
    async fn prompt(&self, prompt: Prompt) -> Result<String, LanguageModelError> {
        self.retry("prompt", || self.inner.prompt(prompt.clone()))
            .await
    }
}

#[async_trait]
impl<P: EmbeddingModel + Clone> EmbeddingModel for LanguageModelWithBackOff<P> {
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings, LanguageModelError> {
        self.retry("embed", || self.inner.embed(input.clone())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy)]
    enum MockErrorType {
        Transient,
        Permanent,
        ContextLengthExceeded,
    }

    impl MockErrorType {
        fn to_error(self) -> LanguageModelError {
            match self {
                MockErrorType::Transient => LanguageModelError::TransientError(Box::new(
                    std::io::Error::new(std::io::ErrorKind::ConnectionReset, "Transient error"),
                )),
                MockErrorType::Permanent => LanguageModelError::PermanentError(Box::new(
                    std::io::Error::new(std::io::ErrorKind::InvalidData, "Permanent error"),
                )),
                MockErrorType::ContextLengthExceeded => {
                    LanguageModelError::ContextLengthExceeded(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "Context length exceeded",
                    )))
                }
            }
        }
    }

    #[derive(Debug, Clone)]
    struct FlakyModel {
        call_count: Arc<AtomicUsize>,
        should_fail_count: usize,
        error_type: MockErrorType,
    }

    impl FlakyModel {
        fn new(should_fail_count: usize, error_type: MockErrorType) -> Self {
            Self {
                call_count: Arc::new(AtomicUsize::new(0)),
                should_fail_count,
                error_type,
            }
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn next(&self) -> Result<(), LanguageModelError> {
            let count = self.call_count.fetch_add(1, Ordering::SeqCst);
            if count < self.should_fail_count {
                Err(self.error_type.to_error())
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SimplePrompt for FlakyModel {
        async fn prompt(&self, _prompt: Prompt) -> Result<String, LanguageModelError> {
            self.next().map(|()| "Success response".to_string())
        }
    }

    #[async_trait]
    impl EmbeddingModel for FlakyModel {
        async fn embed(&self, input: Vec<String>) -> Result<Embeddings, LanguageModelError> {
            self.next()
                .map(|()| input.iter().map(|_| vec![0.5; 3]).collect())
        }
    }

    fn fast_config() -> BackoffConfiguration {
        BackoffConfiguration {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
            ..BackoffConfiguration::default()
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_retries_transient_errors() {
        let model = FlakyModel::new(2, MockErrorType::Transient);
        let with_backoff = LanguageModelWithBackOff::new(model.clone(), fast_config());

        let result = with_backoff.prompt(Prompt::from("Test prompt")).await;

        assert_eq!(result.unwrap(), "Success response");
        assert_eq!(model.calls(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_retries_rejected_requests() {
        let model = FlakyModel::new(1, MockErrorType::Permanent);
        let with_backoff = LanguageModelWithBackOff::new(model.clone(), fast_config());

        let embeddings = with_backoff.embed(vec!["Drama".into()]).await.unwrap();

        assert_eq!(embeddings, vec![vec![0.5; 3]]);
        assert_eq!(model.calls(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_gives_up_after_max_attempts() {
        let model = FlakyModel::new(usize::MAX, MockErrorType::Transient);
        let with_backoff = LanguageModelWithBackOff::new(model.clone(), fast_config());

        let result = with_backoff.embed(vec!["Drama".into()]).await;

        assert!(matches!(result, Err(LanguageModelError::TransientError(_))));
        assert_eq!(model.calls(), 6);
    }

    #[test_log::test(tokio::test)]
    async fn test_does_not_retry_context_length_errors() {
        let model = FlakyModel::new(1, MockErrorType::ContextLengthExceeded);
        let with_backoff = LanguageModelWithBackOff::new(model.clone(), fast_config());

        let result = with_backoff.prompt(Prompt::from("Test prompt")).await;

        assert!(matches!(
            result,
            Err(LanguageModelError::ContextLengthExceeded(_))
        ));
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn test_default_strategy_is_bounded() {
        let config = BackoffConfiguration::default();
        assert_eq!(config.max_attempts, 6);
        assert_eq!(config.max_interval, Duration::from_secs(20));

        let strategy = LanguageModelWithBackOff::new((), config).strategy();
        assert_eq!(strategy.max_elapsed_time, None);
        assert_eq!(strategy.initial_interval, Duration::from_secs(1));
    }
}
