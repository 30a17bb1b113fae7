use crate::{EditOutcome, ModelGenerator};
use async_trait::async_trait;
use photomesh_core::{PhotomeshError, PhotomeshResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Retry behaviour for calls to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub backoff_base_ms: u64,
    /// Cap on a single backoff delay, in milliseconds.
    pub backoff_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = self
            .backoff_base_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(delay.min(self.backoff_max_ms))
    }
}

/// Whether a failure is transient: timeouts, dropped connections, 429 and
/// 5xx from the service. Client-side errors are never retried.
pub fn is_retryable(err: &PhotomeshError) -> bool {
    let PhotomeshError::ExternalService(msg) = err else {
        return false;
    };
    let lower = msg.to_lowercase();

    if lower.starts_with("timeout") || lower.starts_with("request to") {
        return true;
    }

    match status_code(&lower) {
        Some(code) => code == 429 || (500..600).contains(&code),
        None => false,
    }
}

/// Status code from a `generation service error <code> ...` message.
fn status_code(msg: &str) -> Option<u16> {
    let rest = msg.strip_prefix("generation service error ")?;
    rest.get(..3)?.parse().ok()
}

/// Wraps a generator and retries transient failures with exponential
/// backoff. The last error is returned once retries are exhausted.
pub struct RetryingGenerator {
    inner: Arc<dyn ModelGenerator>,
    policy: RetryPolicy,
}

impl RetryingGenerator {
    pub fn new(inner: Arc<dyn ModelGenerator>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run<T, F, Fut>(&self, op: &'static str, mut call: F) -> PhotomeshResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = PhotomeshResult<T>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(out) => return Ok(out),
                Err(e) if attempt < self.policy.max_retries && is_retryable(&e) => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        op,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retryable generation error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl ModelGenerator for RetryingGenerator {
    async fn generate_initial(&self, images: &[String]) -> PhotomeshResult<String> {
        self.run("generate_initial", move || self.inner.generate_initial(images))
            .await
    }

    async fn generate_edit(
        &self,
        images: &[String],
        prompt: &str,
        step_index: usize,
    ) -> PhotomeshResult<EditOutcome> {
        self.run("generate_edit", move || {
            self.inner.generate_edit(images, prompt, step_index)
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with the given message for the first `failures` calls.
    struct Flaky {
        failures: u32,
        message: &'static str,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32, message: &'static str) -> Arc<Self> {
            Arc::new(Self {
                failures,
                message,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ModelGenerator for Flaky {
        async fn generate_initial(&self, _images: &[String]) -> PhotomeshResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(PhotomeshError::ExternalService(self.message.to_string()))
            } else {
                Ok("models/ok.glb".to_string())
            }
        }

        async fn generate_edit(
            &self,
            images: &[String],
            _prompt: &str,
            step_index: usize,
        ) -> PhotomeshResult<EditOutcome> {
            let model_reference = self.generate_initial(images).await?;
            Ok(EditOutcome {
                model_reference: format!("{model_reference}#{step_index}"),
                images: images.to_vec(),
            })
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_base_ms: 1,
            backoff_max_ms: 2,
        }
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_retries: 5,
            backoff_base_ms: 100,
            backoff_max_ms: 1_000,
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(10), Duration::from_millis(1_000));
    }

    #[test]
    fn classification() {
        let svc = |m: &str| PhotomeshError::ExternalService(m.to_string());
        assert!(is_retryable(&svc("timeout calling http://x")));
        assert!(is_retryable(&svc("generation service error 503 Service Unavailable: busy")));
        assert!(is_retryable(&svc("generation service error 429 Too Many Requests: slow")));
        assert!(!is_retryable(&svc("generation service error 400 Bad Request: nope")));
        assert!(is_retryable(&svc("request to http://127.0.0.1:4000/v1 failed: refused")));
        assert!(!is_retryable(&svc("invalid response from http://gen: eof")));
        assert!(!is_retryable(&PhotomeshError::InvalidRequest("timeout".into())));
    }

    #[tokio::test]
    async fn recovers_from_transient_failures() {
        let flaky = Flaky::new(2, "generation service error 502 Bad Gateway: ");
        let gen = RetryingGenerator::new(flaky.clone(), fast_policy(3));

        assert_eq!(gen.generate_initial(&[]).await.unwrap(), "models/ok.glb");
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let flaky = Flaky::new(10, "timeout calling http://gen");
        let gen = RetryingGenerator::new(flaky.clone(), fast_policy(2));

        let err = gen.generate_edit(&[], "x", 1).await.unwrap_err();
        assert!(matches!(err, PhotomeshError::ExternalService(_)));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let flaky = Flaky::new(10, "generation service error 400 Bad Request: bad images");
        let gen = RetryingGenerator::new(flaky.clone(), fast_policy(3));

        assert!(gen.generate_initial(&[]).await.is_err());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }
}
