use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::policy::RetryPolicy;

/// Runs an async operation under a [`RetryPolicy`].
///
/// The loop is bounded by `max_retries`: the operation runs at most
/// `max_retries + 1` times. When retries run out, or `should_retry` rejects an
/// error, that error is returned to the caller unchanged.
#[derive(Clone, Debug)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    label: String,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            label: "operation".to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.execute_with(operation, |_: &E| true, |_, _: &E, _| {}).await
    }

    pub async fn execute_with<T, E, F, Fut, S, R>(
        &self,
        mut operation: F,
        should_retry: S,
        mut on_retry: R,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        S: Fn(&E) -> bool,
        R: FnMut(u32, &E, Duration),
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded after {} attempts", self.label, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !should_retry(&error) || !self.policy.can_retry(attempt) {
                        if attempt > 1 {
                            warn!("{} failed after {} attempts: {}", self.label, attempt, error);
                        }
                        return Err(error);
                    }

                    let delay = self.policy.get_delay(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}, retrying in {:?}",
                        self.label,
                        attempt,
                        self.policy.max_retries + 1,
                        error,
                        delay
                    );
                    on_retry(attempt, &error, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
