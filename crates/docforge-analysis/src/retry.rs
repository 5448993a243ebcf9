//! Retry policy for remote provider calls.

use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

use docforge_core::RetryConfig;

use crate::provider::ProviderError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
            ..Default::default()
        }
    }

    fn calculate_backoff(&self, attempt: usize) -> Duration {
        let base = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = base.min(self.max_backoff.as_millis() as f64);

        let backoff = if self.jitter {
            let mut rng = rand::thread_rng();
            backoff * rng.gen_range(0.5..1.5)
        } else {
            backoff
        };

        Duration::from_millis(backoff as u64)
    }

    pub async fn execute<F, Fut, T>(&self, mut f: F) -> std::result::Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, ProviderError>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let backoff = self.calculate_backoff(attempt - 1);
                debug!(
                    "Retry attempt {}/{}, backing off for {:?}",
                    attempt + 1,
                    self.max_attempts,
                    backoff
                );
                tokio::time::sleep(backoff).await;
            }

            match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!("Provider call succeeded on retry attempt {}", attempt + 1);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        "Provider call failed on attempt {}/{}: {}",
                        attempt + 1,
                        self.max_attempts,
                        e
                    );

                    if !e.is_retryable() {
                        debug!("Error is not retryable, stopping retry attempts");
                        return Err(e);
                    }

                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ProviderError::Unavailable("all retry attempts failed".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            jitter: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_retry_success_after_transient_failure() {
        let policy = fast_policy(3);
        let attempts = Arc::new(AtomicUsize::new(0));

        let result = policy
            .execute(|| {
                let attempts = attempts.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ProviderError::Unavailable("transient".to_string()))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let policy = fast_policy(3);
        let attempts = Arc::new(AtomicUsize::new(0));

        let result = policy
            .execute(|| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(ProviderError::Unavailable("down".to_string()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_auth_error_not_retried() {
        let policy = fast_policy(3);
        let attempts = Arc::new(AtomicUsize::new(0));

        let result = policy
            .execute(|| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(ProviderError::Auth("bad key".to_string()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_progression() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            jitter: false,
            ..Default::default()
        };

        assert_eq!(policy.calculate_backoff(0).as_millis(), 100);
        assert_eq!(policy.calculate_backoff(1).as_millis(), 200);
        assert_eq!(policy.calculate_backoff(2).as_millis(), 400);
    }
}
