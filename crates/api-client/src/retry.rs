use std::future::Future;
use std::time::Duration;

use tracing::warn;
use trialdesk_api::ServiceError;

/// How many times a failed request is re-run before its error is surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: usize,
    /// Delay before each retry; the last entry repeats if retries outnumber it.
    pub delays: Vec<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delays: vec![Duration::from_secs(1)],
        }
    }
}

impl RetryConfig {
    /// Surface the first failure.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delays: Vec::new(),
        }
    }

    pub fn with_delay(max_retries: usize, delay: Duration) -> Self {
        Self {
            max_retries,
            delays: vec![delay],
        }
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        self.delays
            .get(attempt)
            .or(self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

/// Run `op` until it succeeds or the retry budget is spent.
pub async fn retry<T, F, Fut>(config: &RetryConfig, label: &str, mut op: F) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let max_attempts = config.max_retries + 1;
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < max_attempts => {
                let delay = config.delay_for(attempt);
                warn!(
                    "{} attempt {}/{} failed ({}), retrying in {:?}…",
                    label,
                    attempt + 1,
                    max_attempts,
                    e,
                    delay,
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn retries_once_by_default() {
        let calls = AtomicUsize::new(0);
        let start = Instant::now();
        let result: Result<(), _> = retry(&RetryConfig::default(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::NotFound("nope".into())) }
        })
        .await;

        assert_eq!(result, Err(ServiceError::NotFound("nope".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn stops_at_first_success() {
        let calls = AtomicUsize::new(0);
        let result = retry(&RetryConfig::with_delay(3, Duration::from_millis(10)), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ServiceError::Internal("flaky".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn none_surfaces_first_error() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = retry(&RetryConfig::none(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::Internal("down".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn last_delay_repeats() {
        let config = RetryConfig {
            max_retries: 4,
            delays: vec![Duration::from_millis(100), Duration::from_millis(200)],
        };
        assert_eq!(config.delay_for(0), Duration::from_millis(100));
        assert_eq!(config.delay_for(3), Duration::from_millis(200));
        assert_eq!(RetryConfig::none().delay_for(0), Duration::ZERO);
    }
}
