use std::future::Future;
use std::time::Duration;

use pgsync_config::BackoffSettings;
use tracing::warn;

use crate::error::{Result, SyncError};

/// Retry wrapper over any fallible async operation (spec.md §4.1).
///
/// Delay schedule: `d_0 = start`; on each retry `d_{n+1} = min(d_n * factor,
/// ceiling, remaining_budget)`. The wrapper's delay and remaining budget are
/// local to one `retry` call, so every outer invocation starts fresh — the
/// teacher's `RetryConfig` equivalent (`ferrex-core::scan::orchestration::
/// config::RetryConfig`) is similarly reset per dequeue rather than carried
/// across jobs.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    settings: BackoffSettings,
}

impl Backoff {
    pub fn new(settings: BackoffSettings) -> Self {
        Self { settings }
    }

    /// Runs `op` until it succeeds, returns a non-transient error, or the
    /// total backoff budget is exhausted (in which case the last transient
    /// error is re-raised wrapped in [`SyncError::BackoffExhausted`]).
    pub async fn retry<F, Fut, T>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut delay = self.settings.start;
        let mut elapsed = Duration::ZERO;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    let remaining = self.settings.total_budget.saturating_sub(elapsed);
                    if remaining.is_zero() {
                        return Err(SyncError::BackoffExhausted {
                            budget_secs: self.settings.total_budget.as_secs_f64(),
                            attempts,
                            source: Box::new(err),
                        });
                    }

                    let sleep_for = delay.min(self.settings.ceiling).min(remaining);
                    warn!(
                        attempt = attempts,
                        delay_ms = sleep_for.as_millis() as u64,
                        error = %err,
                        "transient error, retrying after backoff"
                    );
                    tokio::time::sleep(sleep_for).await;
                    elapsed += sleep_for;
                    delay = Duration::from_secs_f64(
                        (delay.as_secs_f64() * self.settings.factor)
                            .min(self.settings.ceiling.as_secs_f64()),
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn settings(start: f64, ceiling: f64, total_budget: f64) -> BackoffSettings {
        BackoffSettings::from_seconds(start, ceiling, total_budget)
    }

    #[tokio::test]
    async fn succeeds_immediately_without_sleeping() {
        let backoff = Backoff::new(settings(1.0, 10.0, 60.0));
        let calls = AtomicU32::new(0);
        let result = backoff
            .retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, SyncError>(42) }
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let backoff = Backoff::new(settings(0.01, 0.05, 5.0));
        let calls = AtomicU32::new(0);
        let result = backoff
            .retry(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(SyncError::Io(std::io::Error::other("boom")))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_propagate_immediately() {
        let backoff = Backoff::new(settings(1.0, 10.0, 60.0));
        let calls = AtomicU32::new(0);
        let result = backoff
            .retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<i32, _>(SyncError::StateCorrupt(
                    serde_json::from_str::<serde_json::Value>("{not json").unwrap_err(),
                )) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn total_wall_time_never_exceeds_budget() {
        let backoff = Backoff::new(settings(0.05, 0.05, 0.12));
        let start = Instant::now();
        let result: Result<()> = backoff
            .retry(|| async { Err(SyncError::Io(std::io::Error::other("down"))) })
            .await;
        let elapsed = start.elapsed();
        assert!(matches!(result, Err(SyncError::BackoffExhausted { .. })));
        assert!(elapsed <= Duration::from_millis(200), "elapsed={elapsed:?}");
    }
}
