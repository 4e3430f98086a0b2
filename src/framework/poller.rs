//! # Readiness Poller
//!
//! Generic retry-until-success loop. A probe is any async closure returning
//! `Ok(())` when the target is ready and `Err(reason)` otherwise; the poller calls
//! it at a fixed interval until it succeeds, the policy gives up, or the run is
//! cancelled.
//!
//! Two kinds of waiting live here and they are deliberately kept apart:
//!
//! - [`Poller::wait_until_ready`] is a real gate: it only returns `Ok` after the
//!   probe has succeeded.
//! - [`Poller::grace_delay`] is a fixed-duration pause with no predicate. It only
//!   gives asynchronous startup some time and guarantees nothing.
//!
//! Both observe the shared [`CancellationToken`], so an operator interrupt or a
//! run deadline aborts the wait instead of hanging the process.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long and how often to poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` means retry forever (subject to `timeout` and cancellation).
    pub max_attempts: Option<u32>,
    /// Upper bound on the whole wait, probes included.
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            timeout: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
}

/// One probe invocation. Logged, never retained.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub target: String,
    pub sequence: u32,
    pub outcome: AttemptOutcome,
    pub at: DateTime<Utc>,
}

impl Attempt {
    fn record(target: &str, sequence: u32, outcome: AttemptOutcome) -> Self {
        let attempt = Self {
            target: target.to_string(),
            sequence,
            outcome,
            at: Utc::now(),
        };
        debug!(?attempt, "Probe attempt");
        attempt
    }
}

/// Returned once the probe succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyResult {
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Why a wait ended without the target becoming ready.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PollError {
    #[error("{target} not ready after {attempts} attempts ({elapsed:?})")]
    TimedOut {
        target: String,
        attempts: u32,
        elapsed: Duration,
    },
    #[error("{target} not ready after the maximum of {attempts} attempts")]
    Exhausted { target: String, attempts: u32 },
    #[error("wait for {target} cancelled after {attempts} attempts")]
    Cancelled { target: String, attempts: u32 },
}

impl PollError {
    pub fn attempts(&self) -> u32 {
        match self {
            PollError::TimedOut { attempts, .. }
            | PollError::Exhausted { attempts, .. }
            | PollError::Cancelled { attempts, .. } => *attempts,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PollError::Cancelled { .. })
    }
}

enum Wake {
    Cancelled,
    Expired,
    Done,
}

/// Runs probes and grace delays under a shared cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Poller {
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Polls `probe` until it returns `Ok(())`.
    ///
    /// Every failed attempt logs a retry notice with the configured interval.
    /// Returns the number of attempts it took, so a probe that fails `N` times
    /// and then succeeds reports `N + 1`.
    pub async fn wait_until_ready<F, Fut>(
        &self,
        target: &str,
        policy: &PollPolicy,
        mut probe: F,
    ) -> Result<ReadyResult, PollError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let started = Instant::now();
        // A timeout too large to represent is the same as no timeout
        let deadline = policy.timeout.and_then(|t| started.checked_add(t));
        let mut sequence = 0u32;

        loop {
            sequence += 1;

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancelled(target, sequence - 1)),
                _ = expiry(deadline) => {
                    return Err(timed_out(target, sequence - 1, started));
                }
                outcome = probe() => outcome,
            };

            match outcome {
                Ok(()) => {
                    Attempt::record(target, sequence, AttemptOutcome::Success);
                    let elapsed = started.elapsed();
                    info!(probe = target, attempts = sequence, ?elapsed, "Ready");
                    return Ok(ReadyResult {
                        attempts: sequence,
                        elapsed,
                    });
                }
                Err(reason) => {
                    Attempt::record(target, sequence, AttemptOutcome::Failure);
                    if policy.max_attempts.is_some_and(|max| sequence >= max) {
                        warn!(probe = target, attempts = sequence, %reason, "Giving up");
                        return Err(PollError::Exhausted {
                            target: target.to_string(),
                            attempts: sequence,
                        });
                    }
                    warn!(
                        probe = target,
                        attempt = sequence,
                        %reason,
                        "Not ready yet, retrying in {:?}",
                        policy.interval
                    );
                }
            }

            let wake = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Wake::Cancelled,
                _ = expiry(deadline) => Wake::Expired,
                _ = sleep(policy.interval) => Wake::Done,
            };
            match wake {
                Wake::Cancelled => return Err(self.cancelled(target, sequence)),
                Wake::Expired => return Err(timed_out(target, sequence, started)),
                Wake::Done => {}
            }
        }
    }

    /// Fixed-duration settle timer. No predicate is checked.
    pub async fn grace_delay(&self, label: &str, duration: Duration) -> Result<(), PollError> {
        info!(label, ?duration, "Waiting for services to settle");
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(self.cancelled(label, 0)),
            _ = sleep(duration) => Ok(()),
        }
    }

    fn cancelled(&self, target: &str, attempts: u32) -> PollError {
        warn!(probe = target, attempts, "Wait cancelled");
        PollError::Cancelled {
            target: target.to_string(),
            attempts,
        }
    }
}

async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn timed_out(target: &str, attempts: u32, started: Instant) -> PollError {
    let elapsed = started.elapsed();
    warn!(probe = target, attempts, ?elapsed, "Timed out");
    PollError::TimedOut {
        target: target.to_string(),
        attempts,
        elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn failing_then_ok(failures: u32) -> (Arc<AtomicU32>, impl FnMut() -> futures::future::Ready<Result<(), String>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let probe = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(if n < failures {
                Err(format!("attempt {} failed", n + 1))
            } else {
                Ok(())
            })
        };
        (calls, probe)
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_n_failures() {
        let poller = Poller::default();
        let (calls, probe) = failing_then_ok(3);
        let policy = PollPolicy::unbounded(Duration::from_secs(5));

        let result = poller.wait_until_ready("broker", &policy, probe).await.unwrap();

        assert_eq!(result.attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(result.elapsed, Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_try_success_does_not_sleep() {
        let poller = Poller::default();
        let (_, probe) = failing_then_ok(0);
        let policy = PollPolicy::unbounded(Duration::from_secs(5));

        let result = poller.wait_until_ready("app", &policy, probe).await.unwrap();
        assert_eq!(result.attempts, 1);
        assert_eq!(result.elapsed, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_attempts_exhausted() {
        let poller = Poller::default();
        let (calls, probe) = failing_then_ok(u32::MAX);
        let policy = PollPolicy::unbounded(Duration::from_secs(1)).with_max_attempts(3);

        let err = poller.wait_until_ready("store", &policy, probe).await.unwrap_err();
        assert_eq!(
            err,
            PollError::Exhausted {
                target: "store".into(),
                attempts: 3
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bounds_unbounded_poll() {
        let poller = Poller::default();
        let (calls, probe) = failing_then_ok(u32::MAX);
        let policy = PollPolicy::unbounded(Duration::from_secs(5))
            .with_timeout(Some(Duration::from_secs(12)));

        let err = poller.wait_until_ready("broker", &policy, probe).await.unwrap_err();
        assert!(matches!(err, PollError::TimedOut { attempts: 3, .. }), "{err:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_interrupts_hanging_probe() {
        let poller = Poller::default();
        let policy = PollPolicy::unbounded(Duration::from_secs(5))
            .with_timeout(Some(Duration::from_secs(30)));

        let err = poller
            .wait_until_ready("app", &policy, || std::future::pending::<Result<(), String>>())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::TimedOut { attempts: 0, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_poll() {
        let cancel = CancellationToken::new();
        let poller = Poller::new(cancel.clone());
        let (_, probe) = failing_then_ok(u32::MAX);
        let policy = PollPolicy::unbounded(Duration::from_secs(5));

        let trigger = tokio::spawn(async move {
            sleep(Duration::from_secs(11)).await;
            cancel.cancel();
        });

        let err = poller.wait_until_ready("broker", &policy, probe).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.attempts(), 3);
        trigger.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_timeout_behaves_as_unbounded() {
        let poller = Poller::default();
        let (calls, probe) = failing_then_ok(2);
        let policy = PollPolicy::unbounded(Duration::from_millis(1))
            .with_timeout(Some(Duration::from_secs(u64::MAX)));

        let result = poller.wait_until_ready("broker", &policy, probe).await.unwrap();

        assert_eq!(result.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_delay_waits_full_duration() {
        let poller = Poller::default();
        let started = Instant::now();
        poller.grace_delay("settle", Duration::from_secs(45)).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_delay_is_cancellable() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let poller = Poller::new(cancel);
        let err = poller.grace_delay("settle", Duration::from_secs(45)).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
