//! Cooperative polling shared by every tmux wait.

use std::future::Future;
use tokio::time::{sleep, Duration, Instant};

/// When a poll loop gives up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PollLimit {
    /// Check at most this many times.
    Attempts(usize),
    /// Stop once this much wall-clock time has passed.
    Timeout(Duration),
    /// Keep checking until the check succeeds or errors.
    Unbounded,
}

/// Check interval plus stop condition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub limit: PollLimit,
}

impl PollPolicy {
    pub const fn new(interval: Duration, limit: PollLimit) -> Self {
        Self { interval, limit }
    }

    /// Prompt readiness: 30 checks, 100 ms apart.
    pub const fn prompt_ready() -> Self {
        Self::new(Duration::from_millis(100), PollLimit::Attempts(30))
    }

    /// Pane regex synchronization: every 100 ms until `timeout`.
    pub const fn output_match(timeout: Duration) -> Self {
        Self::new(Duration::from_millis(100), PollLimit::Timeout(timeout))
    }

    /// End-marker detection: every 200 ms, optionally bounded.
    pub const fn command_completion(limit: Option<Duration>) -> Self {
        let limit = match limit {
            Some(limit) => PollLimit::Timeout(limit),
            None => PollLimit::Unbounded,
        };
        Self::new(Duration::from_millis(200), limit)
    }

    /// Waiting for pipe-pane to flush the marker line: 20 checks, 100 ms apart.
    pub const fn capture_flush() -> Self {
        Self::new(Duration::from_millis(100), PollLimit::Attempts(20))
    }
}

/// Result of a finished poll loop.
#[derive(Debug, Eq, PartialEq)]
pub enum PollOutcome<T> {
    Ready(T),
    Exhausted { attempts: usize, elapsed: Duration },
}

/// Run `check` until it yields `Some`, an error, or the policy runs out.
///
/// The first check runs immediately. No sleep follows the final check.
pub async fn poll_until<T, E, F, Fut>(policy: PollPolicy, mut check: F) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started_at = Instant::now();
    let mut attempts = 0usize;
    loop {
        if let PollLimit::Attempts(max) = policy.limit {
            if attempts >= max {
                return Ok(PollOutcome::Exhausted {
                    attempts,
                    elapsed: started_at.elapsed(),
                });
            }
        }

        attempts += 1;
        if let Some(value) = check().await? {
            return Ok(PollOutcome::Ready(value));
        }

        let exhausted = match policy.limit {
            PollLimit::Attempts(max) => attempts >= max,
            PollLimit::Timeout(limit) => started_at.elapsed() >= limit,
            PollLimit::Unbounded => false,
        };
        if exhausted {
            return Ok(PollOutcome::Exhausted {
                attempts,
                elapsed: started_at.elapsed(),
            });
        }
        sleep(policy.interval).await;
    }
}
