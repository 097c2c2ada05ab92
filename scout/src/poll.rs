//! Fixed-interval condition polling.
//!
//! The poller samples a predicate until it holds or the timeout elapses. It
//! does not decide whether a timeout is fatal: [`Waited`] is handed back to
//! the caller, who either converts it with [`Waited::into_result`] or takes an
//! alternate path.

use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Timeout plus polling interval for one synchronization point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitCondition {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl WaitCondition {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout_ms: timeout.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
        }
    }

    pub fn from_millis(timeout_ms: u64) -> Self {
        Self::new(Duration::from_millis(timeout_ms))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        // a zero interval would spin
        self.poll_interval_ms = (interval.as_millis() as u64).max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Result of a wait
#[derive(Debug, Clone, PartialEq)]
pub enum Waited {
    Satisfied {
        elapsed: Duration,
        attempts: u32,
    },
    TimedOut {
        elapsed: Duration,
        attempts: u32,
        /// Last error the predicate reported, if any
        last_error: Option<AutomationError>,
    },
}

impl Waited {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Waited::Satisfied { .. })
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            Waited::Satisfied { elapsed, .. } | Waited::TimedOut { elapsed, .. } => *elapsed,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Waited::Satisfied { attempts, .. } | Waited::TimedOut { attempts, .. } => *attempts,
        }
    }

    /// Treats a timeout as a hard failure
    pub fn into_result(self, what: &str) -> Result<Duration, AutomationError> {
        match self {
            Waited::Satisfied { elapsed, .. } => Ok(elapsed),
            Waited::TimedOut {
                elapsed,
                attempts,
                last_error,
            } => {
                let cause = last_error
                    .map(|e| format!(" (last error: {e})"))
                    .unwrap_or_default();
                Err(AutomationError::Timeout(format!(
                    "{what} not satisfied after {elapsed:?} and {attempts} attempts{cause}"
                )))
            }
        }
    }
}

/// Polls a synchronous predicate.
///
/// The predicate is sampled once immediately, then after every poll interval,
/// and one final time at the deadline. An `Err` from the predicate counts as
/// "not yet". Sleeps are capped at the remaining time so the call never
/// overshoots the timeout by more than one interval.
pub async fn wait_for<P>(condition: WaitCondition, mut predicate: P) -> Waited
where
    P: FnMut() -> Result<bool, AutomationError>,
{
    wait_for_async(condition, move || std::future::ready(predicate())).await
}

/// Async flavour of [`wait_for`] for predicates that themselves await
pub async fn wait_for_async<P, Fut>(condition: WaitCondition, mut predicate: P) -> Waited
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, AutomationError>>,
{
    let start = Instant::now();
    let timeout = condition.timeout();
    let interval = condition.poll_interval();
    let mut attempts = 0u32;
    let mut last_error = None;

    loop {
        attempts += 1;
        match predicate().await {
            Ok(true) => {
                let elapsed = start.elapsed();
                debug!(?elapsed, attempts, "condition satisfied");
                return Waited::Satisfied { elapsed, attempts };
            }
            Ok(false) => {}
            Err(e) => {
                trace!(error = %e, "predicate failed, treating as not satisfied");
                last_error = Some(e);
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            debug!(?elapsed, attempts, "condition timed out");
            return Waited::TimedOut {
                elapsed,
                attempts,
                last_error,
            };
        }
        tokio::time::sleep(interval.min(timeout - elapsed)).await;
    }
}
