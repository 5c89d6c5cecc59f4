//! Wait Mechanisms
//!
//! Every UI step of the suite suspends until the page shows what it expects
//! or a deadline passes. A wait is a probe polled on an interval:
//!
//! - `Ok(Some(value))` ends the wait with `value`
//! - `Ok(None)` means "not yet"
//! - a transient error (see [`ProbeError::is_transient`]) is remembered and
//!   polling continues; any other error ends the wait immediately
//!
//! There is no retry beyond the deadline. A timeout carries the description
//! of the awaited condition and the last transient error seen.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Visibility state a selector wait expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Present in the DOM, visible or not
    Attached,
    /// Present with a non-empty box and not `visibility: hidden`
    #[default]
    Visible,
    /// Absent or not visible
    Hidden,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Attached => "attached",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
        };
        f.write_str(s)
    }
}

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// Value produced by the probe
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of probes run
    pub polls: u32,
}

/// Poll `probe` until it yields a value or `options.timeout_ms` passes.
///
/// The probe always runs at least once, even with a zero timeout.
pub async fn poll_until<T, F, Fut>(
    options: &WaitOptions,
    waited_for: &str,
    mut probe: F,
) -> ProbeResult<WaitResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<Option<T>>>,
{
    let start = Instant::now();
    let deadline = start + options.timeout();
    let mut polls = 0_u32;
    let mut last_error: Option<String> = None;

    loop {
        polls += 1;
        match probe().await {
            Ok(Some(value)) => {
                tracing::trace!(waited_for, polls, "wait satisfied");
                return Ok(WaitResult {
                    value,
                    elapsed: start.elapsed(),
                    polls,
                });
            }
            Ok(None) => {}
            Err(e) if e.is_transient() => last_error = Some(e.to_string()),
            Err(e) => return Err(e),
        }

        if Instant::now() >= deadline {
            return Err(ProbeError::Timeout {
                ms: options.timeout_ms,
                waited_for: waited_for.to_string(),
                last_error,
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Poll a boolean probe until it returns `true`.
pub async fn wait_until<F, Fut>(
    options: &WaitOptions,
    waited_for: &str,
    mut probe: F,
) -> ProbeResult<Duration>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<bool>>,
{
    let result = poll_until(options, waited_for, || {
        let fut = probe();
        async move { fut.await.map(|ok| ok.then_some(())) }
    })
    .await?;
    Ok(result.elapsed)
}
