//! Wait Mechanisms
//!
//! Bounded poll-until-condition waiting. Every wait has a hard upper bound of
//! `timeout` plus one `poll_interval`, however slow a single lookup is, and never polls
//! faster than `poll_interval`.
//!
//! Time is measured with [`tokio::time::Instant`], so tests can run against a paused clock.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

use crate::result::PageflowResult;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for element resolution (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Default timeout for dismissing transient overlays (1 second)
pub const DEFAULT_DISMISS_TIMEOUT_MS: u64 = 1_000;

/// Lower bound on the polling interval
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

// =============================================================================
// WAIT POLICY
// =============================================================================

/// How long to wait and how often to look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::from_millis(DEFAULT_WAIT_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS)
    }
}

impl WaitPolicy {
    /// Create a policy; the poll interval is clamped to at least 1ms
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval: poll_interval.max(Duration::from_millis(MIN_POLL_INTERVAL_MS)),
        }
    }

    /// Create a policy from milliseconds
    #[must_use]
    pub fn from_millis(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_interval_ms),
        )
    }

    /// Short policy used to probe for transient overlays
    #[must_use]
    pub fn dismiss() -> Self {
        Self::from_millis(DEFAULT_DISMISS_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS)
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set polling interval (clamped to at least 1ms)
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(MIN_POLL_INTERVAL_MS));
        self
    }

    /// Hard upper bound on waiting
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay between probes
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

// =============================================================================
// READINESS
// =============================================================================

/// What "ready" means for a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Readiness {
    /// Element exists in the UI tree
    Present,
    /// Element exists and is displayed
    Visible,
    /// Element is displayed and enabled
    Interactable,
}

impl Readiness {
    /// Whether the displayed check is needed
    #[must_use]
    pub const fn requires_visible(self) -> bool {
        matches!(self, Self::Visible | Self::Interactable)
    }

    /// Whether the enabled check is needed
    #[must_use]
    pub const fn requires_enabled(self) -> bool {
        matches!(self, Self::Interactable)
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Present => "present",
            Self::Visible => "visible",
            Self::Interactable => "interactable",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Result of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// Condition satisfied
    Ready(T),
    /// Not yet; `observed` is true when partial progress was seen (e.g. element present but hidden)
    Pending {
        /// Partial state was observed
        observed: bool,
    },
}

impl<T> Probe<T> {
    /// Pending with nothing observed
    #[must_use]
    pub const fn absent() -> Self {
        Self::Pending { observed: false }
    }

    /// Pending with partial state observed
    #[must_use]
    pub const fn observed() -> Self {
        Self::Pending { observed: true }
    }
}

/// Result of a wait operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitResult<T> {
    /// Condition satisfied before the deadline
    Ready {
        /// Probe value
        value: T,
        /// Time spent waiting
        elapsed: Duration,
        /// Number of probes
        attempts: u32,
    },
    /// Deadline passed
    Expired {
        /// Partial state was seen at least once
        observed: bool,
        /// Time spent waiting
        elapsed: Duration,
        /// Number of probes
        attempts: u32,
    },
}

impl<T> WaitResult<T> {
    /// Time spent waiting
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Ready { elapsed, .. } | Self::Expired { elapsed, .. } => *elapsed,
        }
    }

    /// Number of probes made
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Ready { attempts, .. } | Self::Expired { attempts, .. } => *attempts,
        }
    }

    /// Whether the condition was met
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Probe until ready or the policy's timeout passes.
///
/// The probe always runs at least once. Errors from the probe abort the wait immediately.
/// A lookup still pending one poll interval past the deadline is dropped, so the wait never
/// exceeds `timeout + poll_interval`.
pub async fn poll_until<T, F, Fut>(policy: &WaitPolicy, mut probe: F) -> PageflowResult<WaitResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PageflowResult<Probe<T>>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;
    let mut observed = false;

    loop {
        attempts += 1;
        let budget = policy.timeout().saturating_sub(start.elapsed()) + policy.poll_interval();
        let Ok(probed) = tokio::time::timeout(budget, probe()).await else {
            warn!(attempts, ?budget, "lookup outlived the wait deadline");
            return Ok(WaitResult::Expired {
                observed,
                elapsed: start.elapsed(),
                attempts,
            });
        };
        match probed? {
            Probe::Ready(value) => {
                return Ok(WaitResult::Ready {
                    value,
                    elapsed: start.elapsed(),
                    attempts,
                });
            }
            Probe::Pending { observed: seen } => observed |= seen,
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.timeout() {
            return Ok(WaitResult::Expired {
                observed,
                elapsed,
                attempts,
            });
        }
        let remaining = policy.timeout() - elapsed;
        tokio::time::sleep(policy.poll_interval().min(remaining)).await;
    }
}

// ============================================================================
// EXTREME TDD: Tests written FIRST
// ============================================================================
