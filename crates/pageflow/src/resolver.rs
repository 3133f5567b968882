//! Resilient element resolution.
//!
//! [`ElementResolver`] polls a [`Session`] for a [`Locator`] until the element is ready
//! (present, and visible/enabled when the call site asks for it) or the wait policy's
//! timeout passes. Absence is an outcome, not an error:
//!
//! - [`Resolution::NotFound`]: the element never appeared.
//! - [`Resolution::TimedOut`]: the element appeared but never became ready in time.
//!
//! Only session faults (dropped connection, closed session, invalid locator) are returned
//! as errors. Resolution never mutates the UI.

use tracing::debug;

use crate::locator::Locator;
use crate::result::PageflowResult;
use crate::session::{ElementHandle, Session};
use crate::wait::{poll_until, Probe, Readiness, WaitPolicy, WaitResult};

/// Outcome of resolving a locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Element is ready; the handle is valid until the next screen transition
    Ready(ElementHandle),
    /// Element never appeared
    NotFound,
    /// Element appeared but never became ready
    TimedOut,
}

impl Resolution {
    /// The handle, if resolution succeeded
    #[must_use]
    pub fn handle(self) -> Option<ElementHandle> {
        match self {
            Self::Ready(handle) => Some(handle),
            Self::NotFound | Self::TimedOut => None,
        }
    }

    /// Whether resolution succeeded
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Polls a session until an element is ready
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementResolver {
    policy: WaitPolicy,
}

impl ElementResolver {
    /// Create a resolver with a default wait policy
    #[must_use]
    pub const fn new(policy: WaitPolicy) -> Self {
        Self { policy }
    }

    /// Default wait policy
    #[must_use]
    pub const fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// Resolve with the resolver's own policy
    pub async fn resolve<S: Session + ?Sized>(
        &self,
        session: &S,
        locator: &Locator,
        readiness: Readiness,
    ) -> PageflowResult<Resolution> {
        self.resolve_with(session, locator, readiness, &self.policy)
            .await
    }

    /// Resolve with an explicit policy
    pub async fn resolve_with<S: Session + ?Sized>(
        &self,
        session: &S,
        locator: &Locator,
        readiness: Readiness,
        policy: &WaitPolicy,
    ) -> PageflowResult<Resolution> {
        let waited = poll_until(policy, || probe(session, locator, readiness)).await?;
        let elapsed_ms = waited.elapsed().as_millis() as u64;
        let attempts = waited.attempts();

        let resolution = match waited {
            WaitResult::Ready { value, .. } => Resolution::Ready(value),
            WaitResult::Expired { observed: true, .. } => Resolution::TimedOut,
            WaitResult::Expired { observed: false, .. } => Resolution::NotFound,
        };
        debug!(
            %locator,
            %readiness,
            elapsed_ms,
            attempts,
            outcome = resolution_name(&resolution),
            "resolved element"
        );
        Ok(resolution)
    }
}

const fn resolution_name(resolution: &Resolution) -> &'static str {
    match resolution {
        Resolution::Ready(_) => "ready",
        Resolution::NotFound => "not_found",
        Resolution::TimedOut => "timed_out",
    }
}

/// One look at the session.
///
/// Non-fatal errors (stale handle between lookup and state check, adapter-level not-found)
/// count as "not ready yet"; session faults abort the wait.
async fn probe<S: Session + ?Sized>(
    session: &S,
    locator: &Locator,
    readiness: Readiness,
) -> PageflowResult<Probe<ElementHandle>> {
    let handle = match session.find_element(locator).await {
        Ok(Some(handle)) => handle,
        Ok(None) => return Ok(Probe::absent()),
        Err(e) if e.is_session_fault() => return Err(e),
        Err(_) => return Ok(Probe::absent()),
    };

    if readiness.requires_visible() && !check(session.is_displayed(&handle).await)? {
        return Ok(Probe::observed());
    }
    if readiness.requires_enabled() && !check(session.is_enabled(&handle).await)? {
        return Ok(Probe::observed());
    }
    Ok(Probe::Ready(handle))
}

/// A state check that failed for a non-fatal reason reads as "not yet"
fn check(result: PageflowResult<bool>) -> PageflowResult<bool> {
    match result {
        Ok(flag) => Ok(flag),
        Err(e) if e.is_session_fault() => Err(e),
        Err(_) => Ok(false),
    }
}
