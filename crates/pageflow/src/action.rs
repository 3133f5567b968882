//! Optional-action execution.
//!
//! [`ActionExecutor::perform`] resolves an element and applies exactly one mutating action.
//! When resolution fails no action is attempted. When the backend rejects the action
//! (stale element, click intercepted) the element is re-resolved and the action retried
//! once; a second failure is reported as [`ActionOutcome::ActionFailed`]. Session faults
//! are returned as errors and never retried.

use std::fmt;
use tracing::{debug, info, warn};

use crate::locator::Locator;
use crate::resolver::{ElementResolver, Resolution};
use crate::result::{PageflowError, PageflowResult};
use crate::session::{ElementHandle, Session};
use crate::wait::{Readiness, WaitPolicy};

/// Most attempts a single perform makes (initial + one retry)
pub const MAX_ACTION_ATTEMPTS: u32 = 2;

/// Mutating UI action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Click the element
    Click,
    /// Type text into the element
    TypeText(String),
    /// Clear an editable element
    Clear,
    /// Submit the element's form
    Submit,
}

impl Action {
    /// Type `text`
    #[must_use]
    pub fn type_text(text: impl Into<String>) -> Self {
        Self::TypeText(text.into())
    }

    async fn apply<S: Session + ?Sized>(
        &self,
        session: &S,
        element: &ElementHandle,
    ) -> PageflowResult<()> {
        match self {
            Self::Click => session.click(element).await,
            Self::TypeText(text) => session.send_text(element, text).await,
            Self::Clear => session.clear(element).await,
            Self::Submit => session.submit(element).await,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click => write!(f, "click"),
            Self::TypeText(text) => write!(f, "type {text:?}"),
            Self::Clear => write!(f, "clear"),
            Self::Submit => write!(f, "submit"),
        }
    }
}

/// Result of an optional action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Action applied
    Success,
    /// Element never appeared; no action attempted
    NotFound,
    /// Element appeared but never became interactable; no action attempted
    TimedOut,
    /// Backend rejected the action twice
    ActionFailed(String),
}

impl ActionOutcome {
    /// Whether the action was applied
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether the element could not be resolved
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::NotFound | Self::TimedOut)
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::NotFound => write!(f, "not found"),
            Self::TimedOut => write!(f, "timed out"),
            Self::ActionFailed(cause) => write!(f, "action failed: {cause}"),
        }
    }
}

/// A wait-only step succeeds when the element resolved
impl From<Resolution> for ActionOutcome {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Ready(_) => Self::Success,
            Resolution::NotFound => Self::NotFound,
            Resolution::TimedOut => Self::TimedOut,
        }
    }
}

/// Result of dismissing a transient overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dismissal {
    /// The overlay was present and clicked away
    Dismissed,
    /// Nothing was dismissed; the outcome is kept for logging only
    Skipped(ActionOutcome),
}

/// Result of reading an element's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextRead {
    /// Text read (possibly empty)
    Text(String),
    /// Element never appeared
    NotFound,
    /// Element appeared but never became visible
    TimedOut,
    /// Element resolved but reading failed twice
    ReadFailed(String),
}

/// Performs actions on elements that may be absent
#[derive(Debug, Clone, Copy)]
pub struct ActionExecutor {
    resolver: ElementResolver,
    dismiss_policy: WaitPolicy,
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new(WaitPolicy::default(), WaitPolicy::dismiss())
    }
}

impl ActionExecutor {
    /// Create an executor from a default policy and a short dismissal policy
    #[must_use]
    pub const fn new(policy: WaitPolicy, dismiss_policy: WaitPolicy) -> Self {
        Self {
            resolver: ElementResolver::new(policy),
            dismiss_policy,
        }
    }

    /// The resolver actions go through
    #[must_use]
    pub const fn resolver(&self) -> &ElementResolver {
        &self.resolver
    }

    /// Policy used for dismissals
    #[must_use]
    pub const fn dismiss_policy(&self) -> &WaitPolicy {
        &self.dismiss_policy
    }

    /// Wait for an element without acting on it
    pub async fn await_element<S: Session + ?Sized>(
        &self,
        session: &S,
        locator: &Locator,
        readiness: Readiness,
    ) -> PageflowResult<ActionOutcome> {
        let resolution = self.resolver.resolve(session, locator, readiness).await?;
        Ok(resolution.into())
    }

    /// Perform `action` with the default policy
    pub async fn perform<S: Session + ?Sized>(
        &self,
        session: &S,
        locator: &Locator,
        action: &Action,
    ) -> PageflowResult<ActionOutcome> {
        let policy = *self.resolver.policy();
        self.perform_with(session, locator, action, &policy).await
    }

    /// Perform `action` with an explicit policy
    pub async fn perform_with<S: Session + ?Sized>(
        &self,
        session: &S,
        locator: &Locator,
        action: &Action,
        policy: &WaitPolicy,
    ) -> PageflowResult<ActionOutcome> {
        let handle = match self.interactable(session, locator, policy).await? {
            Resolution::Ready(handle) => handle,
            Resolution::NotFound => return Ok(ActionOutcome::NotFound),
            Resolution::TimedOut => return Ok(ActionOutcome::TimedOut),
        };

        let first = match action.apply(session, &handle).await {
            Ok(()) => {
                debug!(%locator, %action, attempt = 1, "action applied");
                return Ok(ActionOutcome::Success);
            }
            Err(e) if e.is_session_fault() => return Err(e),
            Err(e) => e,
        };

        warn!(%locator, %action, error = %first, "action rejected, re-resolving once");
        let Some(handle) = self.interactable(session, locator, policy).await?.handle() else {
            return Ok(ActionOutcome::ActionFailed(first.to_string()));
        };
        match action.apply(session, &handle).await {
            Ok(()) => {
                debug!(%locator, %action, attempt = MAX_ACTION_ATTEMPTS, "action applied");
                Ok(ActionOutcome::Success)
            }
            Err(e) if e.is_session_fault() => Err(e),
            Err(e) => Ok(ActionOutcome::ActionFailed(e.to_string())),
        }
    }

    /// Click a transient overlay if it shows up within the dismissal policy.
    ///
    /// Any non-success outcome is a no-op. Session faults still surface.
    pub async fn dismiss_if_present<S: Session + ?Sized>(
        &self,
        session: &S,
        locator: &Locator,
    ) -> PageflowResult<Dismissal> {
        let outcome = self
            .perform_with(session, locator, &Action::Click, &self.dismiss_policy)
            .await?;
        if outcome.is_success() {
            info!(%locator, "dismissed transient overlay");
            Ok(Dismissal::Dismissed)
        } else {
            debug!(%locator, %outcome, "no overlay to dismiss");
            Ok(Dismissal::Skipped(outcome))
        }
    }

    /// Read the text of a visible element, re-resolving once on a stale read
    pub async fn read_text<S: Session + ?Sized>(
        &self,
        session: &S,
        locator: &Locator,
        policy: &WaitPolicy,
    ) -> PageflowResult<TextRead> {
        let mut last_error: Option<PageflowError> = None;
        for _ in 0..MAX_ACTION_ATTEMPTS {
            let handle = match self
                .resolver
                .resolve_with(session, locator, Readiness::Visible, policy)
                .await?
            {
                Resolution::Ready(handle) => handle,
                Resolution::NotFound if last_error.is_none() => return Ok(TextRead::NotFound),
                Resolution::TimedOut if last_error.is_none() => return Ok(TextRead::TimedOut),
                Resolution::NotFound | Resolution::TimedOut => break,
            };
            match session.text(&handle).await {
                Ok(text) => return Ok(TextRead::Text(text)),
                Err(e) if e.is_session_fault() => return Err(e),
                Err(e) => {
                    warn!(%locator, error = %e, "text read failed");
                    last_error = Some(e);
                }
            }
        }
        Ok(TextRead::ReadFailed(
            last_error.map_or_else(|| "element vanished".to_string(), |e| e.to_string()),
        ))
    }

    async fn interactable<S: Session + ?Sized>(
        &self,
        session: &S,
        locator: &Locator,
        policy: &WaitPolicy,
    ) -> PageflowResult<Resolution> {
        self.resolver
            .resolve_with(session, locator, Readiness::Interactable, policy)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Platform;
    use crate::mock::{MockElement, MockSession};
    use proptest::prelude::*;

    fn skip() -> Locator {
        Locator::id("org.example:id/fragment_onboarding_skip_button")
    }

    fn executor() -> ActionExecutor {
        ActionExecutor::new(
            WaitPolicy::from_millis(1_000, 100),
            WaitPolicy::from_millis(300, 100),
        )
    }

    mod perform_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_click_success() {
            let session = MockSession::new(Platform::Android).with_element(MockElement::new(skip()));
            let outcome = executor()
                .perform(&session, &skip(), &Action::Click)
                .await
                .unwrap();
            assert_eq!(outcome, ActionOutcome::Success);
            assert_eq!(session.call_count("click:"), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_not_found_attempts_no_action() {
            let session = MockSession::new(Platform::Android);
            let outcome = executor()
                .perform(&session, &skip(), &Action::type_text("Appium"))
                .await
                .unwrap();
            assert_eq!(outcome, ActionOutcome::NotFound);
            assert!(!session.was_called("send_text"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_disabled_times_out_without_action() {
            let session =
                MockSession::new(Platform::Browser).with_element(MockElement::new(skip()).disabled());
            let outcome = executor()
                .perform(&session, &skip(), &Action::Click)
                .await
                .unwrap();
            assert_eq!(outcome, ActionOutcome::TimedOut);
            assert!(!session.was_called("click"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_stale_once_is_retried() {
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(skip()).stale_for(1));
            let outcome = executor()
                .perform(&session, &skip(), &Action::Click)
                .await
                .unwrap();
            assert_eq!(outcome, ActionOutcome::Success);
            assert_eq!(session.call_count("click:"), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_persistent_rejection_is_action_failed() {
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(skip()).rejects(10));
            let outcome = executor()
                .perform(&session, &skip(), &Action::Click)
                .await
                .unwrap();
            assert!(matches!(outcome, ActionOutcome::ActionFailed(_)));
            assert_eq!(session.call_count("click:"), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_session_fault_is_not_retried() {
            let session = MockSession::new(Platform::Android).with_element(MockElement::new(skip()));
            session.disconnect();
            let result = executor().perform(&session, &skip(), &Action::Click).await;
            assert!(result.unwrap_err().is_session_fault());
            assert_eq!(session.call_count("click:"), 0);
        }
    }

    mod dismiss_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_dismiss_twice_is_idempotent() {
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(skip()).dismissed_on_click());
            let exec = executor();

            let first = exec.dismiss_if_present(&session, &skip()).await.unwrap();
            let second = exec.dismiss_if_present(&session, &skip()).await.unwrap();

            assert_eq!(first, Dismissal::Dismissed);
            assert_eq!(second, Dismissal::Skipped(ActionOutcome::NotFound));
            assert_eq!(session.call_count("click:"), 1);
        }

        #[derive(Clone, Default)]
        struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

        impl std::io::Write for LogBuffer {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_dismissal_logs_at_info() {
            let logs = LogBuffer::default();
            let writer = logs.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::INFO)
                .with_ansi(false)
                .without_time()
                .with_writer(move || writer.clone())
                .finish();
            let _guard = tracing::subscriber::set_default(subscriber);

            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(skip()).dismissed_on_click());
            let dismissal = executor().dismiss_if_present(&session, &skip()).await.unwrap();
            assert_eq!(dismissal, Dismissal::Dismissed);

            let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
            let line = output
                .lines()
                .find(|line| line.contains("dismissed transient overlay"))
                .expect("dismissal is logged");
            assert!(line.contains("INFO"), "{line}");
            assert!(!output.contains("WARN"), "{output}");
        }

        #[tokio::test(start_paused = true)]
        async fn test_dismiss_uses_short_policy() {
            let session = MockSession::new(Platform::Android);
            let start = tokio::time::Instant::now();
            let _ = executor().dismiss_if_present(&session, &skip()).await.unwrap();
            assert!(start.elapsed() < std::time::Duration::from_millis(400));
        }

        #[tokio::test(start_paused = true)]
        async fn test_dismiss_swallows_action_failure() {
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(skip()).rejects(5));
            let dismissal = executor().dismiss_if_present(&session, &skip()).await.unwrap();
            assert!(matches!(
                dismissal,
                Dismissal::Skipped(ActionOutcome::ActionFailed(_))
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_dismiss_surfaces_session_fault() {
            let session = MockSession::new(Platform::Android);
            session.disconnect();
            assert!(executor().dismiss_if_present(&session, &skip()).await.is_err());
        }
    }

    mod read_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_read_text() {
            let title = Locator::id("firstHeading");
            let session = MockSession::new(Platform::Browser)
                .with_element(MockElement::new(title.clone()).with_text("Россия"));
            let read = executor()
                .read_text(&session, &title, &WaitPolicy::from_millis(500, 100))
                .await
                .unwrap();
            assert_eq!(read, TextRead::Text("Россия".to_string()));
        }

        #[tokio::test(start_paused = true)]
        async fn test_read_missing() {
            let session = MockSession::new(Platform::Browser);
            let read = executor()
                .read_text(&session, &skip(), &WaitPolicy::from_millis(500, 100))
                .await
                .unwrap();
            assert_eq!(read, TextRead::NotFound);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_action_attempted_at_most_twice(failures in 0u32..6, stale in any::<bool>()) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();
            let (outcome, clicks) = runtime.block_on(async {
                let element = if stale {
                    MockElement::new(skip()).stale_for(failures)
                } else {
                    MockElement::new(skip()).rejects(failures)
                };
                let session = MockSession::new(Platform::Android).with_element(element);
                let outcome = executor()
                    .perform(&session, &skip(), &Action::Click)
                    .await
                    .unwrap();
                (outcome, session.call_count("click:"))
            });
            prop_assert!(clicks <= MAX_ACTION_ATTEMPTS as usize);
            prop_assert_eq!(outcome.is_success(), failures < MAX_ACTION_ATTEMPTS);
        }
    }
}
