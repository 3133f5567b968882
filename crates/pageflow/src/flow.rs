//! Page flow control.
//!
//! A flow is an ordered sequence of required steps. Each step reports an
//! [`ActionOutcome`]; the flow advances only on [`ActionOutcome::Success`] and otherwise
//! halts with the furthest state reached plus the failing step's outcome. Session faults
//! terminate the flow as errors.
//!
//! ```text
//! Idle ──► SearchBoxReady ──► QueryEntered ──► ResultsShown ──► ArticleOpen
//!   │            │                 │                │
//!   └────────────┴─────────────────┴────────────────┴──► Failed(state, outcome)
//! ```
//!
//! The two fallback patterns shared by pages also live here: back navigation
//! (control, then the session's generic back) and text reads (primary, then alternative).

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::action::{Action, ActionExecutor, ActionOutcome, TextRead};
use crate::locator::Locator;
use crate::result::{PageflowError, PageflowResult};
use crate::session::Session;

// =============================================================================
// STATES
// =============================================================================

/// States of the search-and-open flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchState {
    /// Nothing done yet
    Idle,
    /// Search input is focused and ready for text
    SearchBoxReady,
    /// Query typed
    QueryEntered,
    /// Result list visible
    ResultsShown,
    /// Article screen reached
    ArticleOpen,
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::SearchBoxReady => "SearchBoxReady",
            Self::QueryEntered => "QueryEntered",
            Self::ResultsShown => "ResultsShown",
            Self::ArticleOpen => "ArticleOpen",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// A required step that did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowFailure<S> {
    /// Furthest state reached
    pub state: S,
    /// Name of the failing step
    pub step: &'static str,
    /// What the step reported
    pub outcome: ActionOutcome,
}

impl<S: fmt::Display> fmt::Display for FlowFailure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step '{}' failed in state {}: {}",
            self.step, self.state, self.outcome
        )
    }
}

/// Terminal result of a flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome<S> {
    /// All required steps succeeded
    Completed(S),
    /// A required step halted the flow
    Failed(FlowFailure<S>),
}

impl<S: Copy> FlowOutcome<S> {
    /// Whether the flow completed
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Final state on completion, furthest state on failure
    #[must_use]
    pub const fn state(&self) -> S {
        match self {
            Self::Completed(state) => *state,
            Self::Failed(failure) => failure.state,
        }
    }

    /// The failure, if any
    #[must_use]
    pub const fn failure(&self) -> Option<&FlowFailure<S>> {
        match self {
            Self::Completed(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// Why a flow body stopped early
#[derive(Debug)]
pub enum FlowHalt<S> {
    /// A required step failed
    Step(FlowFailure<S>),
    /// The session failed
    Fault(PageflowError),
}

impl<S> From<FlowFailure<S>> for FlowHalt<S> {
    fn from(failure: FlowFailure<S>) -> Self {
        Self::Step(failure)
    }
}

impl<S> From<PageflowError> for FlowHalt<S> {
    fn from(error: PageflowError) -> Self {
        Self::Fault(error)
    }
}

// =============================================================================
// FLOW RUN
// =============================================================================

/// Tracks the state of one flow execution
#[derive(Debug)]
pub struct FlowRun<S> {
    name: &'static str,
    state: S,
}

impl<S: Copy + fmt::Display> FlowRun<S> {
    /// Start a flow in `initial`
    #[must_use]
    pub fn start(name: &'static str, initial: S) -> Self {
        debug!(flow = name, state = %initial, "flow started");
        Self {
            name,
            state: initial,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> S {
        self.state
    }

    /// Require `outcome` to be a success, then move to `next`
    pub fn require(
        &mut self,
        step: &'static str,
        outcome: ActionOutcome,
        next: S,
    ) -> Result<(), FlowFailure<S>> {
        self.check(step, outcome)?;
        info!(flow = self.name, step, from = %self.state, to = %next, "flow transition");
        self.state = next;
        Ok(())
    }

    /// Require `outcome` to be a success without changing state
    pub fn check(&self, step: &'static str, outcome: ActionOutcome) -> Result<(), FlowFailure<S>> {
        if outcome.is_success() {
            return Ok(());
        }
        warn!(flow = self.name, step, state = %self.state, %outcome, "flow halted");
        Err(FlowFailure {
            state: self.state,
            step,
            outcome,
        })
    }

    /// Turn the body's result into a flow outcome; session faults stay errors
    pub fn finish(self, body: Result<(), FlowHalt<S>>) -> PageflowResult<FlowOutcome<S>> {
        match body {
            Ok(()) => {
                info!(flow = self.name, state = %self.state, "flow completed");
                Ok(FlowOutcome::Completed(self.state))
            }
            Err(FlowHalt::Step(failure)) => Ok(FlowOutcome::Failed(failure)),
            Err(FlowHalt::Fault(error)) => {
                warn!(flow = self.name, state = %self.state, %error, "flow aborted by session fault");
                Err(error)
            }
        }
    }
}

// =============================================================================
// FALLBACK PATTERNS
// =============================================================================

/// Which path a back navigation took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackPath {
    /// The on-screen back control was clicked
    Control,
    /// The session's generic back navigation was used
    SessionBack,
}

/// Result of a back navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackNavigation {
    /// Path taken
    pub path: BackPath,
    /// Outcome of that path
    pub outcome: ActionOutcome,
}

/// Click the back control; use the session's back only when the control cannot be resolved.
///
/// A rejected click on a resolved control is reported as is, never followed by the fallback.
pub async fn navigate_back<S: Session + ?Sized>(
    executor: &ActionExecutor,
    session: &S,
    control: &Locator,
) -> PageflowResult<BackNavigation> {
    let primary = executor.perform(session, control, &Action::Click).await?;
    if !primary.is_unavailable() {
        return Ok(BackNavigation {
            path: BackPath::Control,
            outcome: primary,
        });
    }

    warn!(%control, outcome = %primary, "back control unavailable, using session back");
    let outcome = match session.navigate_back().await {
        Ok(()) => ActionOutcome::Success,
        Err(e) if e.is_session_fault() => return Err(e),
        Err(e) => ActionOutcome::ActionFailed(e.to_string()),
    };
    Ok(BackNavigation {
        path: BackPath::SessionBack,
        outcome,
    })
}

/// Result of reading a text with a fallback locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleRead {
    /// Text read from one of the locators (may be empty)
    Title(String),
    /// Neither locator found a visible element
    Absent,
    /// An element was there but its text could not be read; carries the last cause
    Unreadable(String),
}

impl TitleRead {
    /// The title, if one was read
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Title(title) => Some(title),
            Self::Absent | Self::Unreadable(_) => None,
        }
    }

    /// Fold a single text read: only a failed read is reported as unreadable
    #[must_use]
    pub fn from_read(read: TextRead, normalize: impl FnOnce(String) -> String) -> Self {
        match read {
            TextRead::Text(text) => Self::Title(normalize(text)),
            TextRead::ReadFailed(cause) => Self::Unreadable(cause),
            TextRead::NotFound | TextRead::TimedOut => Self::Absent,
        }
    }
}

impl fmt::Display for TitleRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title(title) => write!(f, "'{title}'"),
            Self::Absent => write!(f, "absent"),
            Self::Unreadable(cause) => write!(f, "unreadable: {cause}"),
        }
    }
}

/// Read the first text available from `primary`, then `alternative`.
///
/// `Absent` only when neither element showed up; a failed read on either side
/// yields `Unreadable` unless the other locator produced a text.
pub async fn read_first_text<S: Session + ?Sized>(
    executor: &ActionExecutor,
    session: &S,
    primary: &Locator,
    alternative: &Locator,
) -> PageflowResult<TitleRead> {
    let policy = *executor.resolver().policy();
    let mut failure = None;
    for locator in [primary, alternative] {
        match executor.read_text(session, locator, &policy).await? {
            TextRead::Text(text) => return Ok(TitleRead::Title(text)),
            TextRead::ReadFailed(cause) => {
                warn!(%locator, %cause, "text read failed");
                failure = Some(cause);
            }
            other => debug!(%locator, read = ?other, "text unavailable"),
        }
    }
    Ok(failure.map_or(TitleRead::Absent, TitleRead::Unreadable))
}

// ============================================================================
// EXTREME TDD: Tests written FIRST
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Platform;
    use crate::mock::{MockElement, MockSession};
    use crate::wait::WaitPolicy;

    fn executor() -> ActionExecutor {
        ActionExecutor::new(
            WaitPolicy::from_millis(500, 100),
            WaitPolicy::from_millis(200, 100),
        )
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_require_advances_on_success() {
            let mut run = FlowRun::start("test", SearchState::Idle);
            run.require("open", ActionOutcome::Success, SearchState::SearchBoxReady)
                .unwrap();
            assert_eq!(run.state(), SearchState::SearchBoxReady);
        }

        #[test]
        fn test_require_halts_in_current_state() {
            let mut run = FlowRun::start("test", SearchState::SearchBoxReady);
            let failure = run
                .require("type", ActionOutcome::TimedOut, SearchState::QueryEntered)
                .unwrap_err();
            assert_eq!(failure.state, SearchState::SearchBoxReady);
            assert_eq!(failure.outcome, ActionOutcome::TimedOut);
            assert_eq!(run.state(), SearchState::SearchBoxReady);
        }

        #[test]
        fn test_finish_keeps_faults_as_errors() {
            let run = FlowRun::start("test", SearchState::Idle);
            let result = run.finish(Err(FlowHalt::Fault(PageflowError::session("gone"))));
            assert!(result.is_err());
        }

        #[test]
        fn test_failure_display() {
            let failure = FlowFailure {
                state: SearchState::QueryEntered,
                step: "open first result",
                outcome: ActionOutcome::NotFound,
            };
            assert_eq!(
                failure.to_string(),
                "step 'open first result' failed in state QueryEntered: not found"
            );
        }
    }

    mod back_tests {
        use super::*;

        fn control() -> Locator {
            Locator::accessibility_label("Navigate up")
        }

        #[tokio::test(start_paused = true)]
        async fn test_control_clicked() {
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(control()));
            let back = navigate_back(&executor(), &session, &control()).await.unwrap();
            assert_eq!(back.path, BackPath::Control);
            assert!(!session.was_called("navigate_back"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_fallback_when_control_missing() {
            let session = MockSession::new(Platform::Android);
            let back = navigate_back(&executor(), &session, &control()).await.unwrap();
            assert_eq!(back.path, BackPath::SessionBack);
            assert_eq!(back.outcome, ActionOutcome::Success);
        }

        #[tokio::test(start_paused = true)]
        async fn test_fallback_outcome_is_reported() {
            let session = MockSession::new(Platform::Android).rejecting_back();
            let back = navigate_back(&executor(), &session, &control()).await.unwrap();
            assert_eq!(back.path, BackPath::SessionBack);
            assert!(matches!(back.outcome, ActionOutcome::ActionFailed(_)));
        }

        #[tokio::test(start_paused = true)]
        async fn test_no_fallback_after_rejected_click() {
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(control()).rejects(2));
            let back = navigate_back(&executor(), &session, &control()).await.unwrap();
            assert_eq!(back.path, BackPath::Control);
            assert!(matches!(back.outcome, ActionOutcome::ActionFailed(_)));
            assert!(!session.was_called("navigate_back"));
        }
    }

    mod title_tests {
        use super::*;

        fn primary() -> Locator {
            Locator::xpath("//android.widget.TextView[1]")
        }

        fn alternative() -> Locator {
            Locator::ui_automator("new UiSelector().className(\"android.widget.TextView\").instance(0)")
        }

        #[tokio::test(start_paused = true)]
        async fn test_alternative_used_when_primary_missing() {
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(alternative()).with_text("Appium"));
            let title = read_first_text(&executor(), &session, &primary(), &alternative())
                .await
                .unwrap();
            assert_eq!(title, TitleRead::Title("Appium".to_string()));
        }

        #[tokio::test(start_paused = true)]
        async fn test_absent_differs_from_empty() {
            let empty = MockSession::new(Platform::Android).with_element(MockElement::new(primary()));
            let none = MockSession::new(Platform::Android);

            let read_empty = read_first_text(&executor(), &empty, &primary(), &alternative())
                .await
                .unwrap();
            let read_none = read_first_text(&executor(), &none, &primary(), &alternative())
                .await
                .unwrap();

            assert_eq!(read_empty, TitleRead::Title(String::new()));
            assert_eq!(read_none, TitleRead::Absent);
            assert_ne!(read_empty, read_none);
        }

        #[tokio::test(start_paused = true)]
        async fn test_failed_read_is_not_absent() {
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(primary()).with_text("Appium").failing_reads(2));

            let title = read_first_text(&executor(), &session, &primary(), &alternative())
                .await
                .unwrap();

            assert!(matches!(&title, TitleRead::Unreadable(cause) if cause.contains("Stale")), "{title:?}");
            assert_eq!(title.as_str(), None);
            assert_eq!(session.call_count("text:"), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_alternative_text_wins_over_failed_primary() {
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(primary()).failing_reads(2))
                .with_element(MockElement::new(alternative()).with_text("Selenium"));

            let title = read_first_text(&executor(), &session, &primary(), &alternative())
                .await
                .unwrap();

            assert_eq!(title, TitleRead::Title("Selenium".to_string()));
        }

        #[tokio::test(start_paused = true)]
        async fn test_single_failed_read_is_retried() {
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(primary()).with_text("Appium").failing_reads(1));

            let title = read_first_text(&executor(), &session, &primary(), &alternative())
                .await
                .unwrap();

            assert_eq!(title, TitleRead::Title("Appium".to_string()));
        }
    }
}
