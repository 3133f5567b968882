//! Mock session for offline flow testing
//!
//! [`MockSession`] scripts a UI: elements that appear after a delay, stay hidden, stay
//! disabled, go stale or reject actions, fail text reads, clicks that navigate or dismiss,
//! slow lookups and transport faults. Every call is recorded for verification.
//!
//! Element appearance is measured on the tokio clock, so `#[tokio::test(start_paused = true)]`
//! gives exact timings.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::locator::{Locator, Platform};
use crate::result::{PageflowError, PageflowResult};
use crate::session::{ElementHandle, Session, ENTER_KEY};

/// Scripted element
#[derive(Debug, Clone)]
pub struct MockElement {
    locator: Locator,
    text: String,
    appears_after: Duration,
    displayed: bool,
    enabled: bool,
    stale_actions: u32,
    rejected_actions: u32,
    failed_reads: u32,
    dismissed_on_click: bool,
    navigates_to: Option<String>,
}

impl MockElement {
    /// Element present immediately, displayed and enabled
    #[must_use]
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            text: String::new(),
            appears_after: Duration::ZERO,
            displayed: true,
            enabled: true,
            stale_actions: 0,
            rejected_actions: 0,
            failed_reads: 0,
            dismissed_on_click: false,
            navigates_to: None,
        }
    }

    /// Set the element text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Element only exists once this much time has passed since the session was built
    #[must_use]
    pub const fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_after = delay;
        self
    }

    /// Element exists but is never displayed
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Element is displayed but never enabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The next `count` actions fail with a stale element reference
    #[must_use]
    pub const fn stale_for(mut self, count: u32) -> Self {
        self.stale_actions = count;
        self
    }

    /// The next `count` actions are rejected by the backend
    #[must_use]
    pub const fn rejects(mut self, count: u32) -> Self {
        self.rejected_actions = count;
        self
    }

    /// The next `count` text reads fail with a stale element reference
    #[must_use]
    pub const fn failing_reads(mut self, count: u32) -> Self {
        self.failed_reads = count;
        self
    }

    /// Clicking removes the element (popups, onboarding)
    #[must_use]
    pub const fn dismissed_on_click(mut self) -> Self {
        self.dismissed_on_click = true;
        self
    }

    /// Clicking moves the session to `location`
    #[must_use]
    pub fn navigates_to(mut self, location: impl Into<String>) -> Self {
        self.navigates_to = Some(location.into());
        self
    }
}

#[derive(Debug)]
struct MockState {
    elements: Vec<MockElement>,
    issued: Vec<(String, Locator, u64)>,
    epoch: u64,
    location: String,
    back_stack: Vec<String>,
    history: Vec<String>,
    disconnected: bool,
    reject_back: bool,
    closed: bool,
    close_calls: u32,
}

/// Mock session for unit and flow testing
///
/// Clones share state: a clone kept by the test observes a session that was moved into a
/// fixture or a page.
#[derive(Debug, Clone)]
pub struct MockSession {
    platform: Platform,
    started: Instant,
    lookup_latency: Duration,
    state: Arc<Mutex<MockState>>,
}

impl MockSession {
    /// Create an empty mock session
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            started: Instant::now(),
            lookup_latency: Duration::ZERO,
            state: Arc::new(Mutex::new(MockState {
                elements: Vec::new(),
                issued: Vec::new(),
                epoch: 0,
                location: String::new(),
                back_stack: Vec::new(),
                history: Vec::new(),
                disconnected: false,
                reject_back: false,
                closed: false,
                close_calls: 0,
            })),
        }
    }

    /// Set the initial location
    #[must_use]
    pub fn with_location(self, location: impl Into<String>) -> Self {
        self.lock().location = location.into();
        self
    }

    /// Add a scripted element
    #[must_use]
    pub fn with_element(self, element: MockElement) -> Self {
        self.add_element(element);
        self
    }

    /// Every element lookup takes this long to answer (a stalled backend)
    #[must_use]
    pub const fn with_lookup_latency(mut self, latency: Duration) -> Self {
        self.lookup_latency = latency;
        self
    }

    /// Generic back navigation is rejected by the backend
    #[must_use]
    pub fn rejecting_back(self) -> Self {
        self.lock().reject_back = true;
        self
    }

    /// Add a scripted element to a running session
    pub fn add_element(&self, element: MockElement) {
        self.lock().elements.push(element);
    }

    /// Simulate a dropped connection: every later call fails with a session error
    pub fn disconnect(&self) {
        self.lock().disconnected = true;
    }

    /// Call history for verification
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if a call starting with `prefix` was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(prefix))
    }

    /// Number of calls starting with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.lock()
            .history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Whether close() has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of close() calls, including no-op repeats
    #[must_use]
    pub fn close_calls(&self) -> u32 {
        self.lock().close_calls
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock, record the call and fail on closed/disconnected sessions
    fn enter(&self, call: String) -> PageflowResult<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        if state.closed {
            return Err(PageflowError::SessionClosed);
        }
        state.history.push(call);
        if state.disconnected {
            return Err(PageflowError::session("connection dropped"));
        }
        Ok(state)
    }

    fn is_live(&self, element: &MockElement) -> bool {
        self.started.elapsed() >= element.appears_after
    }

    fn resolve_index(
        &self,
        state: &MockState,
        element: &ElementHandle,
    ) -> PageflowResult<usize> {
        let stale = || PageflowError::StaleElement {
            element_id: element.id().to_string(),
        };
        let (_, locator, epoch) = state
            .issued
            .iter()
            .find(|(id, _, _)| id == element.id())
            .ok_or_else(stale)?;
        if *epoch != state.epoch {
            return Err(stale());
        }
        state
            .elements
            .iter()
            .position(|e| &e.locator == locator && self.is_live(e))
            .ok_or_else(stale)
    }

    /// Shared path for mutating actions: stale/reject scripting, then the action itself
    fn act(
        &self,
        call: String,
        element: &ElementHandle,
        apply: impl FnOnce(&mut MockState, usize),
    ) -> PageflowResult<()> {
        let mut state = self.enter(call)?;
        let index = self.resolve_index(&state, element)?;
        let scripted = &mut state.elements[index];
        if scripted.stale_actions > 0 {
            scripted.stale_actions -= 1;
            return Err(PageflowError::StaleElement {
                element_id: element.id().to_string(),
            });
        }
        if scripted.rejected_actions > 0 {
            scripted.rejected_actions -= 1;
            return Err(PageflowError::action_rejected("element click intercepted"));
        }
        apply(&mut *state, index);
        Ok(())
    }
}

fn transition(state: &mut MockState, location: String) {
    let previous = std::mem::replace(&mut state.location, location);
    state.back_stack.push(previous);
    state.epoch += 1;
}

#[async_trait]
impl Session for MockSession {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn find_element(&self, locator: &Locator) -> PageflowResult<Option<ElementHandle>> {
        if !self.lookup_latency.is_zero() {
            tokio::time::sleep(self.lookup_latency).await;
        }
        let mut state = self.enter(format!("find:{locator}"))?;
        let found = state
            .elements
            .iter()
            .any(|e| &e.locator == locator && self.is_live(e));
        if !found {
            return Ok(None);
        }
        let id = Uuid::new_v4().to_string();
        let epoch = state.epoch;
        state.issued.push((id.clone(), locator.clone(), epoch));
        Ok(Some(ElementHandle::new(id, locator.clone())))
    }

    async fn is_displayed(&self, element: &ElementHandle) -> PageflowResult<bool> {
        let state = self.enter(format!("is_displayed:{}", element.locator()))?;
        let index = self.resolve_index(&state, element)?;
        Ok(state.elements[index].displayed)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> PageflowResult<bool> {
        let state = self.enter(format!("is_enabled:{}", element.locator()))?;
        let index = self.resolve_index(&state, element)?;
        Ok(state.elements[index].enabled)
    }

    async fn text(&self, element: &ElementHandle) -> PageflowResult<String> {
        let mut state = self.enter(format!("text:{}", element.locator()))?;
        let index = self.resolve_index(&state, element)?;
        let scripted = &mut state.elements[index];
        if scripted.failed_reads > 0 {
            scripted.failed_reads -= 1;
            return Err(PageflowError::StaleElement {
                element_id: element.id().to_string(),
            });
        }
        Ok(scripted.text.clone())
    }

    async fn click(&self, element: &ElementHandle) -> PageflowResult<()> {
        self.act(format!("click:{}", element.locator()), element, |state, index| {
            let target = state.elements[index].navigates_to.clone();
            if state.elements[index].dismissed_on_click {
                let _ = state.elements.remove(index);
            }
            if let Some(location) = target {
                transition(state, location);
            }
        })
    }

    async fn send_text(&self, element: &ElementHandle, text: &str) -> PageflowResult<()> {
        let call = if text == ENTER_KEY {
            format!("submit:{}", element.locator())
        } else {
            format!("send_text:{}:{text}", element.locator())
        };
        self.act(call, element, |state, index| {
            if text != ENTER_KEY {
                state.elements[index].text.push_str(text);
            }
        })
    }

    async fn clear(&self, element: &ElementHandle) -> PageflowResult<()> {
        self.act(format!("clear:{}", element.locator()), element, |state, index| {
            state.elements[index].text.clear();
        })
    }

    async fn current_location(&self) -> PageflowResult<String> {
        let state = self.enter("current_location".to_string())?;
        Ok(state.location.clone())
    }

    async fn navigate_to(&self, url: &str) -> PageflowResult<()> {
        let mut state = self.enter(format!("navigate_to:{url}"))?;
        transition(&mut state, url.to_string());
        Ok(())
    }

    async fn navigate_back(&self) -> PageflowResult<()> {
        let mut state = self.enter("navigate_back".to_string())?;
        if state.reject_back {
            return Err(PageflowError::action_rejected("back navigation unavailable"));
        }
        if let Some(previous) = state.back_stack.pop() {
            state.location = previous;
            state.epoch += 1;
        }
        Ok(())
    }

    async fn close(&mut self) -> PageflowResult<()> {
        let mut state = self.lock();
        state.close_calls += 1;
        if !state.closed {
            state.closed = true;
            state.history.push("close".to_string());
        }
        Ok(())
    }
}
