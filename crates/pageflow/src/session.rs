//! Session - Abstract Automation Backend Trait
//!
//! A [`Session`] is a live connection to a browser driver or a device automation server.
//! Pageflow never reimplements the backend; it consumes this capability contract.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Session (abstract trait)                                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐  ┌──────────────────────┐              │
//! │  │  WebDriverSession    │  │  MockSession         │              │
//! │  │  W3C over HTTP       │  │  scripted, offline   │              │
//! │  │  chromedriver/Appium │  │  for flow tests      │              │
//! │  └──────────────────────┘  └──────────────────────┘              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One flow at a time drives a session. Element handles are only valid until the next
//! screen transition; callers re-resolve instead of keeping them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locator::{Locator, Platform};
use crate::result::PageflowResult;

/// W3C WebDriver code point for the Enter key
pub const ENTER_KEY: &str = "\u{E007}";

/// Reference to a located element, owned by its session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    id: String,
    locator: Locator,
}

impl ElementHandle {
    /// Create a handle for a backend element id found via `locator`
    #[must_use]
    pub fn new(id: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: id.into(),
            locator,
        }
    }

    /// Backend element id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Locator the element was found with
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }
}

/// Automation backend capability contract
///
/// Absence is not an error: [`Session::find_element`] returns `Ok(None)` when nothing
/// matches. Errors are reserved for stale handles, rejected actions and transport faults.
#[async_trait]
pub trait Session: Send + Sync {
    /// Backend family, used to translate locators
    fn platform(&self) -> Platform;

    /// Look up the first element matching `locator`
    async fn find_element(&self, locator: &Locator) -> PageflowResult<Option<ElementHandle>>;

    /// Whether the element is displayed
    async fn is_displayed(&self, element: &ElementHandle) -> PageflowResult<bool>;

    /// Whether the element is enabled
    async fn is_enabled(&self, element: &ElementHandle) -> PageflowResult<bool>;

    /// Visible text of the element
    async fn text(&self, element: &ElementHandle) -> PageflowResult<String>;

    /// Click the element
    async fn click(&self, element: &ElementHandle) -> PageflowResult<()>;

    /// Type text into the element
    async fn send_text(&self, element: &ElementHandle, text: &str) -> PageflowResult<()>;

    /// Clear an editable element
    async fn clear(&self, element: &ElementHandle) -> PageflowResult<()>;

    /// Submit the element's form (defaults to pressing Enter in it)
    async fn submit(&self, element: &ElementHandle) -> PageflowResult<()> {
        self.send_text(element, ENTER_KEY).await
    }

    /// Current URL (browser) or activity/screen id (Android)
    async fn current_location(&self) -> PageflowResult<String>;

    /// Open a URL (browser) or deep link (Android)
    async fn navigate_to(&self, url: &str) -> PageflowResult<()>;

    /// Generic back navigation
    async fn navigate_back(&self) -> PageflowResult<()>;

    /// Release the backend session; calling it again is a no-op
    async fn close(&mut self) -> PageflowResult<()>;
}
