//! Pageflow: Resilient Page-Object Flows for Browser and Android UI Tests
//!
//! Pageflow locates, waits for and acts on UI elements that may be absent or slow,
//! over any automation backend that implements [`Session`]. Absence is an outcome,
//! never a crash, and every flow reports the furthest state it reached.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PAGEFLOW Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Pages      │    │ Action     │    │ Element    │            │
//! │   │ (flows)    │───►│ Executor   │───►│ Resolver   │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             ▼                   │
//! │                 ┌──────────────────────────────────┐            │
//! │                 │ Session: WebDriver | Mock         │            │
//! │                 └──────────────────────────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use pageflow::{ArticleWebPage, MockElement, MockSession, PageflowConfig, Platform, TitleRead};
//!
//! # async fn demo() -> pageflow::PageflowResult<()> {
//! let config = PageflowConfig::web();
//! let heading = config.locators.web.article_heading.clone();
//! let session = MockSession::new(Platform::Browser)
//!     .with_element(MockElement::new(heading).with_text("Россия"));
//!
//! let page = ArticleWebPage::new(&session, &config)?;
//! assert_eq!(page.article_title().await?, TitleRead::Title("Россия".to_string()));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod action;
mod config;
mod fixture;
mod flow;
mod locator;
pub mod mock;
mod pages;
mod resolver;
mod result;
mod session;
pub mod wait;
#[cfg(feature = "webdriver")]
pub mod webdriver;

pub use action::{Action, ActionExecutor, ActionOutcome, Dismissal, TextRead, MAX_ACTION_ATTEMPTS};
pub use config::{
    AppIdentity, AppLocators, LocatorTables, PageflowConfig, WebLocators, DEFAULT_APPIUM_ENDPOINT,
    DEFAULT_BROWSER_ENDPOINT, ENV_ENDPOINT, ENV_IMPLICIT_WAIT_MS,
};
pub use fixture::SessionFixture;
pub use flow::{
    navigate_back, read_first_text, BackNavigation, BackPath, FlowFailure, FlowHalt, FlowOutcome,
    FlowRun, SearchState, TitleRead,
};
pub use locator::{Locator, LocatorStrategy, Platform, StructuralQuery};
pub use mock::{MockElement, MockSession};
pub use pages::{ArticleAppPage, ArticleWebPage, LocationChange, PageCheck};
pub use resolver::{ElementResolver, Resolution};
pub use result::{PageflowError, PageflowResult};
pub use session::{ElementHandle, Session, ENTER_KEY};
pub use wait::{Readiness, WaitPolicy};
#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverSession;
