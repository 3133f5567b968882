//! Page objects
//!
//! Each page borrows a session for one scenario and exposes intention-revealing
//! operations built from the resolver, the action executor and the flow helpers.
//! Locators come from configuration; pages hold no locator strings of their own.

mod app;
mod web;

use crate::action::ActionOutcome;
use crate::locator::Locator;

pub use app::ArticleAppPage;
pub use web::ArticleWebPage;

/// Result of checking that a page shows its landmark elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCheck {
    /// Every landmark is visible
    Loaded,
    /// A landmark did not show up
    Missing {
        /// Landmark that failed
        locator: Locator,
        /// How it failed
        outcome: ActionOutcome,
    },
}

impl PageCheck {
    /// Whether the page loaded
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

/// Result of a navigation, with the locations seen around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChange {
    /// Outcome of the navigation step
    pub outcome: ActionOutcome,
    /// Location before the navigation
    pub before: String,
    /// Location after the navigation
    pub after: String,
}

impl LocationChange {
    /// Whether the navigation succeeded and moved somewhere else
    #[must_use]
    pub fn changed(&self) -> bool {
        self.outcome.is_success() && self.before != self.after
    }
}
