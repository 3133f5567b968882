//! Locators: pure descriptions of how to find a UI element.
//!
//! A [`Locator`] says nothing about the current screen. It is created from configuration,
//! never mutated, and translated into a backend query only when the resolver asks a
//! [`Session`](crate::Session) for it.
//!
//! ```
//! use pageflow::{Locator, Platform};
//!
//! let search = Locator::id("searchInput");
//! let strategy = search.strategy(Platform::Browser).unwrap();
//! assert_eq!(strategy.using, "css selector");
//! assert_eq!(strategy.value, r#"[id="searchInput"]"#);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::{PageflowError, PageflowResult};

/// Automation backend family a locator is translated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Desktop browser driven through a W3C browser driver
    Browser,
    /// Android application driven through Appium (UiAutomator2)
    Android,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Browser => write!(f, "browser"),
            Self::Android => write!(f, "android"),
        }
    }
}

/// Structural query with its dialect
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "dialect", content = "expression", rename_all = "snake_case")]
pub enum StructuralQuery {
    /// XPath expression (both platforms)
    #[serde(rename = "xpath")]
    XPath(String),
    /// CSS selector (browser only)
    Css(String),
    /// Android `UiSelector` expression (Android only)
    UiAutomator(String),
}

/// How to find a UI element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// Element identifier (DOM id or Android resource id)
    Id(String),
    /// Accessibility label (`aria-label` or Android content description)
    AccessibilityLabel(String),
    /// Structural query over the UI tree
    StructuralQuery(StructuralQuery),
}

/// W3C WebDriver location strategy: the `using`/`value` pair of a find-element request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorStrategy {
    /// Strategy name (`css selector`, `xpath`, `id`, `accessibility id`, ...)
    pub using: String,
    /// Strategy argument
    pub value: String,
}

impl LocatorStrategy {
    fn new(using: &str, value: impl Into<String>) -> Self {
        Self {
            using: using.to_string(),
            value: value.into(),
        }
    }
}

impl Locator {
    /// Locate by identifier
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Locate by accessibility label
    #[must_use]
    pub fn accessibility_label(label: impl Into<String>) -> Self {
        Self::AccessibilityLabel(label.into())
    }

    /// Locate by XPath
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::StructuralQuery(StructuralQuery::XPath(expression.into()))
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::StructuralQuery(StructuralQuery::Css(selector.into()))
    }

    /// Locate by Android `UiSelector` expression
    #[must_use]
    pub fn ui_automator(expression: impl Into<String>) -> Self {
        Self::StructuralQuery(StructuralQuery::UiAutomator(expression.into()))
    }

    /// Translate into a W3C WebDriver strategy for `platform`
    ///
    /// # Errors
    ///
    /// Returns [`PageflowError::InvalidLocator`] when the dialect has no equivalent on the
    /// platform (CSS on Android, `UiSelector` in a browser).
    pub fn strategy(&self, platform: Platform) -> PageflowResult<LocatorStrategy> {
        let strategy = match (self, platform) {
            (Self::Id(id), Platform::Browser) => {
                LocatorStrategy::new("css selector", css_attribute("id", id))
            }
            (Self::Id(id), Platform::Android) => LocatorStrategy::new("id", id.clone()),
            (Self::AccessibilityLabel(label), Platform::Browser) => {
                LocatorStrategy::new("css selector", css_attribute("aria-label", label))
            }
            (Self::AccessibilityLabel(label), Platform::Android) => {
                LocatorStrategy::new("accessibility id", label.clone())
            }
            (Self::StructuralQuery(StructuralQuery::XPath(xpath)), _) => {
                LocatorStrategy::new("xpath", xpath.clone())
            }
            (Self::StructuralQuery(StructuralQuery::Css(css)), Platform::Browser) => {
                LocatorStrategy::new("css selector", css.clone())
            }
            (Self::StructuralQuery(StructuralQuery::UiAutomator(expr)), Platform::Android) => {
                LocatorStrategy::new("-android uiautomator", expr.clone())
            }
            (Self::StructuralQuery(_), _) => {
                return Err(PageflowError::InvalidLocator {
                    locator: self.to_string(),
                    message: format!("dialect not supported on {platform}"),
                })
            }
        };
        Ok(strategy)
    }
}

/// `[name="value"]` with quotes and backslashes escaped
fn css_attribute(name: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[{name}=\"{escaped}\"]")
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::AccessibilityLabel(label) => write!(f, "a11y={label}"),
            Self::StructuralQuery(StructuralQuery::XPath(x)) => write!(f, "xpath={x}"),
            Self::StructuralQuery(StructuralQuery::Css(c)) => write!(f, "css={c}"),
            Self::StructuralQuery(StructuralQuery::UiAutomator(u)) => write!(f, "uiautomator={u}"),
        }
    }
}
