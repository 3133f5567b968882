//! Pageflow configuration
//!
//! Target application identity, automation endpoint, wait policy and the locator tables
//! the pages use. Loaded from YAML and overridable from the environment:
//!
//! ```yaml
//! app_identity:
//!   kind: android_app
//!   package: org.wikipedia.alpha
//!   activity: org.wikipedia.main.MainActivity
//! endpoint: http://127.0.0.1:4723
//! implicit_wait_ms: 5000
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::locator::{Locator, Platform};
use crate::result::{PageflowError, PageflowResult};
use crate::wait::{
    WaitPolicy, DEFAULT_DISMISS_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Default Appium server address
pub const DEFAULT_APPIUM_ENDPOINT: &str = "http://127.0.0.1:4723";

/// Default chromedriver address
pub const DEFAULT_BROWSER_ENDPOINT: &str = "http://127.0.0.1:9515";

/// Resolution timeout of the web preset (15 seconds)
pub const DEFAULT_WEB_WAIT_TIMEOUT_MS: u64 = 15_000;

/// Environment variable overriding the endpoint
pub const ENV_ENDPOINT: &str = "PAGEFLOW_ENDPOINT";

/// Environment variable overriding the resolution timeout
pub const ENV_IMPLICIT_WAIT_MS: &str = "PAGEFLOW_IMPLICIT_WAIT_MS";

const WIKIPEDIA_PACKAGE: &str = "org.wikipedia.alpha";

/// Application under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppIdentity {
    /// Android application started by the automation server
    AndroidApp {
        /// Application package
        package: String,
        /// Launch activity
        activity: String,
    },
    /// Web site driven in a browser
    WebSite {
        /// Site root, opened when the session starts
        base_url: String,
        /// Main page, when it differs from the root
        #[serde(default, skip_serializing_if = "Option::is_none")]
        main_page: Option<String>,
    },
}

impl AppIdentity {
    /// Backend family this identity runs on
    #[must_use]
    pub const fn platform(&self) -> Platform {
        match self {
            Self::AndroidApp { .. } => Platform::Android,
            Self::WebSite { .. } => Platform::Browser,
        }
    }
}

/// Locators used by the web page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebLocators {
    /// Site logo
    pub logo: Locator,
    /// Search field
    pub search_input: Locator,
    /// Article heading
    pub article_heading: Locator,
    /// Random article link
    pub random_page_link: Locator,
    /// Main content area
    pub body_content: Locator,
}

impl Default for WebLocators {
    fn default() -> Self {
        Self {
            logo: Locator::id("p-logo"),
            search_input: Locator::id("searchInput"),
            article_heading: Locator::id("firstHeading"),
            random_page_link: Locator::id("n-randompage"),
            body_content: Locator::id("bodyContent"),
        }
    }
}

/// Locators used by the app page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppLocators {
    /// Search bar on the main screen
    pub search_container: Locator,
    /// Search text input
    pub search_input: Locator,
    /// First search result
    pub first_result: Locator,
    /// Toolbar back control
    pub navigate_up: Locator,
    /// Onboarding skip button
    pub onboarding_skip: Locator,
    /// Popup close button
    pub popup_close: Locator,
    /// Article title, tried first
    pub title_primary: Locator,
    /// Article title, tried when the primary locator yields nothing
    pub title_alternative: Locator,
}

impl Default for AppLocators {
    fn default() -> Self {
        let id = |name: &str| Locator::id(format!("{WIKIPEDIA_PACKAGE}:id/{name}"));
        Self {
            search_container: id("search_container"),
            search_input: id("search_src_text"),
            first_result: id("page_list_item_title"),
            navigate_up: Locator::accessibility_label("Navigate up"),
            onboarding_skip: id("fragment_onboarding_skip_button"),
            popup_close: id("closeButton"),
            title_primary: Locator::xpath("//android.widget.TextView[1]"),
            title_alternative: Locator::ui_automator(
                "new UiSelector().className(\"android.widget.TextView\").instance(0)",
            ),
        }
    }
}

/// Locator tables for both pages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorTables {
    /// Web page locators
    pub web: WebLocators,
    /// App page locators
    pub app: AppLocators,
}

fn default_implicit_wait() -> u64 {
    DEFAULT_WAIT_TIMEOUT_MS
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_dismiss_timeout() -> u64 {
    DEFAULT_DISMISS_TIMEOUT_MS
}

/// Pageflow configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageflowConfig {
    /// Application under test
    pub app_identity: AppIdentity,
    /// Automation server address; defaults per platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Element resolution timeout in milliseconds
    #[serde(default = "default_implicit_wait", alias = "implicit_wait")]
    pub implicit_wait_ms: u64,
    /// Delay between resolution probes in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// How long to look for transient overlays in milliseconds
    #[serde(default = "default_dismiss_timeout")]
    pub dismiss_timeout_ms: u64,
    /// Locator tables
    #[serde(default)]
    pub locators: LocatorTables,
    /// Extra capabilities merged into the session request
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capabilities: BTreeMap<String, Value>,
}

impl PageflowConfig {
    /// Configuration for an application identity with default timings
    #[must_use]
    pub fn new(app_identity: AppIdentity) -> Self {
        Self {
            app_identity,
            endpoint: None,
            implicit_wait_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            dismiss_timeout_ms: DEFAULT_DISMISS_TIMEOUT_MS,
            locators: LocatorTables::default(),
            capabilities: BTreeMap::new(),
        }
    }

    /// Preset for the Russian Wikipedia site in Chrome
    #[must_use]
    pub fn web() -> Self {
        let mut config = Self::new(AppIdentity::WebSite {
            base_url: "https://ru.wikipedia.org/".to_string(),
            main_page: Some("https://ru.wikipedia.org/wiki/Заглавная_страница".to_string()),
        });
        config.implicit_wait_ms = DEFAULT_WEB_WAIT_TIMEOUT_MS;
        config
    }

    /// Preset for the Wikipedia Android app on an emulator
    #[must_use]
    pub fn android_app() -> Self {
        let mut config = Self::new(AppIdentity::AndroidApp {
            package: WIKIPEDIA_PACKAGE.to_string(),
            activity: "org.wikipedia.main.MainActivity".to_string(),
        });
        config
            .capabilities
            .insert("appium:deviceName".to_string(), Value::from("Android Emulator"));
        config
    }

    /// Preset for a platform
    #[must_use]
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Browser => Self::web(),
            Platform::Android => Self::android_app(),
        }
    }

    /// Parse YAML and validate
    pub fn from_yaml_str(yaml: &str) -> PageflowResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file and validate
    pub fn from_file(path: impl AsRef<Path>) -> PageflowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> PageflowResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Backend family
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.app_identity.platform()
    }

    /// Effective automation server address
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(match self.platform() {
            Platform::Android => DEFAULT_APPIUM_ENDPOINT,
            Platform::Browser => DEFAULT_BROWSER_ENDPOINT,
        })
    }

    /// Set the endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the resolution timeout
    #[must_use]
    pub const fn with_implicit_wait_ms(mut self, implicit_wait_ms: u64) -> Self {
        self.implicit_wait_ms = implicit_wait_ms;
        self
    }

    /// Policy for required elements
    #[must_use]
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::from_millis(self.implicit_wait_ms, self.poll_interval_ms)
    }

    /// Policy for transient overlays
    #[must_use]
    pub fn dismiss_policy(&self) -> WaitPolicy {
        WaitPolicy::from_millis(self.dismiss_timeout_ms, self.poll_interval_ms)
    }

    /// Check timings and addresses
    pub fn validate(&self) -> PageflowResult<()> {
        if self.implicit_wait_ms == 0 {
            return Err(PageflowError::config("implicit_wait_ms must be greater than 0"));
        }
        if self.dismiss_timeout_ms == 0 {
            return Err(PageflowError::config("dismiss_timeout_ms must be greater than 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(PageflowError::config("poll_interval_ms must be greater than 0"));
        }
        if self.poll_interval_ms > self.implicit_wait_ms {
            return Err(PageflowError::config(format!(
                "poll_interval_ms ({}) exceeds implicit_wait_ms ({})",
                self.poll_interval_ms, self.implicit_wait_ms
            )));
        }
        require_http("endpoint", self.endpoint())?;
        match &self.app_identity {
            AppIdentity::AndroidApp { package, activity } => {
                if package.trim().is_empty() || activity.trim().is_empty() {
                    return Err(PageflowError::config(
                        "android_app needs a package and an activity",
                    ));
                }
            }
            AppIdentity::WebSite {
                base_url,
                main_page,
            } => {
                require_http("base_url", base_url)?;
                if let Some(main_page) = main_page {
                    require_http("main_page", main_page)?;
                }
            }
        }
        Ok(())
    }

    /// Apply `PAGEFLOW_ENDPOINT` and `PAGEFLOW_IMPLICIT_WAIT_MS`
    pub fn apply_env_overrides(&mut self) -> PageflowResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> PageflowResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = Some(endpoint);
        }
        if let Some(raw) = lookup(ENV_IMPLICIT_WAIT_MS) {
            self.implicit_wait_ms = raw.trim().parse().map_err(|_| {
                PageflowError::config(format!("{ENV_IMPLICIT_WAIT_MS} is not a number: {raw}"))
            })?;
        }
        self.validate()
    }
}

fn require_http(field: &str, url: &str) -> PageflowResult<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(PageflowError::config(format!(
            "{field} must be an http(s) URL, got '{url}'"
        )))
    }
}
