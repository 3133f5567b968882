//! W3C WebDriver session over HTTP
//!
//! One implementation covers both backends, since chromedriver and Appium (UiAutomator2)
//! speak the same protocol. The session sets the backend's implicit wait to zero: the
//! resolver does all waiting.
//!
//! Error mapping:
//!
//! | W3C error                                   | Pageflow                     |
//! |---------------------------------------------|------------------------------|
//! | `no such element` (lookup)                  | absence (`Ok(None)`)         |
//! | `no such element`, `stale element reference`| [`PageflowError::StaleElement`] |
//! | `element not interactable`, `element click intercepted`, `invalid element state` | [`PageflowError::ActionRejected`] |
//! | `invalid selector`                          | [`PageflowError::InvalidLocator`] |
//! | anything else, transport failures           | session fault                |

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{AppIdentity, PageflowConfig};
use crate::locator::{Locator, Platform};
use crate::result::{PageflowError, PageflowResult};
use crate::session::{ElementHandle, Session};

/// W3C web element identifier key
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4cc0ff0ad2c5";

/// Legacy JSON Wire element key, still returned by some Appium drivers
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// Per-request timeout; session creation on an emulator is slow
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Session against a W3C WebDriver endpoint
#[derive(Debug)]
pub struct WebDriverSession {
    client: reqwest::Client,
    endpoint: String,
    session_id: String,
    platform: Platform,
    closed: bool,
}

impl WebDriverSession {
    /// Create a session for the configured application.
    ///
    /// Web sessions open the site's base URL before returning.
    pub async fn connect(config: &PageflowConfig) -> PageflowResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let endpoint = config.endpoint().trim_end_matches('/').to_string();

        info!(%endpoint, platform = %config.platform(), "creating WebDriver session");
        let body = json!({ "capabilities": { "alwaysMatch": capabilities(config) } });
        let url = format!("{endpoint}/session");
        let response = send(&client, Method::POST, &url, Some(body), Subject::Session).await?;
        let session_id = session_id(&response)
            .ok_or_else(|| PageflowError::session("session response carried no sessionId"))?;

        let session = Self {
            client,
            endpoint,
            session_id,
            platform: config.platform(),
            closed: false,
        };
        session
            .command(Method::POST, "/timeouts", Some(json!({ "implicit": 0 })), Subject::Session)
            .await?;
        if let AppIdentity::WebSite { base_url, .. } = &config.app_identity {
            session.navigate_to(base_url).await?;
        }
        info!(session_id = %session.session_id, "WebDriver session ready");
        Ok(session)
    }

    /// Attach to an existing session
    #[must_use]
    pub fn attach(endpoint: &str, session_id: impl Into<String>, platform: Platform) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            session_id: session_id.into(),
            platform,
            closed: false,
        }
    }

    /// Backend session id
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// URL of a session-relative command
    #[must_use]
    pub fn command_url(&self, path: &str) -> String {
        format!("{}/session/{}{path}", self.endpoint, self.session_id)
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        subject: Subject<'_>,
    ) -> PageflowResult<Value> {
        if self.closed {
            return Err(PageflowError::SessionClosed);
        }
        debug!(%method, path, "webdriver command");
        send(&self.client, method, &self.command_url(path), body, subject).await
    }

    async fn element_command(
        &self,
        method: Method,
        element: &ElementHandle,
        action: &str,
        body: Option<Value>,
    ) -> PageflowResult<Value> {
        let path = format!("/element/{}/{action}", element.id());
        self.command(method, &path, body, Subject::Element(element.id()))
            .await
    }
}

/// What a command was about, for error mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject<'a> {
    /// Element lookup by a displayed locator
    Lookup(&'a str),
    /// Command on an element id
    Element(&'a str),
    /// Session-level command
    Session,
}

/// Send one request and unwrap the W3C `value` envelope
async fn send(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
    subject: Subject<'_>,
) -> PageflowResult<Value> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    let payload: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text)?
    };
    let value = payload.get("value").cloned().unwrap_or(payload);

    if status.is_success() && value.get("error").is_none() {
        return Ok(value);
    }
    let code = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let message = value.get("message").and_then(Value::as_str).unwrap_or("");
    Err(classify(code, message, subject))
}

/// Map a W3C error code onto the error taxonomy
pub fn classify(code: &str, message: &str, subject: Subject<'_>) -> PageflowError {
    let detail = if message.is_empty() {
        code.to_string()
    } else {
        format!("{code}: {message}")
    };
    match (code, subject) {
        ("no such element", Subject::Lookup(locator)) => PageflowError::ElementNotFound {
            locator: locator.to_string(),
        },
        ("no such element" | "stale element reference", Subject::Element(element_id)) => {
            PageflowError::StaleElement {
                element_id: element_id.to_string(),
            }
        }
        ("element not interactable" | "element click intercepted" | "invalid element state", _) => {
            PageflowError::action_rejected(detail)
        }
        ("invalid selector", Subject::Lookup(locator)) => PageflowError::InvalidLocator {
            locator: locator.to_string(),
            message: detail,
        },
        _ => PageflowError::session(detail),
    }
}

/// `alwaysMatch` capabilities for the configured application
#[must_use]
pub fn capabilities(config: &PageflowConfig) -> Map<String, Value> {
    let mut caps = Map::new();
    match &config.app_identity {
        AppIdentity::AndroidApp { package, activity } => {
            caps.insert("platformName".to_string(), json!("Android"));
            caps.insert("appium:automationName".to_string(), json!("UiAutomator2"));
            caps.insert("appium:appPackage".to_string(), json!(package));
            caps.insert("appium:appActivity".to_string(), json!(activity));
            caps.insert("appium:noReset".to_string(), json!(false));
        }
        AppIdentity::WebSite { .. } => {
            caps.insert("browserName".to_string(), json!("chrome"));
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--start-maximized", "--disable-notifications"] }),
            );
        }
    }
    for (key, value) in &config.capabilities {
        caps.insert(key.clone(), value.clone());
    }
    caps
}

fn session_id(response: &Value) -> Option<String> {
    response
        .get("sessionId")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn element_id(value: &Value) -> Option<String> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn as_bool(value: &Value, what: &str) -> PageflowResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| PageflowError::session(format!("{what} returned {value}")))
}

fn as_string(value: Value, what: &str) -> PageflowResult<String> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(PageflowError::session(format!("{what} returned {other}"))),
    }
}

#[async_trait]
impl Session for WebDriverSession {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn find_element(&self, locator: &Locator) -> PageflowResult<Option<ElementHandle>> {
        let strategy = locator.strategy(self.platform)?;
        let body = json!({ "using": strategy.using, "value": strategy.value });
        let shown = locator.to_string();
        match self
            .command(Method::POST, "/element", Some(body), Subject::Lookup(&shown))
            .await
        {
            Ok(value) => Ok(element_id(&value).map(|id| ElementHandle::new(id, locator.clone()))),
            Err(PageflowError::ElementNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn is_displayed(&self, element: &ElementHandle) -> PageflowResult<bool> {
        let value = self
            .element_command(Method::GET, element, "displayed", None)
            .await?;
        as_bool(&value, "displayed")
    }

    async fn is_enabled(&self, element: &ElementHandle) -> PageflowResult<bool> {
        let value = self
            .element_command(Method::GET, element, "enabled", None)
            .await?;
        as_bool(&value, "enabled")
    }

    async fn text(&self, element: &ElementHandle) -> PageflowResult<String> {
        let value = self.element_command(Method::GET, element, "text", None).await?;
        as_string(value, "text")
    }

    async fn click(&self, element: &ElementHandle) -> PageflowResult<()> {
        self.element_command(Method::POST, element, "click", Some(json!({})))
            .await
            .map(drop)
    }

    async fn send_text(&self, element: &ElementHandle, text: &str) -> PageflowResult<()> {
        self.element_command(Method::POST, element, "value", Some(json!({ "text": text })))
            .await
            .map(drop)
    }

    async fn clear(&self, element: &ElementHandle) -> PageflowResult<()> {
        self.element_command(Method::POST, element, "clear", Some(json!({})))
            .await
            .map(drop)
    }

    async fn current_location(&self) -> PageflowResult<String> {
        let path = match self.platform {
            Platform::Browser => "/url",
            Platform::Android => "/appium/device/current_activity",
        };
        let value = self.command(Method::GET, path, None, Subject::Session).await?;
        as_string(value, "current location")
    }

    async fn navigate_to(&self, url: &str) -> PageflowResult<()> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })), Subject::Session)
            .await
            .map(drop)
    }

    async fn navigate_back(&self) -> PageflowResult<()> {
        self.command(Method::POST, "/back", Some(json!({})), Subject::Session)
            .await
            .map(drop)
    }

    async fn close(&mut self) -> PageflowResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.command(Method::DELETE, "", None, Subject::Session).await;
        self.closed = true;
        info!(session_id = %self.session_id, "WebDriver session closed");
        result.map(drop)
    }
}
