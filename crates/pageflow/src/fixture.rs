//! Scoped session teardown
//!
//! A [`SessionFixture`] owns one session for one scenario and guarantees `close()` on
//! every exit path:
//!
//! - [`SessionFixture::run`] closes after the body succeeds, fails or panics.
//! - Dropping an unclosed fixture (a cancelled scenario) schedules `close()` on the
//!   current tokio runtime.
//!
//! The close scheduled by drop is detached. If the runtime shuts down before that task
//! is polled, the task is dropped and the remote session stays open until the server
//! reaps it. Callers that control their own cancellation (a `select!` arm, a shutdown
//! hook) should call [`SessionFixture::close`] before letting the fixture go.
//!
//! ```ignore
//! let fixture = SessionFixture::new("search", WebDriverSession::connect(&config).await?);
//! let title = fixture
//!     .run(|session| async move { ArticleWebPage::new(session, &config).article_title().await }.boxed())
//!     .await?;
//! ```

use futures::future::{BoxFuture, FutureExt};
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

use crate::result::{PageflowError, PageflowResult};
use crate::session::Session;

/// Owns a session and closes it when the scenario ends
///
/// Dropping an open fixture only schedules `close()`; it does not wait for it. Await
/// [`SessionFixture::close`] when the runtime may stop right after the fixture does.
pub struct SessionFixture<S: Session + 'static> {
    name: String,
    session: Option<S>,
}

impl<S: Session + 'static> std::fmt::Debug for SessionFixture<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFixture")
            .field("name", &self.name)
            .field("open", &self.session.is_some())
            .finish()
    }
}

impl<S: Session + 'static> SessionFixture<S> {
    /// Take ownership of an open session
    #[must_use]
    pub fn new(name: impl Into<String>, session: S) -> Self {
        Self {
            name: name.into(),
            session: Some(session),
        }
    }

    /// Fixture name, used in logs
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the session is still open
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Borrow the session
    pub fn session(&self) -> PageflowResult<&S> {
        self.session.as_ref().ok_or(PageflowError::SessionClosed)
    }

    /// Run `body` against the session, then close it.
    ///
    /// The body's error takes precedence over a teardown error. A panic in the body is
    /// resumed after the session is closed.
    pub async fn run<T, F>(mut self, body: F) -> PageflowResult<T>
    where
        F: for<'s> FnOnce(&'s S) -> BoxFuture<'s, PageflowResult<T>>,
    {
        let session = self.session()?;
        let result = AssertUnwindSafe(body(session)).catch_unwind().await;
        let closed = self.close().await;
        match result {
            Ok(Ok(value)) => closed.map(|()| value),
            Ok(Err(error)) => {
                if let Err(teardown) = closed {
                    warn!(fixture = %self.name, error = %teardown, "teardown failed after scenario error");
                }
                Err(error)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Close the session now; later calls are no-ops
    pub async fn close(&mut self) -> PageflowResult<()> {
        match self.session.take() {
            Some(mut session) => {
                debug!(fixture = %self.name, "closing session");
                session.close().await
            }
            None => Ok(()),
        }
    }
}

impl<S: Session + 'static> Drop for SessionFixture<S> {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let name = std::mem::take(&mut self.name);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                // Lost if the runtime shuts down before this task is first polled.
                warn!(fixture = %name, "fixture dropped with open session, closing in background");
                drop(handle.spawn(async move {
                    if let Err(error) = session.close().await {
                        warn!(fixture = %name, %error, "background close failed");
                    }
                }));
            }
            Err(_) => warn!(fixture = %name, "fixture dropped outside a runtime, session leaked"),
        }
    }
}
