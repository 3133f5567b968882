//! Article search on the Android application

use tracing::info;

use crate::action::{Action, ActionExecutor, ActionOutcome, Dismissal};
use crate::config::{AppLocators, PageflowConfig};
use crate::flow::{self, BackNavigation, BackPath, FlowHalt, FlowOutcome, FlowRun, SearchState, TitleRead};
use crate::result::PageflowResult;
use crate::session::Session;
use crate::wait::Readiness;

/// Main screen and article screen of the encyclopedia app
#[derive(Debug)]
pub struct ArticleAppPage<'s, S: Session + ?Sized> {
    session: &'s S,
    locators: AppLocators,
    executor: ActionExecutor,
}

impl<'s, S: Session + ?Sized> ArticleAppPage<'s, S> {
    /// Page with the configured locators and wait policies
    #[must_use]
    pub fn new(session: &'s S, config: &PageflowConfig) -> Self {
        Self::with_locators(
            session,
            config.locators.app.clone(),
            ActionExecutor::new(config.wait_policy(), config.dismiss_policy()),
        )
    }

    /// Page with explicit locators and executor
    #[must_use]
    pub const fn with_locators(session: &'s S, locators: AppLocators, executor: ActionExecutor) -> Self {
        Self {
            session,
            locators,
            executor,
        }
    }

    /// Skip the onboarding screen if it is showing
    pub async fn dismiss_onboarding(&self) -> PageflowResult<Dismissal> {
        self.executor
            .dismiss_if_present(self.session, &self.locators.onboarding_skip)
            .await
    }

    /// Close a popup if one is showing
    pub async fn dismiss_popup(&self) -> PageflowResult<Dismissal> {
        self.executor
            .dismiss_if_present(self.session, &self.locators.popup_close)
            .await
    }

    /// Whether the search container is visible on the main screen
    pub async fn search_container_visible(&self) -> PageflowResult<ActionOutcome> {
        self.dismiss_onboarding().await?;
        self.executor
            .await_element(self.session, &self.locators.search_container, Readiness::Visible)
            .await
    }

    /// Search for `query` and open the first result
    pub async fn search_and_open(&self, query: &str) -> PageflowResult<FlowOutcome<SearchState>> {
        let mut run = FlowRun::start("app_search_and_open", SearchState::Idle);
        let body = self.search_steps(&mut run, query).await;
        run.finish(body)
    }

    async fn search_steps(
        &self,
        run: &mut FlowRun<SearchState>,
        query: &str,
    ) -> Result<(), FlowHalt<SearchState>> {
        let (session, locators) = (self.session, &self.locators);
        self.dismiss_onboarding().await?;

        let opened = self
            .executor
            .perform(session, &locators.search_container, &Action::Click)
            .await?;
        run.require("open search", opened, SearchState::SearchBoxReady)?;

        let typed = self
            .executor
            .perform(session, &locators.search_input, &Action::type_text(query))
            .await?;
        run.require("type query", typed, SearchState::QueryEntered)?;

        let listed = self
            .executor
            .await_element(session, &locators.first_result, Readiness::Visible)
            .await?;
        run.require("show results", listed, SearchState::ResultsShown)?;

        let clicked = self
            .executor
            .perform(session, &locators.first_result, &Action::Click)
            .await?;
        run.require("open first result", clicked, SearchState::ArticleOpen)?;

        self.dismiss_popup().await?;
        Ok(())
    }

    /// Title of the open article
    pub async fn article_title(&self) -> PageflowResult<TitleRead> {
        self.dismiss_popup().await?;
        flow::read_first_text(
            &self.executor,
            self.session,
            &self.locators.title_primary,
            &self.locators.title_alternative,
        )
        .await
    }

    /// Go back to the previous screen
    pub async fn navigate_back(&self) -> PageflowResult<BackNavigation> {
        let back = flow::navigate_back(&self.executor, self.session, &self.locators.navigate_up).await?;
        if back.path == BackPath::Control && back.outcome.is_success() {
            self.dismiss_popup().await?;
        }
        info!(path = ?back.path, outcome = %back.outcome, "navigated back");
        Ok(back)
    }

    /// Current activity
    pub async fn current_screen(&self) -> PageflowResult<String> {
        self.session.current_location().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Platform;
    use crate::mock::{MockElement, MockSession};
    use std::time::Duration;

    fn config() -> PageflowConfig {
        let mut config = PageflowConfig::android_app().with_implicit_wait_ms(1_000);
        config.poll_interval_ms = 100;
        config.dismiss_timeout_ms = 300;
        config
    }

    fn locators() -> AppLocators {
        AppLocators::default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_container_after_onboarding() {
        let l = locators();
        let session = MockSession::new(Platform::Android)
            .with_element(MockElement::new(l.onboarding_skip.clone()).dismissed_on_click())
            .with_element(MockElement::new(l.search_container.clone()));
        let page = ArticleAppPage::new(&session, &config());

        assert_eq!(page.search_container_visible().await.unwrap(), ActionOutcome::Success);
        assert!(session.was_called(&format!("click:{}", l.onboarding_skip)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_results_appear_late() {
        let l = locators();
        let session = MockSession::new(Platform::Android)
            .with_location(".main.MainActivity")
            .with_element(MockElement::new(l.search_container.clone()))
            .with_element(MockElement::new(l.search_input.clone()))
            .with_element(
                MockElement::new(l.first_result.clone())
                    .appears_after(Duration::from_millis(600))
                    .navigates_to(".page.PageActivity"),
            );
        let page = ArticleAppPage::new(&session, &config());

        let outcome = page.search_and_open("Appium").await.unwrap();

        assert_eq!(outcome, FlowOutcome::Completed(SearchState::ArticleOpen));
        assert_eq!(page.current_screen().await.unwrap(), ".page.PageActivity");
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_uses_control_then_checks_popup() {
        let l = locators();
        let session = MockSession::new(Platform::Android)
            .with_element(MockElement::new(l.navigate_up.clone()));
        let page = ArticleAppPage::new(&session, &config());

        let back = page.navigate_back().await.unwrap();

        assert_eq!(back.path, BackPath::Control);
        assert!(session.was_called(&format!("find:{}", l.popup_close)));
    }
}
