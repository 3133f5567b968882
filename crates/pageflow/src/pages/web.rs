//! Article search on the web site

use tracing::{debug, info};

use super::{LocationChange, PageCheck};
use crate::action::{Action, ActionExecutor, ActionOutcome};
use crate::config::{AppIdentity, PageflowConfig, WebLocators};
use crate::flow::{FlowHalt, FlowOutcome, FlowRun, SearchState, TitleRead};
use crate::locator::Locator;
use crate::result::{PageflowError, PageflowResult};
use crate::session::Session;
use crate::wait::Readiness;

/// Main page and article pages of the encyclopedia site
#[derive(Debug)]
pub struct ArticleWebPage<'s, S: Session + ?Sized> {
    session: &'s S,
    main_page_url: String,
    locators: WebLocators,
    executor: ActionExecutor,
}

impl<'s, S: Session + ?Sized> ArticleWebPage<'s, S> {
    /// Page for a web site configuration
    pub fn new(session: &'s S, config: &PageflowConfig) -> PageflowResult<Self> {
        let AppIdentity::WebSite {
            base_url,
            main_page,
        } = &config.app_identity
        else {
            return Err(PageflowError::config(
                "the web page needs a web_site app identity",
            ));
        };
        Ok(Self::with_locators(
            session,
            main_page.as_deref().unwrap_or(base_url),
            config.locators.web.clone(),
            ActionExecutor::new(config.wait_policy(), config.dismiss_policy()),
        ))
    }

    /// Page with explicit locators and executor
    #[must_use]
    pub fn with_locators(
        session: &'s S,
        main_page_url: &str,
        locators: WebLocators,
        executor: ActionExecutor,
    ) -> Self {
        Self {
            session,
            main_page_url: main_page_url.to_string(),
            locators,
            executor,
        }
    }

    /// Open the main page and check that the logo and the content are visible
    pub async fn open_main_page(&self) -> PageflowResult<PageCheck> {
        self.session.navigate_to(&self.main_page_url).await?;
        for landmark in [&self.locators.logo, &self.locators.body_content] {
            let outcome = self.visible(landmark).await?;
            if !outcome.is_success() {
                info!(%landmark, %outcome, "main page incomplete");
                return Ok(PageCheck::Missing {
                    locator: landmark.clone(),
                    outcome,
                });
            }
        }
        Ok(PageCheck::Loaded)
    }

    /// Search for `query`; an exact match opens the article directly
    pub async fn search(&self, query: &str) -> PageflowResult<FlowOutcome<SearchState>> {
        let mut run = FlowRun::start("web_search", SearchState::Idle);
        let body = self.search_steps(&mut run, query).await;
        run.finish(body)
    }

    async fn search_steps(
        &self,
        run: &mut FlowRun<SearchState>,
        query: &str,
    ) -> Result<(), FlowHalt<SearchState>> {
        let field = &self.locators.search_input;

        let cleared = self.executor.perform(self.session, field, &Action::Clear).await?;
        run.require("clear search field", cleared, SearchState::SearchBoxReady)?;

        let typed = self
            .executor
            .perform(self.session, field, &Action::type_text(query))
            .await?;
        run.require("type query", typed, SearchState::QueryEntered)?;

        let submitted = self.executor.perform(self.session, field, &Action::Submit).await?;
        run.check("submit query", submitted)?;

        let heading = self.visible(&self.locators.article_heading).await?;
        run.require("show article", heading, SearchState::ArticleOpen)?;
        Ok(())
    }

    /// Heading of the open article, trimmed; `Unreadable` when the heading exists but its text read fails
    pub async fn article_title(&self) -> PageflowResult<TitleRead> {
        let policy = *self.executor.resolver().policy();
        let read = self
            .executor
            .read_text(self.session, &self.locators.article_heading, &policy)
            .await?;
        let title = TitleRead::from_read(read, |text| text.trim().to_string());
        if title.as_str().is_none() {
            debug!(%title, "article heading unavailable");
        }
        Ok(title)
    }

    /// Follow the random-page link and wait for the new content
    pub async fn open_random_page(&self) -> PageflowResult<LocationChange> {
        let before = self.session.current_location().await?;
        let mut outcome = self
            .executor
            .perform(self.session, &self.locators.random_page_link, &Action::Click)
            .await?;
        if outcome.is_success() {
            outcome = self.visible(&self.locators.body_content).await?;
        }
        let after = self.session.current_location().await?;
        info!(%before, %after, %outcome, "random page");
        Ok(LocationChange {
            outcome,
            before,
            after,
        })
    }

    /// Whether the search field is visible and enabled
    pub async fn search_field_available(&self) -> PageflowResult<ActionOutcome> {
        self.executor
            .await_element(self.session, &self.locators.search_input, Readiness::Interactable)
            .await
    }

    async fn visible(&self, locator: &Locator) -> PageflowResult<ActionOutcome> {
        self.executor
            .await_element(self.session, locator, Readiness::Visible)
            .await
    }
}
