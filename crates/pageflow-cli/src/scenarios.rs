//! Built-in scenarios for the web site and the Android app

use crate::error::{CliError, CliResult};
use pageflow::{
    ArticleAppPage, ArticleWebPage, BackPath, FlowOutcome, PageCheck, PageflowConfig,
    PageflowResult, Platform, SearchState, Session, TitleRead,
};
use serde::Serialize;
use tracing::info;

/// Query for the web search scenario
pub const DEFAULT_WEB_QUERY: &str = "Россия";

/// Query for the app search scenario
pub const DEFAULT_APP_QUERY: &str = "Appium";

/// Query for the app back-navigation scenario
pub const DEFAULT_BACK_QUERY: &str = "Selenium";

/// A named check against one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Main page shows the logo and the content
    MainPageLoads,
    /// Searching an exact title opens that article
    SearchFindsArticle,
    /// The random-page link goes somewhere else
    RandomPageChangesLocation,
    /// The search field is visible and enabled
    SearchFieldAvailable,
    /// The search container shows after onboarding
    SearchFieldVisible,
    /// The first search result opens a matching article
    SearchOpensArticle,
    /// Back from an article returns to the main screen
    BackReturnsToMain,
}

/// How a scenario ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Passed, with a short note
    Pass(String),
    /// Failed, with the failing step or expectation
    Fail(String),
}

impl Verdict {
    /// Whether the scenario passed
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Pass(_))
    }

    /// Note or failure detail
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Pass(detail) | Self::Fail(detail) => detail,
        }
    }
}

impl Scenario {
    /// Every scenario, web first
    pub const ALL: [Self; 7] = [
        Self::MainPageLoads,
        Self::SearchFindsArticle,
        Self::RandomPageChangesLocation,
        Self::SearchFieldAvailable,
        Self::SearchFieldVisible,
        Self::SearchOpensArticle,
        Self::BackReturnsToMain,
    ];

    /// Command-line name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MainPageLoads => "main-page-loads",
            Self::SearchFindsArticle => "search-finds-article",
            Self::RandomPageChangesLocation => "random-page-changes-location",
            Self::SearchFieldAvailable => "search-field-available",
            Self::SearchFieldVisible => "search-field-visible",
            Self::SearchOpensArticle => "search-opens-article",
            Self::BackReturnsToMain => "back-returns-to-main",
        }
    }

    /// Target the scenario runs against
    #[must_use]
    pub const fn platform(self) -> Platform {
        match self {
            Self::MainPageLoads
            | Self::SearchFindsArticle
            | Self::RandomPageChangesLocation
            | Self::SearchFieldAvailable => Platform::Browser,
            Self::SearchFieldVisible | Self::SearchOpensArticle | Self::BackReturnsToMain => {
                Platform::Android
            }
        }
    }

    /// One-line description for `list`
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::MainPageLoads => "Main page shows the logo and the content",
            Self::SearchFindsArticle => "Searching an exact title opens that article",
            Self::RandomPageChangesLocation => "The random-page link changes the location",
            Self::SearchFieldAvailable => "The search field is visible and enabled",
            Self::SearchFieldVisible => "The search field shows after onboarding",
            Self::SearchOpensArticle => "The first result opens an article matching the query",
            Self::BackReturnsToMain => "Back from an article returns to the main screen",
        }
    }

    /// Query used when `--query` is not given
    #[must_use]
    pub const fn default_query(self) -> Option<&'static str> {
        match self {
            Self::SearchFindsArticle => Some(DEFAULT_WEB_QUERY),
            Self::SearchOpensArticle => Some(DEFAULT_APP_QUERY),
            Self::BackReturnsToMain => Some(DEFAULT_BACK_QUERY),
            _ => None,
        }
    }

    /// Scenarios for one target
    pub fn for_platform(platform: Platform) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |s| s.platform() == platform)
    }

    /// Look up a scenario by name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Scenarios to run: all of the target's, or the named one
    pub fn select(platform: Platform, name: Option<&str>) -> CliResult<Vec<Self>> {
        let Some(name) = name else {
            return Ok(Self::for_platform(platform).collect());
        };
        match Self::from_name(name) {
            Some(scenario) if scenario.platform() == platform => Ok(vec![scenario]),
            _ => {
                let available: Vec<_> = Self::for_platform(platform).map(Self::name).collect();
                Err(CliError::invalid_argument(format!(
                    "unknown scenario '{name}' for {platform}; available: {}",
                    available.join(", ")
                )))
            }
        }
    }

    /// Run the scenario on an open session
    pub async fn execute<S: Session + ?Sized>(
        self,
        session: &S,
        config: &PageflowConfig,
        query: Option<&str>,
    ) -> PageflowResult<Verdict> {
        let query = query.or_else(|| self.default_query()).unwrap_or_default();
        info!(scenario = self.name(), query, "running scenario");
        match self.platform() {
            Platform::Browser => self.execute_web(&ArticleWebPage::new(session, config)?, query).await,
            Platform::Android => self.execute_app(&ArticleAppPage::new(session, config), query).await,
        }
    }

    async fn execute_web<S: Session + ?Sized>(
        self,
        page: &ArticleWebPage<'_, S>,
        query: &str,
    ) -> PageflowResult<Verdict> {
        if let PageCheck::Missing { locator, outcome } = page.open_main_page().await? {
            return Ok(Verdict::Fail(format!("main page: {locator} {outcome}")));
        }

        match self {
            Self::SearchFindsArticle => {
                if let FlowOutcome::Failed(failure) = page.search(query).await? {
                    return Ok(Verdict::Fail(failure.to_string()));
                }
                Ok(match page.article_title().await? {
                    TitleRead::Title(title) if title == query => {
                        Verdict::Pass(format!("opened '{title}'"))
                    }
                    TitleRead::Title(title) => {
                        Verdict::Fail(format!("expected title '{query}', got '{title}'"))
                    }
                    other => Verdict::Fail(format!("article title {other}")),
                })
            }
            Self::RandomPageChangesLocation => {
                let change = page.open_random_page().await?;
                Ok(if change.changed() {
                    Verdict::Pass(format!("{} -> {}", change.before, change.after))
                } else if change.outcome.is_success() {
                    Verdict::Fail(format!("location stayed at {}", change.before))
                } else {
                    Verdict::Fail(format!("random page link: {}", change.outcome))
                })
            }
            Self::SearchFieldAvailable => {
                let outcome = page.search_field_available().await?;
                Ok(expect_success("search field", &outcome))
            }
            _ => Ok(Verdict::Pass("logo and content visible".to_string())),
        }
    }

    async fn execute_app<S: Session + ?Sized>(
        self,
        page: &ArticleAppPage<'_, S>,
        query: &str,
    ) -> PageflowResult<Verdict> {
        if self == Self::SearchFieldVisible {
            let outcome = page.search_container_visible().await?;
            return Ok(expect_success("search container", &outcome));
        }

        match page.search_and_open(query).await? {
            FlowOutcome::Completed(SearchState::ArticleOpen) => {}
            FlowOutcome::Completed(state) => {
                return Ok(Verdict::Fail(format!("search stopped in {state}")));
            }
            FlowOutcome::Failed(failure) => return Ok(Verdict::Fail(failure.to_string())),
        }
        let title = page.article_title().await?;

        if self == Self::SearchOpensArticle {
            return Ok(match title {
                TitleRead::Title(title) if title.to_lowercase().contains(&query.to_lowercase()) => {
                    Verdict::Pass(format!("opened '{title}'"))
                }
                TitleRead::Title(title) => {
                    Verdict::Fail(format!("title '{title}' does not mention '{query}'"))
                }
                other => Verdict::Fail(format!("article title {other}")),
            });
        }

        info!(title = title.as_str().unwrap_or("<absent>"), "article before going back");
        let back = page.navigate_back().await?;
        let path = match back.path {
            BackPath::Control => "back control",
            BackPath::SessionBack => "session back",
        };
        if !back.outcome.is_success() {
            return Ok(Verdict::Fail(format!("{path}: {}", back.outcome)));
        }
        let outcome = page.search_container_visible().await?;
        Ok(match expect_success("search container", &outcome) {
            Verdict::Pass(_) => Verdict::Pass(format!("returned via {path}")),
            fail => fail,
        })
    }
}

fn expect_success(what: &str, outcome: &pageflow::ActionOutcome) -> Verdict {
    if outcome.is_success() {
        Verdict::Pass(format!("{what} ready"))
    } else {
        Verdict::Fail(format!("{what}: {outcome}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pageflow::{AppLocators, MockElement, MockSession, WebLocators};
    use std::time::Duration;

    fn web_config() -> PageflowConfig {
        let mut config = PageflowConfig::web().with_implicit_wait_ms(1_000);
        config.poll_interval_ms = 100;
        config
    }

    fn app_config() -> PageflowConfig {
        let mut config = PageflowConfig::android_app().with_implicit_wait_ms(1_000);
        config.poll_interval_ms = 100;
        config.dismiss_timeout_ms = 300;
        config
    }

    fn web_site(heading: &str) -> MockSession {
        let l = WebLocators::default();
        MockSession::new(Platform::Browser)
            .with_location("https://ru.wikipedia.org/wiki/")
            .with_element(MockElement::new(l.logo))
            .with_element(MockElement::new(l.body_content))
            .with_element(MockElement::new(l.search_input))
            .with_element(MockElement::new(l.article_heading).with_text(heading))
            .with_element(
                MockElement::new(l.random_page_link)
                    .navigates_to("https://ru.wikipedia.org/wiki/Random"),
            )
    }

    fn app_screen(title: &str) -> MockSession {
        let l = AppLocators::default();
        MockSession::new(Platform::Android)
            .with_location(".main.MainActivity")
            .with_element(MockElement::new(l.search_container))
            .with_element(MockElement::new(l.search_input))
            .with_element(
                MockElement::new(l.first_result)
                    .appears_after(Duration::from_millis(300))
                    .navigates_to(".page.PageActivity"),
            )
            .with_element(MockElement::new(l.title_primary).with_text(title))
    }

    mod catalog_tests {
        use super::*;

        #[test]
        fn test_names_are_unique() {
            let mut names: Vec<_> = Scenario::ALL.iter().map(|s| s.name()).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), Scenario::ALL.len());
        }

        #[test]
        fn test_per_platform() {
            assert_eq!(Scenario::for_platform(Platform::Browser).count(), 4);
            assert_eq!(Scenario::for_platform(Platform::Android).count(), 3);
        }

        #[test]
        fn test_from_name() {
            assert_eq!(
                Scenario::from_name("back-returns-to-main"),
                Some(Scenario::BackReturnsToMain)
            );
            assert_eq!(Scenario::from_name("nope"), None);
        }

        #[test]
        fn test_select_rejects_other_target() {
            let err = Scenario::select(Platform::Browser, Some("search-opens-article")).unwrap_err();
            assert!(err.to_string().contains("main-page-loads"));
        }

        #[test]
        fn test_select_all() {
            let all = Scenario::select(Platform::Android, None).unwrap();
            assert_eq!(all.first(), Some(&Scenario::SearchFieldVisible));
        }
    }

    mod web_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_search_finds_article() {
            let session = web_site("Россия");
            let verdict = Scenario::SearchFindsArticle
                .execute(&session, &web_config(), None)
                .await
                .unwrap();
            assert_eq!(verdict, Verdict::Pass("opened 'Россия'".to_string()));
        }

        #[tokio::test(start_paused = true)]
        async fn test_search_title_mismatch_fails() {
            let session = web_site("Россия");
            let verdict = Scenario::SearchFindsArticle
                .execute(&session, &web_config(), Some("Франция"))
                .await
                .unwrap();
            assert!(!verdict.passed());
            assert!(verdict.detail().contains("Франция"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_logo_fails_before_scenario() {
            let l = WebLocators::default();
            let session = MockSession::new(Platform::Browser)
                .with_element(MockElement::new(l.body_content));
            let verdict = Scenario::SearchFieldAvailable
                .execute(&session, &web_config(), None)
                .await
                .unwrap();
            assert_eq!(
                verdict,
                Verdict::Fail("main page: id=p-logo not found".to_string())
            );
            assert!(!session.was_called("find:id=searchInput"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_random_page() {
            let session = web_site("Россия");
            let verdict = Scenario::RandomPageChangesLocation
                .execute(&session, &web_config(), None)
                .await
                .unwrap();
            assert!(verdict.passed());
            assert!(verdict.detail().ends_with("/wiki/Random"));
        }
    }

    mod app_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_search_opens_matching_article() {
            let session = app_screen("Appium (software)");
            let verdict = Scenario::SearchOpensArticle
                .execute(&session, &app_config(), None)
                .await
                .unwrap();
            assert!(verdict.passed(), "{verdict:?}");
        }

        #[tokio::test(start_paused = true)]
        async fn test_search_without_results_reports_step() {
            let l = AppLocators::default();
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(l.search_container))
                .with_element(MockElement::new(l.search_input));
            let verdict = Scenario::SearchOpensArticle
                .execute(&session, &app_config(), None)
                .await
                .unwrap();
            assert!(verdict.detail().contains("show results"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_unreadable_title_fails_with_cause() {
            let l = AppLocators::default();
            let session = MockSession::new(Platform::Android)
                .with_element(MockElement::new(l.search_container))
                .with_element(MockElement::new(l.search_input))
                .with_element(MockElement::new(l.first_result))
                .with_element(MockElement::new(l.title_primary).failing_reads(2));
            let verdict = Scenario::SearchOpensArticle
                .execute(&session, &app_config(), None)
                .await
                .unwrap();
            assert!(verdict.detail().starts_with("article title unreadable"), "{verdict:?}");
        }

        #[tokio::test(start_paused = true)]
        async fn test_back_returns_to_main() {
            let session = app_screen("Selenium");
            let verdict = Scenario::BackReturnsToMain
                .execute(&session, &app_config(), None)
                .await
                .unwrap();
            assert_eq!(verdict, Verdict::Pass("returned via session back".to_string()));
            assert_eq!(session.current_location().await.unwrap(), ".main.MainActivity");
        }

        #[tokio::test(start_paused = true)]
        async fn test_web_scenario_rejects_app_config() {
            let session = MockSession::new(Platform::Browser);
            let result = Scenario::MainPageLoads
                .execute(&session, &app_config(), None)
                .await;
            assert!(result.is_err());
        }
    }
}
