//! Scenario runner

use crate::commands::SummaryFormat;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::scenarios::{Scenario, Verdict};
use futures::FutureExt;
use pageflow::{PageflowConfig, PageflowResult, Session, SessionFixture};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Scenario execution result
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Whether the scenario passed
    pub passed: bool,
    /// Pass note or failure detail
    pub detail: String,
    /// Wall-clock time in milliseconds
    pub duration_ms: u64,
}

impl ScenarioResult {
    /// Create a passing result
    #[must_use]
    pub fn pass(name: impl Into<String>, detail: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn fail(name: impl Into<String>, detail: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// Aggregated results of one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Target the scenarios ran against
    pub target: String,
    /// Automation server address
    pub endpoint: String,
    /// Individual results, in run order
    pub results: Vec<ScenarioResult>,
    /// Total wall-clock time in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Number of passed scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Number of failed scenarios
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Number of scenarios run
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Check if every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Ok when every scenario passed
    pub fn into_result(self) -> CliResult<Self> {
        if self.all_passed() {
            Ok(self)
        } else {
            Err(CliError::ScenariosFailed {
                failed: self.failed(),
                total: self.total(),
            })
        }
    }

    /// Machine-readable rendering; `None` for text, which the reporter already printed
    pub fn render(&self, format: SummaryFormat) -> CliResult<Option<String>> {
        match format {
            SummaryFormat::Text => Ok(None),
            SummaryFormat::Json => serde_json::to_string_pretty(self)
                .map(Some)
                .map_err(|e| CliError::report(e.to_string())),
            SummaryFormat::Yaml => serde_yaml_ng::to_string(self)
                .map(Some)
                .map_err(|e| CliError::report(e.to_string())),
        }
    }
}

/// Runs scenarios one after another, each in its own session
#[derive(Debug)]
pub struct ScenarioRunner {
    config: PageflowConfig,
    query: Option<String>,
    reporter: ProgressReporter,
}

impl ScenarioRunner {
    /// Create a runner for a session configuration
    #[must_use]
    pub fn new(config: PageflowConfig, cli: &CliConfig) -> Self {
        let reporter = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet());
        Self {
            config,
            query: None,
            reporter,
        }
    }

    /// Override the scenarios' search query
    #[must_use]
    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }

    /// Run `scenarios` in order; `open` starts a fresh session for each one.
    ///
    /// A session that cannot be opened fails that scenario only.
    pub async fn run<S, F, Fut>(&mut self, scenarios: &[Scenario], mut open: F) -> RunSummary
    where
        S: Session + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = PageflowResult<S>>,
    {
        let start = Instant::now();
        let mut summary = RunSummary {
            target: self.config.platform().to_string(),
            endpoint: self.config.endpoint().to_string(),
            ..RunSummary::default()
        };

        self.reporter
            .header(&format!("{} scenarios at {}", summary.target, summary.endpoint));

        for &scenario in scenarios {
            self.reporter.start_scenario(scenario.name());
            let result = self.run_one(scenario, open()).await;
            self.reporter.finish_scenario();

            if result.passed {
                self.reporter
                    .success(&format!("{} ({}ms) {}", result.name, result.duration_ms, result.detail));
            } else {
                self.reporter.failure(&format!("{}: {}", result.name, result.detail));
            }
            summary.results.push(result);
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        self.reporter.summary(
            summary.passed(),
            summary.failed(),
            Duration::from_millis(summary.duration_ms),
        );
        summary
    }

    async fn run_one<S, Fut>(&self, scenario: Scenario, opening: Fut) -> ScenarioResult
    where
        S: Session + 'static,
        Fut: Future<Output = PageflowResult<S>>,
    {
        let start = Instant::now();
        let config = self.config.clone();
        let query = self.query.clone();

        let verdict = match opening.await {
            Ok(session) => {
                SessionFixture::new(scenario.name(), session)
                    .run(move |session| {
                        async move { scenario.execute(session, &config, query.as_deref()).await }
                            .boxed()
                    })
                    .await
            }
            Err(e) => {
                warn!(scenario = scenario.name(), error = %e, "session did not open");
                Err(e)
            }
        };

        let duration = start.elapsed();
        let result = match verdict {
            Ok(Verdict::Pass(detail)) => ScenarioResult::pass(scenario.name(), detail, duration),
            Ok(Verdict::Fail(detail)) => ScenarioResult::fail(scenario.name(), detail, duration),
            Err(e) => ScenarioResult::fail(scenario.name(), e.to_string(), duration),
        };
        info!(
            scenario = scenario.name(),
            passed = result.passed,
            duration_ms = result.duration_ms,
            "scenario finished"
        );
        result
    }
}
