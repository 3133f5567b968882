//! Pageflow CLI Library
//!
//! Command-line interface for running the built-in page-object scenarios
//! against a W3C browser driver or an Appium server.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;
mod scenarios;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ListArgs, RunArgs, SummaryFormat, TargetArg,
};
pub use config::{load_target_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::{RunSummary, ScenarioResult, ScenarioRunner};
pub use scenarios::{
    Scenario, Verdict, DEFAULT_APP_QUERY, DEFAULT_BACK_QUERY, DEFAULT_WEB_QUERY,
};
