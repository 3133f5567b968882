//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use pageflow::Platform;
use std::path::PathBuf;

/// Pageflow: run resilient page-object scenarios against a browser driver or Appium
#[derive(Parser, Debug)]
#[command(name = "pageflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List scenarios per target
    List(ListArgs),

    /// Run scenarios against a live automation server
    Run(RunArgs),

    /// Show the effective configuration as YAML
    Config(ConfigArgs),
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only list scenarios for this target
    #[arg(short, long)]
    pub target: Option<TargetArg>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Application under test
    pub target: TargetArg,

    /// Run a single scenario by name
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// Configuration file (YAML)
    #[arg(short, long, env = "PAGEFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Automation server address
    #[arg(short, long, env = "PAGEFLOW_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Search query for the search scenarios
    #[arg(long)]
    pub query: Option<String>,

    /// Output format for the summary
    #[arg(short, long, default_value = "text")]
    pub format: SummaryFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Application whose preset is shown
    #[arg(short, long, default_value = "web")]
    pub target: TargetArg,

    /// Configuration file (YAML) to load instead of the preset
    #[arg(short, long, env = "PAGEFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Automation server address
    #[arg(short, long, env = "PAGEFLOW_ENDPOINT")]
    pub endpoint: Option<String>,
}

/// Application under test
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetArg {
    /// Encyclopedia web site through a browser driver
    Web,
    /// Encyclopedia Android app through Appium
    App,
}

impl TargetArg {
    /// All targets in listing order
    pub const ALL: [Self; 2] = [Self::Web, Self::App];

    /// Name used on the command line
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::App => "app",
        }
    }
}

impl From<TargetArg> for Platform {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Web => Self::Browser,
            TargetArg::App => Self::Android,
        }
    }
}

/// Summary output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON document on stdout
    Json,
    /// YAML document on stdout
    Yaml,
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_list_command() {
            let cli = Cli::parse_from(["pageflow", "list"]);
            assert!(matches!(cli.command, Commands::List(ListArgs { target: None })));
        }

        #[test]
        fn test_parse_run_command() {
            let cli = Cli::parse_from([
                "pageflow",
                "run",
                "app",
                "--scenario",
                "search-opens-article",
                "--endpoint",
                "http://127.0.0.1:4723",
                "--query",
                "Rust",
            ]);
            let Commands::Run(args) = cli.command else {
                panic!("expected run command");
            };
            assert_eq!(args.target, TargetArg::App);
            assert_eq!(args.scenario.as_deref(), Some("search-opens-article"));
            assert_eq!(args.endpoint.as_deref(), Some("http://127.0.0.1:4723"));
            assert_eq!(args.query.as_deref(), Some("Rust"));
            assert_eq!(args.format, SummaryFormat::Text);
        }

        #[test]
        fn test_run_requires_target() {
            assert!(Cli::try_parse_from(["pageflow", "run"]).is_err());
        }

        #[test]
        fn test_config_defaults_to_web() {
            let cli = Cli::parse_from(["pageflow", "config"]);
            let Commands::Config(args) = cli.command else {
                panic!("expected config command");
            };
            assert_eq!(args.target, TargetArg::Web);
        }

        #[test]
        fn test_global_flags() {
            let cli = Cli::parse_from(["pageflow", "list", "-vv", "--color", "never"]);
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.color, ColorArg::Never));
        }
    }

    mod target_tests {
        use super::*;

        #[test]
        fn test_target_platform() {
            assert_eq!(Platform::from(TargetArg::Web), Platform::Browser);
            assert_eq!(Platform::from(TargetArg::App), Platform::Android);
        }

        #[test]
        fn test_target_names() {
            let names: Vec<_> = TargetArg::ALL.iter().map(|t| t.name()).collect();
            assert_eq!(names, vec!["web", "app"]);
        }
    }
}
