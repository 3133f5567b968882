//! Pageflow CLI: run page-object scenarios against live automation servers
//!
//! ## Usage
//!
//! ```bash
//! pageflow list                               # List scenarios per target
//! pageflow run web                            # Run every web scenario
//! pageflow run app --scenario search-opens-article --query Rust
//! pageflow config --target app                # Print the effective configuration
//! ```

use clap::Parser;
use pageflow::{Platform, WebDriverSession};
use pageflow_cli::{
    load_target_config, Cli, CliConfig, CliResult, ColorChoice, Commands, ConfigArgs, ListArgs,
    RunArgs, Scenario, ScenarioRunner, TargetArg, Verbosity,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match cli.command {
        Commands::List(args) => {
            run_list(&args);
            Ok(())
        }
        Commands::Run(args) => run_scenarios(&config, &args),
        Commands::Config(args) => run_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `-v`/`-q`.
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_list(args: &ListArgs) {
    let targets = args
        .target
        .map_or_else(|| TargetArg::ALL.to_vec(), |target| vec![target]);
    for target in targets {
        println!("{}:", target.name());
        for scenario in Scenario::for_platform(target.into()) {
            println!("  {:<30} {}", scenario.name(), scenario.description());
        }
    }
}

fn run_scenarios(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let platform = Platform::from(args.target);
    let scenarios = Scenario::select(platform, args.scenario.as_deref())?;
    let session_config =
        load_target_config(platform, args.config.as_deref(), args.endpoint.as_deref())?;

    let runtime = tokio::runtime::Runtime::new()?;
    let mut runner =
        ScenarioRunner::new(session_config.clone(), config).with_query(args.query.clone());
    let summary = runtime.block_on(
        runner.run(&scenarios, || WebDriverSession::connect(&session_config)),
    );

    if let Some(rendered) = summary.render(args.format)? {
        println!("{rendered}");
    }
    summary.into_result().map(|_| ())
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let config = load_target_config(
        args.target.into(),
        args.config.as_deref(),
        args.endpoint.as_deref(),
    )?;
    print!("{}", config.to_yaml()?);
    Ok(())
}
