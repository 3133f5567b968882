//! CLI configuration

use crate::error::{CliError, CliResult};
use pageflow::{PageflowConfig, Platform};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - failures only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - step logs
    Verbose,
    /// Debug - every poll and wire command
    Debug,
    /// Trace - everything
    Trace,
}

impl Verbosity {
    /// Verbosity for a `-v` count, unless quiet
    #[must_use]
    pub const fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug | Self::Trace)
    }

    /// Default log filter when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Effective session configuration for a target.
///
/// Starts from `file` or the target's preset, then applies the environment
/// and finally the `--endpoint` flag. A file written for the other target is rejected.
pub fn load_target_config(
    target: Platform,
    file: Option<&Path>,
    endpoint: Option<&str>,
) -> CliResult<PageflowConfig> {
    let mut config = match file {
        Some(path) => PageflowConfig::from_file(path).map_err(|e| {
            CliError::config(format!("cannot load {}: {e}", path.display()))
        })?,
        None => PageflowConfig::for_platform(target),
    };
    if config.platform() != target {
        return Err(CliError::invalid_argument(format!(
            "configuration is for {} but the target is {target}",
            config.platform()
        )));
    }
    config.apply_env_overrides()?;
    if let Some(endpoint) = endpoint {
        config = config.with_endpoint(endpoint);
        config.validate()?;
    }
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(0, false), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(1, false), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(2, false), Verbosity::Debug);
            assert_eq!(Verbosity::from_flags(7, false), Verbosity::Trace);
            assert_eq!(Verbosity::from_flags(3, true), Verbosity::Quiet);
        }

        #[test]
        fn test_log_directive() {
            assert_eq!(Verbosity::Quiet.log_directive(), "error");
            assert_eq!(Verbosity::Normal.log_directive(), "warn");
            assert_eq!(Verbosity::Debug.log_directive(), "debug");
        }

        #[test]
        fn test_is_verbose() {
            assert!(!Verbosity::Normal.is_verbose());
            assert!(Verbosity::Verbose.is_verbose());
            assert!(Verbosity::Trace.is_verbose());
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_explicit_choices() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_preset_with_endpoint_flag() {
            let config =
                load_target_config(Platform::Android, None, Some("http://10.0.0.5:4723")).unwrap();
            assert_eq!(config.platform(), Platform::Android);
            assert_eq!(config.endpoint(), "http://10.0.0.5:4723");
        }

        #[test]
        fn test_bad_endpoint_flag_rejected() {
            let err = load_target_config(Platform::Browser, None, Some("localhost:9515")).unwrap_err();
            assert!(err.to_string().contains("endpoint"));
        }

        #[test]
        fn test_file_for_other_target_rejected() {
            let yaml = PageflowConfig::android_app().to_yaml().unwrap();
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(yaml.as_bytes()).unwrap();

            let err = load_target_config(Platform::Browser, Some(file.path()), None).unwrap_err();
            assert!(matches!(err, CliError::InvalidArgument { .. }));
        }

        #[test]
        fn test_missing_file_is_config_error() {
            let err = load_target_config(
                Platform::Browser,
                Some(Path::new("/nonexistent/pageflow.yaml")),
                None,
            )
            .unwrap_err();
            assert!(matches!(err, CliError::Config { .. }));
        }
    }
}
