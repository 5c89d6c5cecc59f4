//! CLI configuration: output settings and suite config resolution

use crate::commands::RunArgs;
use crate::error::CliResult;
use chatprobe::SuiteConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Verbosity level for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - detailed output
    Verbose,
    /// Debug - everything
    Debug,
}

impl Verbosity {
    /// Derive from `-v` count and `--quiet`
    #[must_use]
    pub const fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Log filter used when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => chatprobe::logging::default_filter(0, true),
            Self::Normal => chatprobe::logging::default_filter(0, false),
            Self::Verbose => chatprobe::logging::default_filter(1, false),
            Self::Debug => chatprobe::logging::default_filter(2, false),
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
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create a new CLI config with defaults
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

/// Load the suite configuration: file (or defaults), then environment.
pub fn load_suite_config(path: Option<&Path>) -> CliResult<SuiteConfig> {
    let config = match path {
        Some(path) => SuiteConfig::from_yaml_file(path)?,
        None => SuiteConfig::default(),
    };
    let config = config.apply_env();
    config.validate()?;
    Ok(config)
}

/// Apply `run` flags on top of a loaded configuration.
pub fn apply_run_args(mut config: SuiteConfig, args: &RunArgs) -> CliResult<SuiteConfig> {
    if let Some(url) = &args.realm_url {
        config = config.with_realm_url(url.clone());
    }
    let mut browser = config.browser.clone();
    if args.headed {
        browser = browser.with_headless(false);
    }
    if args.no_sandbox {
        browser = browser.with_no_sandbox();
    }
    if let Some(path) = &args.chromium_path {
        browser = browser.with_chromium_path(path.clone());
    }
    config = config.with_browser(browser);
    if let Some(ms) = args.timeout_ms {
        config.wait.timeout_ms = ms;
    }
    if let Some(dir) = &args.artifacts_dir {
        config = config.with_artifacts_dir(dir.clone());
    }
    config.validate()?;
    Ok(config)
}
