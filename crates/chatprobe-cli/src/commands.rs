//! CLI command definitions using clap

use chatprobe::{FakeFault, LogFormat};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Chatprobe: end-to-end tests for a web chat application's message editing
#[derive(Parser, Debug)]
#[command(name = "chatprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the message edit suite
    Run(RunArgs),

    /// List scenarios in execution order
    List,

    /// Show the resolved configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base URL of the chat server (with trailing slash)
    #[arg(long)]
    pub realm_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Launch Chromium without its sandbox
    #[arg(long)]
    pub no_sandbox: bool,

    /// Chromium executable
    #[arg(long)]
    pub chromium_path: Option<String>,

    /// Timeout of every wait in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Directory for failure screenshots
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,

    /// Run against the in-memory chat application instead of a browser
    #[arg(long)]
    pub fake: bool,

    /// Make the in-memory chat application misbehave (with --fake)
    #[arg(long, requires = "fake")]
    pub fake_fault: Option<FaultArg>,

    /// Report format on stdout
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormatArg,
}

/// Arguments for the config command
#[derive(Parser, Debug, Default)]
pub struct ConfigArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Color argument for CLI
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

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Report format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormatArg {
    /// Human-readable summary
    #[default]
    Text,
    /// Suite report as JSON
    Json,
}

impl From<OutputFormatArg> for crate::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => Self::Text,
            OutputFormatArg::Json => Self::Json,
        }
    }
}

/// Fault of the in-memory chat application
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FaultArg {
    /// Login is never accepted
    RejectLogin,
    /// The actions popover lacks "edit message"
    NoEditPopover,
    /// Saving an edit is ignored
    IgnoreSave,
    /// Edited `/me` messages lose their status rendering
    DropMeRendering,
}

impl From<FaultArg> for FakeFault {
    fn from(arg: FaultArg) -> Self {
        match arg {
            FaultArg::RejectLogin => Self::RejectLogin,
            FaultArg::NoEditPopover => Self::NoEditPopover,
            FaultArg::IgnoreSave => Self::IgnoreSave,
            FaultArg::DropMeRendering => Self::DropMeRendering,
        }
    }
}
