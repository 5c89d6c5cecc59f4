//! Chatprobe CLI library
//!
//! Argument parsing, configuration resolution, suite execution and report
//! rendering for the `chatprobe` binary.

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, FaultArg, LogFormatArg, OutputFormatArg, RunArgs,
};
pub use config::{apply_run_args, load_suite_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_report, OutputFormat, ProgressReporter};
pub use runner::{run_suite, DriverKind};
