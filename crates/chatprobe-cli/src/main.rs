//! Chatprobe CLI: run the chat message-edit end-to-end suite
//!
//! ## Usage
//!
//! ```bash
//! chatprobe run                          # Run against a dev server in Chromium
//! chatprobe run --fake                   # Dry run against the in-memory app
//! chatprobe run --config suite.yaml -v   # Custom config, debug logs
//! chatprobe list                         # Scenario names in order
//! chatprobe config                       # Resolved configuration
//! ```

use chatprobe::scenarios;
use chatprobe_cli::{
    apply_run_args, load_suite_config, render_report, Cli, CliConfig, CliResult, Commands,
    ConfigArgs, DriverKind, ProgressReporter, RunArgs, Verbosity,
};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every test passed
fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    let config = CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(cli.color.clone().into());

    if let Err(e) = chatprobe::init_logging(config.verbosity.log_filter(), cli.log_format.into()) {
        eprintln!("Warning: {e}");
    }

    match cli.command {
        Commands::Run(args) => run_tests(config, &args),
        Commands::List => {
            run_list();
            Ok(true)
        }
        Commands::Config(args) => run_config(&args),
    }
}

fn run_tests(config: CliConfig, args: &RunArgs) -> CliResult<bool> {
    let suite_config = load_suite_config(args.config.as_deref())?;
    let suite_config = apply_run_args(suite_config, args)?;

    let driver = if args.fake {
        DriverKind::Fake(args.fake_fault.map(Into::into).into_iter().collect())
    } else {
        DriverKind::Browser
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let progress = ProgressReporter::start(
        scenarios::edit::SUITE_NAME,
        config.verbosity.is_quiet() || !matches!(args.format, chatprobe_cli::OutputFormatArg::Text),
    );
    let report = runtime.block_on(chatprobe_cli::run_suite(suite_config, &driver));
    progress.finish();
    let report = report?;

    let rendered = render_report(&report, args.format.into(), config.color.should_color())?;
    if !config.verbosity.is_quiet() || !report.all_passed() {
        print!("{rendered}");
    }
    Ok(report.all_passed())
}

fn run_list() {
    for suite in scenarios::SUITES {
        println!("{}", suite.name);
        for scenario in suite.scenarios {
            println!("  {scenario}");
        }
    }
}

fn run_config(args: &ConfigArgs) -> CliResult<bool> {
    let config = load_suite_config(args.config.as_deref())?;
    print!("{}", config.to_yaml()?);
    Ok(true)
}
