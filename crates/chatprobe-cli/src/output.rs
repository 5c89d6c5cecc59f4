//! Report rendering and progress display

use chatprobe::{SuiteReport, TestResult};
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::time::Duration;

/// Output format for suite reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Spinner shown on stderr while a suite runs
#[derive(Debug)]
pub struct ProgressReporter {
    spinner: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Start a spinner unless `quiet`
    #[must_use]
    pub fn start(message: &str, quiet: bool) -> Self {
        if quiet {
            return Self { spinner: None };
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self {
            spinner: Some(spinner),
        }
    }

    /// Remove the spinner
    pub fn finish(&self) {
        if let Some(ref spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }
}

/// Render a suite report
pub fn render_report(
    report: &SuiteReport,
    format: OutputFormat,
    use_color: bool,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report),
        OutputFormat::Text => Ok(render_text(report, use_color)),
    }
}

fn styles(use_color: bool) -> (Style, Style, Style) {
    if use_color {
        (
            Style::new().green().bold().force_styling(true),
            Style::new().red().bold().force_styling(true),
            Style::new().dim().force_styling(true),
        )
    } else {
        (Style::new(), Style::new(), Style::new())
    }
}

fn render_result(out: &mut String, result: &TestResult, use_color: bool) {
    let (pass, fail, dim) = styles(use_color);
    let duration = format!("({:.2}s)", result.duration.as_secs_f64());
    if result.passed {
        let _ = writeln!(
            out,
            "{} {} {}",
            pass.apply_to("PASS"),
            result.name,
            dim.apply_to(duration)
        );
        return;
    }
    let _ = writeln!(
        out,
        "{} {} {}",
        fail.apply_to("FAIL"),
        result.name,
        dim.apply_to(duration)
    );
    if let Some(error) = &result.error {
        for line in error.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
    if let Some(path) = &result.screenshot {
        let _ = writeln!(out, "    screenshot: {}", path.display());
    }
}

fn render_text(report: &SuiteReport, use_color: bool) -> String {
    let (pass, fail, dim) = styles(use_color);
    let mut out = String::new();
    let _ = writeln!(out, "{}", dim.apply_to(format!("run {}", report.run_id)));
    for result in &report.results {
        render_result(&mut out, result, use_color);
    }
    let summary = format!(
        "{} passed, {} failed, {} total",
        report.passed_count(),
        report.failed_count(),
        report.total()
    );
    let styled = if report.all_passed() {
        pass.apply_to(summary)
    } else {
        fail.apply_to(summary)
    };
    let _ = writeln!(out, "\n{styled}");
    out
}
