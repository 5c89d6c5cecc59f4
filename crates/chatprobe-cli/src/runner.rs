//! Suite execution against a browser or the in-memory chat application

use crate::error::CliResult;
use chatprobe::{
    harness, scenarios, FakeChat, FakeFault, PageDriver, Session, SuiteConfig, SuiteReport,
    TestResult,
};

/// Which page driver a run uses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DriverKind {
    /// Chromium over CDP
    #[default]
    Browser,
    /// In-memory chat application with the given faults
    Fake(Vec<FakeFault>),
}

/// Run the edit suite and collect a report.
///
/// Errors only if the driver cannot be set up; test failures are recorded
/// in the report.
pub async fn run_suite(config: SuiteConfig, driver: &DriverKind) -> CliResult<SuiteReport> {
    let mut report = SuiteReport::new();
    tracing::info!(run_id = %report.run_id, realm = %config.realm_url, "starting run");

    let result = match driver {
        DriverKind::Fake(faults) => {
            let fake = faults
                .iter()
                .fold(FakeChat::new(), |fake, fault| fake.with_fault(*fault));
            run_edit_suite(Session::new(fake, config)).await
        }
        DriverKind::Browser => run_in_browser(config).await?,
    };

    report.push(result);
    Ok(report)
}

#[cfg(feature = "browser")]
async fn run_in_browser(config: SuiteConfig) -> CliResult<TestResult> {
    let driver = chatprobe::ChromiumDriver::launch(&config.browser).await?;
    Ok(run_edit_suite(Session::new(driver, config)).await)
}

#[cfg(not(feature = "browser"))]
async fn run_in_browser(_config: SuiteConfig) -> CliResult<TestResult> {
    Err(crate::error::CliError::config(
        "browser support not compiled in; rebuild with --features browser or pass --fake",
    ))
}

async fn run_edit_suite<D: PageDriver>(session: Session<D>) -> TestResult {
    harness::run_test(&session, scenarios::edit::SUITE_NAME, |s| {
        Box::pin(scenarios::edit_tests(s))
    })
    .await
}
