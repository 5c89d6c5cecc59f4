//! Test runner: runs a test function against a session, captures a
//! screenshot on failure and always closes the browser.

use crate::driver::PageDriver;
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Whether test passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Test duration
    pub duration: Duration,
    /// Failure screenshot, if one was written
    pub screenshot: Option<PathBuf>,
}

impl TestResult {
    /// Create a passing test result
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
            duration: Duration::ZERO,
            screenshot: None,
        }
    }

    /// Create a failing test result
    #[must_use]
    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.into()),
            duration: Duration::ZERO,
            screenshot: None,
        }
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set screenshot path
    #[must_use]
    pub fn with_screenshot(mut self, path: Option<PathBuf>) -> Self {
        self.screenshot = path;
        self
    }
}

/// Results of one run of the runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Individual test results
    pub results: Vec<TestResult>,
}

impl Default for SuiteReport {
    fn default() -> Self {
        Self::new()
    }
}

impl SuiteReport {
    /// Start a new report
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    /// Record a result
    pub fn push(&mut self, result: TestResult) {
        self.results.push(result);
    }

    /// Check if all tests passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Count passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Count failed tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    /// Get total test count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed tests
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    /// Total time spent in tests
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run `test_fn` against `session`.
///
/// A failure is logged and a screenshot `failure-<n>.png` is written to the
/// configured artifacts directory (best effort). The driver is closed
/// whether the test passed or not.
pub async fn run_test<D, F>(session: &Session<D>, name: &str, test_fn: F) -> TestResult
where
    D: PageDriver,
    F: for<'a> FnOnce(&'a Session<D>) -> LocalBoxFuture<'a, ProbeResult<()>>,
{
    let span = info_span!("test", name);
    async move {
        let start = Instant::now();
        let outcome = test_fn(session).await;
        let elapsed = start.elapsed();

        let result = match outcome {
            Ok(()) => {
                info!(elapsed_ms = elapsed.as_millis() as u64, "test passed");
                TestResult::pass(name)
            }
            Err(e) => {
                error!(error = %e, "test failed");
                let screenshot = capture_failure(session).await;
                TestResult::fail(name, e.to_string()).with_screenshot(screenshot)
            }
        };

        if let Err(e) = session.driver().close().await {
            warn!(error = %e, "failed to close browser");
        }
        result.with_duration(elapsed)
    }
    .instrument(span)
    .await
}

async fn capture_failure<D: PageDriver>(session: &Session<D>) -> Option<PathBuf> {
    let dir = &session.config().artifacts_dir;
    let bytes = match session.driver().screenshot().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "failure screenshot not taken");
            return None;
        }
    };
    match write_screenshot(dir, &bytes).await {
        Ok(path) => {
            warn!(path = %path.display(), "failure screenshot saved");
            Some(path)
        }
        Err(e) => {
            warn!(error = %e, "failure screenshot not saved");
            None
        }
    }
}

/// Highest `failure-<n>.png` index tried before giving up
const MAX_SCREENSHOTS: u32 = 10_000;

/// Write `bytes` to the first free `failure-<n>.png` in `dir`
async fn write_screenshot(dir: &Path, bytes: &[u8]) -> ProbeResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    for n in 1..=MAX_SCREENSHOTS {
        let path = dir.join(format!("failure-{n}.png"));
        let opened = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        let mut file = match opened {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        };
        file.write_all(bytes).await?;
        file.flush().await?;
        return Ok(path);
    }
    Err(ProbeError::Screenshot {
        message: format!(
            "{} already holds {MAX_SCREENSHOTS} failure screenshots",
            dir.display()
        ),
    })
}
