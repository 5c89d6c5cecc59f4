//! Test scenarios driven against a logged-in chat session.
//!
//! Each suite exposes one entry point taking a [`Session`](crate::Session)
//! plus the names of its scenarios in execution order.

pub mod edit;

pub use edit::edit_tests;

/// A runnable suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteInfo {
    /// Suite name
    pub name: &'static str,
    /// Scenario names in execution order
    pub scenarios: &'static [&'static str],
}

/// All suites known to the runner
pub const SUITES: &[SuiteInfo] = &[SuiteInfo {
    name: edit::SUITE_NAME,
    scenarios: edit::SCENARIOS,
}];
