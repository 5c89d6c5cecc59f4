//! Chatprobe: browser-driven end-to-end tests for a web chat application.
//!
//! A suite drives the chat UI through a [`PageDriver`]: Chromium over the
//! DevTools protocol (feature `browser`) or the in-memory [`FakeChat`].
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐    ┌───────────┐    ┌───────────┐    ┌──────────────┐
//! │ scenarios │───►│  common   │───►│  Session  │───►│  PageDriver  │
//! │ (edit)    │    │  helpers  │    │  + waits  │    │ chromium/fake│
//! └───────────┘    └───────────┘    └───────────┘    └──────────────┘
//!       ▲
//!       └── harness::run_test (screenshot on failure, always closes)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chatprobe::{harness, scenarios, FakeChat, Session, SuiteConfig};
//!
//! # async fn run() {
//! let session = Session::new(FakeChat::new(), SuiteConfig::default());
//! let result = harness::run_test(&session, "edit_tests", |s| {
//!     Box::pin(scenarios::edit_tests(s))
//! })
//! .await;
//! assert!(result.passed);
//! # }
//! ```

#![warn(missing_docs)]

pub mod common;
pub mod config;
pub mod driver;
pub mod fake;
pub mod harness;
pub mod logging;
pub mod message;
mod result;
pub mod scenarios;
pub mod scripts;
pub mod selectors;
mod session;
pub mod wait;

#[cfg(feature = "browser")]
mod browser;

#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use config::{BrowserConfig, Fixtures, Recipient, SuiteConfig, TestUser};
pub use driver::{PageDriver, PageFunction};
pub use fake::{FakeChat, FakeFault};
pub use harness::{run_test, SuiteReport, TestResult};
pub use logging::{init_logging, LogFormat};
pub use message::{Destination, MessageDraft, MessageEdit, MessageGroup, MessageId};
pub use result::{ProbeError, ProbeResult};
pub use session::Session;
pub use wait::{Visibility, WaitOptions, WaitResult};
