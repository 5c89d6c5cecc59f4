//! A page driver bound to one suite configuration.

use crate::config::{Fixtures, SuiteConfig};
use crate::driver::PageDriver;
use crate::result::ProbeResult;
use crate::wait::{poll_until, wait_until, Visibility, WaitOptions, WaitResult};
use std::future::Future;
use std::sync::Arc;

/// The live page of one test run.
///
/// Owned by exactly one running test and driven sequentially. Login state
/// lives in the browser, so it carries over between scenarios that share
/// a session.
#[derive(Debug)]
pub struct Session<D> {
    driver: D,
    config: Arc<SuiteConfig>,
}

impl<D: PageDriver> Session<D> {
    /// Bind a driver to a configuration
    pub fn new(driver: D, config: impl Into<Arc<SuiteConfig>>) -> Self {
        Self {
            driver,
            config: config.into(),
        }
    }

    /// The underlying driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// The suite configuration
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Fixture accounts and names
    pub fn fixtures(&self) -> &Fixtures {
        &self.config.fixtures
    }

    /// Default wait options
    pub fn wait_options(&self) -> &WaitOptions {
        &self.config.wait
    }

    /// Give the driver back
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Wait until `selector` reaches `state`
    pub async fn wait_for_selector(&self, selector: &str, state: Visibility) -> ProbeResult<()> {
        let waited_for = format!("selector `{selector}` {state}");
        wait_until(self.wait_options(), &waited_for, || async move {
            match state {
                Visibility::Attached => self.driver.exists(selector).await,
                Visibility::Visible => self.driver.is_visible(selector).await,
                Visibility::Hidden => Ok(!self.driver.is_visible(selector).await?),
            }
        })
        .await?;
        Ok(())
    }

    /// Wait until the text of `selector` equals `expected`.
    ///
    /// With `trim`, surrounding whitespace of the rendered text is ignored.
    pub async fn wait_for_text(&self, selector: &str, expected: &str, trim: bool) -> ProbeResult<()> {
        let waited_for = format!("text of `{selector}` to be {expected:?}");
        wait_until(self.wait_options(), &waited_for, || async move {
            let text = self.driver.text_content(selector).await?;
            Ok(text.is_some_and(|t| if trim { t.trim() == expected } else { t == expected }))
        })
        .await?;
        Ok(())
    }

    /// Wait until the value of an input equals `expected`
    pub async fn wait_for_input_value(&self, selector: &str, expected: &str) -> ProbeResult<()> {
        let waited_for = format!("value of `{selector}` to be {expected:?}");
        wait_until(self.wait_options(), &waited_for, || async move {
            let value = self.driver.input_value(selector).await?;
            Ok(value.as_deref() == Some(expected))
        })
        .await?;
        Ok(())
    }

    /// Poll an arbitrary probe with the session's wait options
    pub async fn wait_for<T, F, Fut>(&self, waited_for: &str, probe: F) -> ProbeResult<WaitResult<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<Option<T>>>,
    {
        poll_until(self.wait_options(), waited_for, probe).await
    }
}
