//! Browser control over the Chrome DevTools Protocol.
//!
//! [`ChromiumDriver`] launches Chromium through chromiumoxide, keeps the CDP
//! handler running on a tokio task and drives a single page.

use crate::config::BrowserConfig;
use crate::driver::{PageDriver, PageFunction};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Chromium browser with one page
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Mutex<CdpBrowser>,
    page: CdpPage,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumDriver {
    /// Launch a new browser instance and open a blank page
    pub async fn launch(config: &BrowserConfig) -> ProbeResult<Self> {
        let mut builder = CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|message| ProbeError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| ProbeError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler stopped");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ProbeError::Page {
                message: e.to_string(),
            })?;

        tracing::info!(
            headless = config.headless,
            width = config.viewport_width,
            height = config.viewport_height,
            "browser launched"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler: Mutex::new(Some(handle)),
        })
    }

    async fn element(&self, selector: &str) -> ProbeResult<Element> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| ProbeError::not_found(selector))
    }

    async fn eval(&self, name: &str, expression: String) -> ProbeResult<Value> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|e| ProbeError::Evaluation {
                function: name.to_string(),
                message: e.to_string(),
            })?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    /// Evaluate `body` with `el` bound to the first match (or `null`)
    async fn eval_on(&self, name: &str, selector: &str, body: &str) -> ProbeResult<Value> {
        let selector_json = Value::String(selector.to_string());
        let expression =
            format!("(() => {{ const el = document.querySelector({selector_json}); {body} }})()");
        self.eval(name, expression).await
    }
}

fn input_error(selector: &str, e: impl std::fmt::Display) -> ProbeError {
    ProbeError::Input {
        selector: selector.to_string(),
        message: e.to_string(),
    }
}

const VISIBLE_BODY: &str = "if (!el) return false; \
     const style = window.getComputedStyle(el); \
     const rect = el.getBoundingClientRect(); \
     return style.visibility !== 'hidden' && style.display !== 'none' \
         && rect.width > 0 && rect.height > 0;";

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str) -> ProbeResult<()> {
        tracing::debug!(url, "goto");
        self.page
            .goto(url)
            .await
            .map_err(|e| ProbeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        let url = self.page.url().await.map_err(|e| ProbeError::Page {
            message: e.to_string(),
        })?;
        Ok(url.unwrap_or_default())
    }

    async fn click(&self, selector: &str) -> ProbeResult<()> {
        tracing::debug!(selector, "click");
        self.element(selector)
            .await?
            .click()
            .await
            .map_err(|e| input_error(selector, e))?;
        Ok(())
    }

    async fn trigger_click(&self, selector: &str) -> ProbeResult<()> {
        tracing::debug!(selector, "trigger_click");
        let clicked = self
            .eval_on(
                "trigger_click",
                selector,
                "if (!el) return false; el.click(); return true;",
            )
            .await?;
        if clicked.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(ProbeError::not_found(selector))
        }
    }

    async fn type_text(&self, selector: &str, text: &str) -> ProbeResult<()> {
        tracing::debug!(selector, len = text.len(), "type_text");
        let element = self.element(selector).await?;
        element.focus().await.map_err(|e| input_error(selector, e))?;
        element
            .type_str(text)
            .await
            .map_err(|e| input_error(selector, e))?;
        Ok(())
    }

    async fn press_key(&self, selector: &str, key: &str) -> ProbeResult<()> {
        tracing::debug!(selector, key, "press_key");
        let element = self.element(selector).await?;
        element.focus().await.map_err(|e| input_error(selector, e))?;
        element
            .press_key(key)
            .await
            .map_err(|e| input_error(selector, e))?;
        Ok(())
    }

    async fn clear(&self, selector: &str) -> ProbeResult<()> {
        let cleared = self
            .eval_on(
                "clear",
                selector,
                "if (!el) return false; el.focus(); el.select(); el.value = ''; \
                 el.dispatchEvent(new Event('input', { bubbles: true })); return true;",
            )
            .await?;
        if cleared.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(ProbeError::not_found(selector))
        }
    }

    async fn is_visible(&self, selector: &str) -> ProbeResult<bool> {
        let visible = self.eval_on("is_visible", selector, VISIBLE_BODY).await?;
        Ok(visible.as_bool().unwrap_or(false))
    }

    async fn exists(&self, selector: &str) -> ProbeResult<bool> {
        let found = self.eval_on("exists", selector, "return el !== null;").await?;
        Ok(found.as_bool().unwrap_or(false))
    }

    async fn text_content(&self, selector: &str) -> ProbeResult<Option<String>> {
        let text = self
            .eval_on("text_content", selector, "return el ? el.textContent : null;")
            .await?;
        Ok(text.as_str().map(str::to_string))
    }

    async fn input_value(&self, selector: &str) -> ProbeResult<Option<String>> {
        let value = self
            .eval_on("input_value", selector, "return el ? el.value : null;")
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn call_function(&self, function: &PageFunction) -> ProbeResult<Value> {
        tracing::trace!(function = function.name, "call_function");
        self.eval(function.name, function.to_expression()).await
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        let screenshot = self
            .page
            .execute(params)
            .await
            .map_err(|e| ProbeError::Screenshot {
                message: e.to_string(),
            })?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| ProbeError::Screenshot {
                message: e.to_string(),
            })
    }

    async fn close(&self) -> ProbeResult<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| ProbeError::BrowserLaunch {
                message: e.to_string(),
            })?;
        if let Some(handle) = self.handler.lock().await.take() {
            join_handler(handle).await;
        }
        tracing::info!("browser closed");
        Ok(())
    }
}

/// Wait for the CDP handler task, logging a panic or cancellation.
///
/// Returns whether the task finished cleanly.
async fn join_handler(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "CDP handler task failed");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_handler_clean_exit() {
        assert!(join_handler(tokio::spawn(async {})).await);
    }

    #[tokio::test]
    async fn test_join_handler_reports_panic() {
        let handle = tokio::spawn(async { panic!("handler crashed") });
        assert!(!join_handler(handle).await);
    }
}
