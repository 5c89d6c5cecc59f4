//! PageDriver - Abstract Browser Automation Trait
//!
//! The suite talks to the page only through [`PageDriver`]. Two
//! implementations ship with the crate:
//!
//! - `ChromiumDriver` (feature `browser`): real Chromium over CDP via
//!   chromiumoxide
//! - [`FakeChat`](crate::fake::FakeChat): an in-memory model of the chat UI
//!   for tests and dry runs
//!
//! Selectors are CSS selectors. App-specific queries that CSS cannot
//! express go through [`PageFunction`]s.

use crate::result::ProbeResult;
use async_trait::async_trait;
use serde_json::Value;

/// A named JavaScript function evaluated in the page.
///
/// Real drivers evaluate `(<body>)(...args)`. Test doubles dispatch on
/// `name` and never look at `body`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFunction {
    /// Stable name, used in logs and by test doubles
    pub name: &'static str,
    /// JavaScript function expression
    pub body: &'static str,
    /// Positional arguments
    pub args: Vec<Value>,
}

impl PageFunction {
    /// Function without arguments
    #[must_use]
    pub const fn new(name: &'static str, body: &'static str) -> Self {
        Self {
            name,
            body,
            args: Vec::new(),
        }
    }

    /// Append an argument
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Expression that invokes the function with its arguments
    #[must_use]
    pub fn to_expression(&self) -> String {
        let args = Value::Array(self.args.clone());
        format!("({})(...{})", self.body, args)
    }
}

/// Abstract driver trait for browser automation.
///
/// All methods take `&self`: a driver is owned by one session and driven
/// sequentially, implementations use interior mutability where needed.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL and wait for the load event
    async fn goto(&self, url: &str) -> ProbeResult<()>;

    /// Current page URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Pointer click on the first element matching `selector`
    async fn click(&self, selector: &str) -> ProbeResult<()>;

    /// `element.click()` on the first match, regardless of visibility.
    ///
    /// Needed for hover-revealed controls that have no box until the
    /// pointer is over their row.
    async fn trigger_click(&self, selector: &str) -> ProbeResult<()>;

    /// Focus the element and type `text` key by key
    async fn type_text(&self, selector: &str, text: &str) -> ProbeResult<()>;

    /// Focus the element and press a named key (`"Enter"`, `"Tab"`, ...)
    async fn press_key(&self, selector: &str, key: &str) -> ProbeResult<()>;

    /// Empty an input or textarea
    async fn clear(&self, selector: &str) -> ProbeResult<()>;

    /// Whether the first match is visible; `false` when nothing matches
    async fn is_visible(&self, selector: &str) -> ProbeResult<bool>;

    /// Whether any element matches
    async fn exists(&self, selector: &str) -> ProbeResult<bool>;

    /// `textContent` of the first match
    async fn text_content(&self, selector: &str) -> ProbeResult<Option<String>>;

    /// `value` of the first matching input or textarea
    async fn input_value(&self, selector: &str) -> ProbeResult<Option<String>>;

    /// Evaluate a page function and return its JSON result
    async fn call_function(&self, function: &PageFunction) -> ProbeResult<Value>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Close the browser
    async fn close(&self) -> ProbeResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expression_without_args() {
        let f = PageFunction::new("noop", "() => true");
        assert_eq!(f.to_expression(), "(() => true)(...[])");
    }

    #[test]
    fn test_expression_escapes_args() {
        let f = PageFunction::new("echo", "(s) => s").arg("it's \"quoted\"");
        assert_eq!(f.to_expression(), r#"((s) => s)(...["it's \"quoted\""])"#);
    }

    #[test]
    fn test_args_keep_order() {
        let f = PageFunction::new("pair", "(a, b) => [a, b]").arg(1).arg("two");
        assert_eq!(f.args, vec![json!(1), json!("two")]);
    }
}
