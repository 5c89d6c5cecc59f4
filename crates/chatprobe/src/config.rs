//! Suite configuration: where the chat server lives, how to launch the
//! browser, how long to wait, and which fixture accounts to use.
//!
//! Every field has a default, so an empty YAML document is a valid config.
//! Environment variables override the file (see [`SuiteConfig::apply_env`]).

use crate::result::{ProbeError, ProbeResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default development server URL
pub const DEFAULT_REALM_URL: &str = "http://zulip.zulipdev.com:9981/";

/// Realm URL override
pub const ENV_REALM_URL: &str = "CHATPROBE_REALM_URL";
/// Test user password override
pub const ENV_PASSWORD: &str = "CHATPROBE_PASSWORD";
/// Chromium executable override
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";
/// Artifacts directory override
pub const ENV_ARTIFACTS_DIR: &str = "CHATPROBE_ARTIFACTS_DIR";

/// Browser launch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 1024,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// A login-capable account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestUser {
    /// Login email
    pub email: String,
    /// Login password
    pub password: String,
    /// Name shown as sender
    pub full_name: String,
}

/// A user addressed by private messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipient {
    /// Email typed into the recipient box
    pub email: String,
    /// Name shown in conversation headers
    pub full_name: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            email: "desdemona@zulip.com".to_string(),
            password: "password".to_string(),
            full_name: "Desdemona".to_string(),
        }
    }
}

impl Default for Recipient {
    fn default() -> Self {
        Self {
            email: "cordelia@zulip.com".to_string(),
            full_name: "Cordelia, Lear's daughter".to_string(),
        }
    }
}

/// Accounts and names the scenarios operate on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    /// User the suite logs in as
    pub user: TestUser,
    /// Private message recipient
    pub recipient: Recipient,
    /// Stream used for stream messages
    pub stream: String,
    /// Topic new stream messages are sent to
    pub topic: String,
    /// Topic edits move messages to
    pub edited_topic: String,
    /// DOM id of the "All messages" table
    pub message_table: String,
}

impl Default for Fixtures {
    fn default() -> Self {
        Self {
            user: TestUser::default(),
            recipient: Recipient::default(),
            stream: "Verona".to_string(),
            topic: "edits".to_string(),
            edited_topic: "edited".to_string(),
            message_table: "zhome".to_string(),
        }
    }
}

/// Full configuration of one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Base URL of the chat server, with trailing slash
    pub realm_url: String,
    /// Browser launch options
    pub browser: BrowserConfig,
    /// Default wait options
    pub wait: WaitOptions,
    /// Where failure screenshots go
    pub artifacts_dir: PathBuf,
    /// Fixture accounts and names
    pub fixtures: Fixtures,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            realm_url: DEFAULT_REALM_URL.to_string(),
            browser: BrowserConfig::default(),
            wait: WaitOptions::default(),
            artifacts_dir: PathBuf::from("target/chatprobe"),
            fixtures: Fixtures::default(),
        }
    }
}

impl SuiteConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn from_yaml_file(path: &Path) -> ProbeResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `CHATPROBE_*` / `CHROMIUM_PATH` overrides from the process
    /// environment.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (tests pass a map)
    #[must_use]
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_REALM_URL) {
            self.realm_url = url;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.fixtures.user.password = password;
        }
        if let Some(path) = lookup(ENV_CHROMIUM_PATH) {
            self.browser.chromium_path = Some(path);
        }
        if let Some(dir) = lookup(ENV_ARTIFACTS_DIR) {
            self.artifacts_dir = PathBuf::from(dir);
        }
        self
    }

    /// Set realm URL
    #[must_use]
    pub fn with_realm_url(mut self, url: impl Into<String>) -> Self {
        self.realm_url = url.into();
        self
    }

    /// Set wait options
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Set browser options
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Set artifacts directory
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// URL of the login page
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}login/", self.realm_url)
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> ProbeResult<()> {
        if !(self.realm_url.starts_with("http://") || self.realm_url.starts_with("https://")) {
            return Err(ProbeError::config(format!(
                "realm_url must be an http(s) URL, got `{}`",
                self.realm_url
            )));
        }
        if !self.realm_url.ends_with('/') {
            return Err(ProbeError::config(format!(
                "realm_url must end with `/`, got `{}`",
                self.realm_url
            )));
        }
        if self.wait.timeout_ms == 0 || self.wait.poll_interval_ms == 0 {
            return Err(ProbeError::config(
                "wait.timeout_ms and wait.poll_interval_ms must be non-zero",
            ));
        }
        if self.fixtures.message_table.is_empty() {
            return Err(ProbeError::config("fixtures.message_table is empty"));
        }
        Ok(())
    }
}
