//! Harness configuration
//!
//! Defaults describe a plain desktop browser on `http://localhost/` with
//! `NODE_ENV=test`. A config file (YAML or JSON) can override any field and
//! a few `HEADLESS_*` environment variables override the file.

use crate::browser::console::DEFAULT_SUPPRESS_PATTERNS;
use crate::browser::navigator::DEFAULT_USER_AGENT;
use crate::result::{HeadlessError, HeadlessResult};
use crate::wait::{Poller, WaitOptions, MIN_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Location every environment starts at
pub const DEFAULT_LOCATION: &str = "http://localhost/";

/// Default `tracing` filter directive
pub const DEFAULT_LOG_FILTER: &str = "jugar_headless=info";

/// Overrides `wait.timeout_ms`
pub const ENV_WAIT_TIMEOUT: &str = "HEADLESS_WAIT_TIMEOUT_MS";
/// Overrides `wait.poll_interval_ms`
pub const ENV_POLL_INTERVAL: &str = "HEADLESS_POLL_INTERVAL_MS";
/// Overrides `location_href`
pub const ENV_LOCATION: &str = "HEADLESS_LOCATION";

/// Console filter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Regex patterns of messages to drop
    pub suppress_patterns: Vec<String>,
    /// Keep messages that pass the filter for assertions
    pub capture: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            suppress_patterns: DEFAULT_SUPPRESS_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            capture: true,
        }
    }
}

/// Configuration for a headless browser environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Default wait timeout and poll interval
    pub wait: WaitOptions,
    /// Initial `window.location.href`
    pub location_href: String,
    /// `navigator.userAgent`
    pub user_agent: String,
    /// `navigator.language`
    pub language: String,
    /// Initial `navigator.onLine`
    pub online: bool,
    /// Console filter settings
    pub console: ConsoleConfig,
    /// Environment variables visible to the code under test
    pub env: BTreeMap<String, String>,
    /// `tracing` filter used by [`crate::logging::init`]
    pub log_filter: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        let _ = env.insert("NODE_ENV".to_string(), "test".to_string());
        Self {
            wait: WaitOptions::default(),
            location_href: DEFAULT_LOCATION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            language: "en-US".to_string(),
            online: true,
            console: ConsoleConfig::default(),
            env,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::default()
    }

    /// Parse YAML
    pub fn from_yaml_str(source: &str) -> HeadlessResult<Self> {
        Ok(serde_yaml_ng::from_str(source)?)
    }

    /// Parse JSON
    pub fn from_json_str(source: &str) -> HeadlessResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has an unknown
    /// extension, or does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> HeadlessResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let config = match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&source)?,
            Some("json") => Self::from_json_str(&source)?,
            _ => {
                return Err(HeadlessError::config(format!(
                    "unsupported config file '{}': expected .yaml, .yml or .json",
                    path.display()
                )))
            }
        };
        tracing::debug!(target: "jugar_headless::config", path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply `HEADLESS_*` overrides from the process environment
    pub fn with_env_overrides(self) -> HeadlessResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `HEADLESS_*` overrides from `lookup`
    ///
    /// # Errors
    ///
    /// Returns [`HeadlessError::Config`] if a numeric override does not parse.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> HeadlessResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_WAIT_TIMEOUT) {
            self.wait.timeout_ms = parse_ms(ENV_WAIT_TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL) {
            self.wait.poll_interval_ms = parse_interval(&value)?;
        }
        if let Some(value) = lookup(ENV_LOCATION) {
            self.location_href = value;
        }
        Ok(self)
    }

    /// Poller using this config's wait options
    #[must_use]
    pub fn poller(&self) -> Poller {
        Poller::with_options(self.wait)
    }
}

fn parse_ms(key: &str, value: &str) -> HeadlessResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| HeadlessError::config(format!("{key}='{value}' is not a millisecond count: {e}")))
}

fn parse_interval(value: &str) -> HeadlessResult<u64> {
    match parse_ms(ENV_POLL_INTERVAL, value)? {
        0 => Err(HeadlessError::config(format!(
            "{ENV_POLL_INTERVAL} must be at least {MIN_POLL_INTERVAL_MS}ms"
        ))),
        ms => Ok(ms),
    }
}

/// Builder for `HarnessConfig`
#[derive(Debug, Clone, Default)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl HarnessConfigBuilder {
    /// Set the default wait timeout
    #[must_use]
    pub fn wait_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.wait.timeout_ms = timeout_ms;
        self
    }

    /// Set the poll interval
    #[must_use]
    pub fn poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.config.wait = self.config.wait.with_poll_interval(poll_interval_ms);
        self
    }

    /// Set the initial location
    #[must_use]
    pub fn location(mut self, href: impl Into<String>) -> Self {
        self.config.location_href = href.into();
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the navigator language
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    /// Start offline
    #[must_use]
    pub fn offline(mut self) -> Self {
        self.config.online = false;
        self
    }

    /// Add a console suppression pattern
    #[must_use]
    pub fn suppress(mut self, pattern: impl Into<String>) -> Self {
        self.config.console.suppress_patterns.push(pattern.into());
        self
    }

    /// Set an environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.config.env.insert(key.into(), value.into());
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> HarnessConfig {
        self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.wait.timeout_ms, 5_000);
        assert_eq!(config.wait.poll_interval_ms, 100);
        assert_eq!(config.location_href, DEFAULT_LOCATION);
        assert_eq!(config.env.get("NODE_ENV").map(String::as_str), Some("test"));
        assert!(config.online);
        assert!(config.console.capture);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = HarnessConfig::from_yaml_str(
            "wait:\n  timeout_ms: 1200\nlanguage: de-DE\nenv:\n  API_URL: http://api.test\n",
        )
        .unwrap();
        assert_eq!(config.wait.timeout_ms, 1_200);
        assert_eq!(config.wait.poll_interval_ms, 100);
        assert_eq!(config.language, "de-DE");
        assert_eq!(config.env.get("API_URL").map(String::as_str), Some("http://api.test"));
        assert!(!config.env.contains_key("NODE_ENV"));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"online": false, "location_href": "https://shop.test/cart"}}"#).unwrap();
        let config = HarnessConfig::from_file(file.path()).unwrap();
        assert!(!config.online);
        assert_eq!(config.location_href, "https://shop.test/cart");
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "user_agent: yaml-agent").unwrap();
        let config = HarnessConfig::from_file(file.path()).unwrap();
        assert_eq!(config.user_agent, "yaml-agent");
    }

    #[test]
    fn test_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let err = HarnessConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, HeadlessError::Config { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_WAIT_TIMEOUT, "250"),
            (ENV_POLL_INTERVAL, " 20 "),
            (ENV_LOCATION, "http://localhost:3000/"),
        ]
        .into_iter()
        .collect();
        let config = HarnessConfig::default()
            .with_overrides_from(|key| vars.get(key).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.wait.timeout_ms, 250);
        assert_eq!(config.wait.poll_interval_ms, 20);
        assert_eq!(config.location_href, "http://localhost:3000/");
        assert_eq!(config.poller().options().timeout_ms, 250);
    }

    #[test]
    fn test_bad_env_override() {
        let err = HarnessConfig::default()
            .with_overrides_from(|key| (key == ENV_WAIT_TIMEOUT).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_WAIT_TIMEOUT));
    }

    #[test]
    fn test_zero_poll_interval_override_rejected() {
        let err = HarnessConfig::default()
            .with_overrides_from(|key| (key == ENV_POLL_INTERVAL).then(|| "0".to_string()))
            .unwrap_err();
        assert!(matches!(err, HeadlessError::Config { .. }));
        assert!(err.to_string().contains(ENV_POLL_INTERVAL));

        let config = HarnessConfig::builder().poll_interval_ms(0).build();
        assert_eq!(config.wait.poll_interval_ms, MIN_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_builder() {
        let config = HarnessConfig::builder()
            .wait_timeout_ms(900)
            .poll_interval_ms(10)
            .location("https://example.test/")
            .user_agent("ua")
            .language("ja-JP")
            .offline()
            .suppress("^noise")
            .env("FEATURE_FLAG", "on")
            .build();
        assert_eq!(config.wait, WaitOptions::new().with_timeout(900).with_poll_interval(10));
        assert!(!config.online);
        assert!(config.console.suppress_patterns.iter().any(|p| p == "^noise"));
        assert_eq!(config.env.len(), 2);
    }
}
