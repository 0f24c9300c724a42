//! Browser global stand-ins for headless tests.
//!
//! Each test builds its own [`BrowserEnv`]; nothing here is process-global,
//! so mocks cannot leak state between tests.
//!
//! ```ignore
//! let env = BrowserEnv::new()?;
//! env.fetch.get("/api/me", MockResponse::json(&json!({"name": "ada"}))?);
//! env.local_storage.set_item("token", "abc");
//!
//! app.boot(&env).await;
//! env.poller().poll_value(|| async { env.console.captured() }).await?;
//! ```

pub mod console;
pub mod fetch;
pub mod location;
pub mod media;
pub mod navigator;
pub mod observer;
pub mod service_worker;
pub mod storage;

use crate::config::HarnessConfig;
use crate::fixture::Fixture;
use crate::result::HeadlessResult;
use crate::wait::Poller;
use console::ConsoleFilter;
use fetch::MockFetch;
use location::MockLocation;
use media::MatchMedia;
use navigator::MockNavigator;
use observer::Observers;
use std::collections::BTreeMap;
use storage::MockStorage;

/// A complete set of browser globals for one test
#[derive(Debug, Clone)]
pub struct BrowserEnv {
    config: HarnessConfig,
    /// `window.localStorage`
    pub local_storage: MockStorage,
    /// `window.sessionStorage`
    pub session_storage: MockStorage,
    /// `window.matchMedia`
    pub match_media: MatchMedia,
    /// Observer constructors
    pub observers: Observers,
    /// `window.fetch`
    pub fetch: MockFetch,
    /// `window.navigator`
    pub navigator: MockNavigator,
    /// `window.location`
    pub location: MockLocation,
    /// `window.console`
    pub console: ConsoleFilter,
    env_vars: BTreeMap<String, String>,
}

impl BrowserEnv {
    /// Build an environment from default configuration
    pub fn new() -> HeadlessResult<Self> {
        Self::from_config(HarnessConfig::default())
    }

    /// Build an environment from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the configured location is not a valid absolute
    /// URL or a console pattern does not compile.
    pub fn from_config(config: HarnessConfig) -> HeadlessResult<Self> {
        let location = MockLocation::new(&config.location_href)?;
        let console =
            ConsoleFilter::new(&config.console.suppress_patterns, config.console.capture)?;
        let navigator = MockNavigator::new(&config.user_agent, &config.language);
        navigator.set_on_line(config.online);

        tracing::debug!(
            target: "jugar_headless::env",
            location = %config.location_href,
            online = config.online,
            "browser environment created"
        );

        Ok(Self {
            local_storage: MockStorage::local(),
            session_storage: MockStorage::session(),
            match_media: MatchMedia::new(),
            observers: Observers::new(),
            fetch: MockFetch::new(),
            navigator,
            location,
            console,
            env_vars: config.env.clone(),
            config,
        })
    }

    /// Configuration this environment was built from
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Poller using the configured wait options
    #[must_use]
    pub fn poller(&self) -> Poller {
        self.config.poller()
    }

    /// Read a test environment variable
    #[must_use]
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env_vars.get(key).map(String::as_str)
    }

    /// Set a test environment variable for this environment only
    pub fn set_env_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let _ = self.env_vars.insert(key.into(), value.into());
    }

    /// Put every mock back into its freshly-built state
    pub fn reset(&mut self) -> HeadlessResult<()> {
        self.local_storage.clear();
        self.session_storage.clear();
        self.match_media.reset();
        self.observers.reset();
        self.fetch.reset();
        self.navigator.reset();
        self.navigator.set_on_line(self.config.online);
        self.location.reset(&self.config.location_href)?;
        self.console.clear();
        self.env_vars = self.config.env.clone();
        Ok(())
    }
}

impl Fixture for BrowserEnv {
    fn setup(&mut self) -> HeadlessResult<()> {
        self.reset()
    }

    fn teardown(&mut self) -> HeadlessResult<()> {
        self.reset()
    }

    fn name(&self) -> &str {
        "browser-env"
    }

    fn priority(&self) -> i32 {
        100
    }
}
