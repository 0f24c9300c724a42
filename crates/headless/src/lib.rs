//! Jugar Headless: browser globals and async waiting for headless tests
//!
//! Front-end code expects a browser around it: `matchMedia`, observers,
//! storage, `fetch`, `navigator`, `location`, service workers and a console.
//! This crate builds those as plain Rust values, one [`BrowserEnv`] per test,
//! and provides the [`Poller`] for awaiting conditions that settle later.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     jugar-headless                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │   ┌──────────────┐    ┌──────────────┐    ┌──────────────┐   │
//! │   │ HarnessConfig│───►│ BrowserEnv   │◄───│ Fixture      │   │
//! │   │ (yaml/json)  │    │ (mocks)      │    │ Manager      │   │
//! │   └──────────────┘    └──────┬───────┘    └──────────────┘   │
//! │                              │ probes                         │
//! │                       ┌──────▼───────┐                        │
//! │                       │ Poller       │                        │
//! │                       │ (wait_for)   │                        │
//! │                       └──────────────┘                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use jugar_headless::{wait_for_timeout, BrowserEnv};
//!
//! let env = BrowserEnv::new()?;
//! let storage = env.local_storage.clone();
//! app.start(&env);
//! let token = wait_for_timeout(|| {
//!     let storage = storage.clone();
//!     async move { storage.get_item("token") }
//! }, 1_000).await?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Browser global stand-ins, aggregated by [`BrowserEnv`]
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod browser;
#[allow(clippy::missing_errors_doc)]
pub mod config;
pub mod fixture;
pub mod logging;
pub mod result;
pub mod truthy;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod wait;

pub use browser::console::{ConsoleFilter, ConsoleLevel, ConsoleMessage};
pub use browser::fetch::{
    CapturedRequest, FetchFailure, FetchRequest, HttpMethod, MockFetch, MockResponse, Reply,
    Route, UrlPattern,
};
pub use browser::location::{MockLocation, Navigation, NavigationKind};
pub use browser::media::{ListenerId, MatchMedia, MediaQueryChange, MediaQueryList};
pub use browser::navigator::{MockClipboard, MockNavigator};
pub use browser::observer::{MockObserver, ObserverEntry, ObserverKind, Observers};
pub use browser::service_worker::{ServiceWorkerContainer, ServiceWorkerRegistration};
pub use browser::storage::{MockStorage, StorageArea};
pub use browser::BrowserEnv;
pub use config::{ConsoleConfig, HarnessConfig, HarnessConfigBuilder};
pub use fixture::{Fixture, FixtureManager, FixtureScope, FixtureState};
pub use result::{HeadlessError, HeadlessResult};
pub use truthy::Truthy;
pub use wait::{
    try_wait_for, wait_for, wait_for_timeout, wait_until, PollAttempt, PollState, Poller,
    Resolved, WaitError, WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
    MIN_POLL_INTERVAL_MS, TIMEOUT_MESSAGE,
};
