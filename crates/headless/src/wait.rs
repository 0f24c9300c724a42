//! Async Wait Mechanisms
//!
//! Polls a caller-supplied probe until it yields a truthy value or the
//! deadline passes. Each recheck is a `tokio::time::sleep`, so a waiting
//! test never blocks the runtime and concurrent waits stay independent.
//!
//! Probe errors raised before the deadline are swallowed and retried. Once
//! the deadline has passed, a falsy result surfaces as
//! [`WaitError::Timeout`] while a probe error surfaces unchanged as
//! [`WaitError::Probe`].
//!
//! ```ignore
//! let storage = env.local_storage.clone();
//! let token = wait_for_timeout(
//!     || {
//!         let storage = storage.clone();
//!         async move { storage.get_item("token") }
//!     },
//!     1_000,
//! )
//! .await?;
//! ```

use crate::result::HeadlessError;
use crate::truthy::Truthy;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Fixed delay between probe attempts (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Shortest delay between attempts; a zero interval would never yield to
/// the timer under paused time
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

/// Message carried by [`WaitError::Timeout`]
pub const TIMEOUT_MESSAGE: &str = "Timeout waiting for async condition";

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds, raised to at least
    /// [`MIN_POLL_INTERVAL_MS`]
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = clamp_interval(poll_interval_ms);
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(clamp_interval(self.poll_interval_ms))
    }
}

const fn clamp_interval(ms: u64) -> u64 {
    if ms < MIN_POLL_INTERVAL_MS {
        MIN_POLL_INTERVAL_MS
    } else {
        ms
    }
}

// =============================================================================
// WAIT ERROR
// =============================================================================

/// Terminal failure of a wait.
#[derive(Debug, Error)]
pub enum WaitError<E> {
    /// Deadline passed while the probe kept returning falsy values
    #[error("Timeout waiting for async condition")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Deadline passed and the last probe attempt failed; the probe's own
    /// error is forwarded as-is
    #[error("{0}")]
    Probe(E),
}

impl<E> WaitError<E> {
    /// Whether this is the synthetic timeout failure
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Take the probe's error, if that is what ended the wait
    #[must_use]
    pub fn into_probe_error(self) -> Option<E> {
        match self {
            Self::Probe(error) => Some(error),
            Self::Timeout { .. } => None,
        }
    }
}

impl From<WaitError<Infallible>> for HeadlessError {
    fn from(err: WaitError<Infallible>) -> Self {
        match err {
            WaitError::Timeout { ms } => Self::Timeout { ms },
            WaitError::Probe(never) => match never {},
        }
    }
}

impl From<WaitError<HeadlessError>> for HeadlessError {
    fn from(err: WaitError<HeadlessError>) -> Self {
        match err {
            WaitError::Timeout { ms } => Self::Timeout { ms },
            WaitError::Probe(inner) => inner,
        }
    }
}

// =============================================================================
// POLL STATE
// =============================================================================

/// Lifecycle of a single wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollState {
    /// Still polling
    Pending,
    /// Probe produced a truthy value
    Succeeded,
    /// Deadline passed with a falsy probe result
    TimedOut,
    /// Deadline passed with a failing probe
    Failed,
}

impl PollState {
    /// Whether no further attempts may follow
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Get the state name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// POLL ATTEMPT
// =============================================================================

/// Bookkeeping for one wait: start time, budget and attempt count.
///
/// `started` is captured once and never reset.
#[derive(Debug, Clone, Copy)]
pub struct PollAttempt {
    started: Instant,
    budget: Duration,
    retry_interval: Duration,
    attempts: u32,
}

impl PollAttempt {
    /// Start the clock for a new wait
    #[must_use]
    pub fn start(options: &WaitOptions) -> Self {
        Self {
            started: Instant::now(),
            budget: options.timeout(),
            retry_interval: options.poll_interval(),
            attempts: 0,
        }
    }

    /// Count one more probe invocation, returning its 1-based index
    pub fn record(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Number of probe invocations so far
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// When the first attempt was made
    #[must_use]
    pub const fn started(&self) -> Instant {
        self.started
    }

    /// Maximum duration of the wait
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.budget
    }

    /// Delay before the next attempt
    #[must_use]
    pub const fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Time since the first attempt
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the budget has been used up
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.budget
    }

    /// State after an attempt produced `outcome`
    #[must_use]
    pub fn settle<V: Truthy, E>(&self, outcome: &Result<V, E>) -> PollState {
        match outcome {
            Ok(value) if value.is_truthy() => PollState::Succeeded,
            Ok(_) if self.is_expired() => PollState::TimedOut,
            Err(_) if self.is_expired() => PollState::Failed,
            _ => PollState::Pending,
        }
    }
}

// =============================================================================
// RESOLVED
// =============================================================================

/// A successful wait together with how long it took
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<V> {
    /// The truthy value the probe produced
    pub value: V,
    /// Number of probe invocations, including the successful one
    pub attempts: u32,
    /// Time spent waiting
    pub elapsed: Duration,
}

impl<V> Resolved<V> {
    /// Discard the timing data
    pub fn into_value(self) -> V {
        self.value
    }
}

// =============================================================================
// POLLER
// =============================================================================

/// Polls probes with fixed-interval rechecks until success or timeout
#[derive(Debug, Clone, Default)]
pub struct Poller {
    options: WaitOptions,
    label: Option<String>,
}

impl Poller {
    /// Create a poller with the default 5s timeout and 100ms interval
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub fn with_options(options: WaitOptions) -> Self {
        Self {
            options,
            label: None,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.options.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.options = self.options.with_poll_interval(poll_interval_ms);
        self
    }

    /// Name what is being waited for, used in log events
    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Current options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("async condition")
    }

    /// Poll a fallible probe, returning the value with attempt/timing data.
    pub async fn poll_detailed<F, Fut, V, E>(&self, mut probe: F) -> Result<Resolved<V>, WaitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        V: Truthy,
    {
        let mut attempt = PollAttempt::start(&self.options);

        loop {
            let index = attempt.record();
            let outcome = probe().await;

            match (attempt.settle(&outcome), outcome) {
                (PollState::Succeeded, Ok(value)) => {
                    let elapsed = attempt.elapsed();
                    tracing::debug!(
                        target: "jugar_headless::wait",
                        waiting_for = self.label(),
                        attempts = index,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "condition satisfied"
                    );
                    return Ok(Resolved {
                        value,
                        attempts: index,
                        elapsed,
                    });
                }
                (PollState::Failed, Err(error)) => {
                    tracing::debug!(
                        target: "jugar_headless::wait",
                        waiting_for = self.label(),
                        attempts = index,
                        "probe failed after deadline"
                    );
                    return Err(WaitError::Probe(error));
                }
                (PollState::Pending, Err(_)) => {
                    tracing::trace!(
                        target: "jugar_headless::wait",
                        waiting_for = self.label(),
                        attempt = index,
                        "probe error swallowed before deadline"
                    );
                }
                (PollState::Pending, Ok(_)) => {
                    tracing::trace!(
                        target: "jugar_headless::wait",
                        waiting_for = self.label(),
                        attempt = index,
                        "condition not yet satisfied"
                    );
                }
                (state, _) => {
                    debug_assert_eq!(state, PollState::TimedOut);
                    tracing::debug!(
                        target: "jugar_headless::wait",
                        waiting_for = self.label(),
                        attempts = index,
                        timeout_ms = self.options.timeout_ms,
                        "{}",
                        TIMEOUT_MESSAGE
                    );
                    return Err(WaitError::Timeout {
                        ms: self.options.timeout_ms,
                    });
                }
            }

            tokio::time::sleep(attempt.retry_interval()).await;
        }
    }

    /// Poll a fallible probe until it yields a truthy value.
    pub async fn poll<F, Fut, V, E>(&self, probe: F) -> Result<V, WaitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        V: Truthy,
    {
        self.poll_detailed(probe).await.map(Resolved::into_value)
    }

    /// Poll a probe that cannot fail.
    pub async fn poll_value<F, Fut, V>(&self, mut probe: F) -> Result<V, WaitError<Infallible>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = V>,
        V: Truthy,
    {
        self.poll(move || {
            let pending = probe();
            async move { Ok::<V, Infallible>(pending.await) }
        })
        .await
    }
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Wait for a probe with the default 5s timeout.
pub async fn wait_for<F, Fut, V>(probe: F) -> Result<V, WaitError<Infallible>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = V>,
    V: Truthy,
{
    Poller::new().poll_value(probe).await
}

/// Wait for a probe with an explicit timeout.
pub async fn wait_for_timeout<F, Fut, V>(probe: F, timeout_ms: u64) -> Result<V, WaitError<Infallible>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = V>,
    V: Truthy,
{
    Poller::new().with_timeout(timeout_ms).poll_value(probe).await
}

/// Wait for a fallible probe; errors before the deadline are retried.
pub async fn try_wait_for<F, Fut, V, E>(probe: F, timeout_ms: u64) -> Result<V, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<V, E>>,
    V: Truthy,
{
    Poller::new().with_timeout(timeout_ms).poll(probe).await
}

/// Wait for a synchronous predicate to hold
pub async fn wait_until<F>(mut predicate: F, timeout_ms: u64) -> crate::result::HeadlessResult<()>
where
    F: FnMut() -> bool,
{
    wait_for_timeout(move || std::future::ready(predicate()), timeout_ms).await?;
    Ok(())
}
