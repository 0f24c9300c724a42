//! `console` stand-in that drops known-noisy messages.
//!
//! Messages matching a suppression pattern are counted and discarded.
//! Everything else is kept for assertions and re-emitted as a `tracing`
//! event at the matching level.

use crate::result::{HeadlessError, HeadlessResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Framework warnings that drown out real failures in headless runs
pub const DEFAULT_SUPPRESS_PATTERNS: &[&str] = &[
    r"Warning: ReactDOM\.render is no longer supported",
    r"not wrapped in act\(",
    r"componentWillReceiveProps has been renamed",
];

/// Console method a message was written with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsoleLevel {
    /// `console.debug`
    Debug,
    /// `console.log`
    Log,
    /// `console.info`
    Info,
    /// `console.warn`
    Warn,
    /// `console.error`
    Error,
}

impl ConsoleLevel {
    /// Get the console method name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Log => "log",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// A message that passed the filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    /// Console method used
    pub level: ConsoleLevel,
    /// Message text
    pub text: String,
}

/// Filtering `console`; clones share captured messages
#[derive(Debug, Clone)]
pub struct ConsoleFilter {
    patterns: Arc<Vec<Regex>>,
    capture: bool,
    captured: Arc<Mutex<Vec<ConsoleMessage>>>,
    suppressed: Arc<AtomicUsize>,
}

impl Default for ConsoleFilter {
    fn default() -> Self {
        Self::from_regexes(
            DEFAULT_SUPPRESS_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
            true,
        )
    }
}

impl ConsoleFilter {
    /// Build a filter from regex source patterns
    ///
    /// # Errors
    ///
    /// Returns [`HeadlessError::Config`] if a pattern does not compile.
    pub fn new<S: AsRef<str>>(patterns: &[S], capture: bool) -> HeadlessResult<Self> {
        let compiled = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| {
                    HeadlessError::config(format!(
                        "invalid console pattern '{}': {e}",
                        p.as_ref()
                    ))
                })
            })
            .collect::<HeadlessResult<Vec<_>>>()?;
        Ok(Self::from_regexes(compiled, capture))
    }

    fn from_regexes(patterns: Vec<Regex>, capture: bool) -> Self {
        Self {
            patterns: Arc::new(patterns),
            capture,
            captured: Arc::new(Mutex::new(Vec::new())),
            suppressed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Whether `text` matches a suppression pattern
    #[must_use]
    pub fn is_suppressed(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    /// Write a message; returns `false` if it was suppressed
    pub fn write(&self, level: ConsoleLevel, text: &str) -> bool {
        if self.is_suppressed(text) {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        match level {
            ConsoleLevel::Debug => tracing::debug!(target: "jugar_headless::console", "{text}"),
            ConsoleLevel::Log | ConsoleLevel::Info => {
                tracing::info!(target: "jugar_headless::console", "{text}");
            }
            ConsoleLevel::Warn => tracing::warn!(target: "jugar_headless::console", "{text}"),
            ConsoleLevel::Error => tracing::error!(target: "jugar_headless::console", "{text}"),
        }

        if self.capture {
            self.captured
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(ConsoleMessage {
                    level,
                    text: text.to_string(),
                });
        }
        true
    }

    /// `console.log`
    pub fn log(&self, text: &str) -> bool {
        self.write(ConsoleLevel::Log, text)
    }

    /// `console.warn`
    pub fn warn(&self, text: &str) -> bool {
        self.write(ConsoleLevel::Warn, text)
    }

    /// `console.error`
    pub fn error(&self, text: &str) -> bool {
        self.write(ConsoleLevel::Error, text)
    }

    /// Messages that passed the filter
    #[must_use]
    pub fn captured(&self) -> Vec<ConsoleMessage> {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captured messages of one level
    #[must_use]
    pub fn captured_at(&self, level: ConsoleLevel) -> Vec<ConsoleMessage> {
        self.captured()
            .into_iter()
            .filter(|m| m.level == level)
            .collect()
    }

    /// Number of suppressed messages
    #[must_use]
    pub fn suppressed_count(&self) -> usize {
        self.suppressed.load(Ordering::Relaxed)
    }

    /// Forget captured messages and the suppression count
    pub fn clear(&self) {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.suppressed.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns_compile() {
        let filter = ConsoleFilter::default();
        assert_eq!(filter.patterns.len(), DEFAULT_SUPPRESS_PATTERNS.len());
    }

    #[test]
    fn test_known_noise_is_suppressed() {
        let filter = ConsoleFilter::default();
        assert!(!filter.error("Warning: An update to App inside a test was not wrapped in act(...)."));
        assert!(!filter.error("Warning: ReactDOM.render is no longer supported in React 18."));
        assert_eq!(filter.suppressed_count(), 2);
        assert!(filter.captured().is_empty());
    }

    #[test]
    fn test_other_messages_captured() {
        let filter = ConsoleFilter::default();
        assert!(filter.warn("deprecated prop"));
        assert!(filter.log("hello"));
        assert_eq!(filter.captured().len(), 2);
        assert_eq!(filter.captured_at(ConsoleLevel::Warn)[0].text, "deprecated prop");
    }

    #[test]
    fn test_custom_patterns_and_no_capture() {
        let filter = ConsoleFilter::new(&["^chart:"], false).unwrap();
        assert!(!filter.log("chart: rendered"));
        assert!(filter.log("table: rendered"));
        assert!(filter.captured().is_empty());
        assert_eq!(filter.suppressed_count(), 1);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ConsoleFilter::new(&["("], true).unwrap_err();
        assert!(matches!(err, HeadlessError::Config { .. }));
    }

    #[test]
    fn test_clear() {
        let filter = ConsoleFilter::default();
        filter.log("x");
        let _ = filter.error("not wrapped in act(");
        filter.clear();
        assert!(filter.captured().is_empty());
        assert_eq!(filter.suppressed_count(), 0);
    }
}
