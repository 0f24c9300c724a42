//! Subscriber installation for test runs.
//!
//! The crate only emits `tracing` events; nothing is printed unless a test
//! binary installs a subscriber. `RUST_LOG` wins over the configured filter.

use crate::config::{HarnessConfig, DEFAULT_LOG_FILTER};
use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Install a subscriber with the default filter.
///
/// Returns `false` if a global subscriber was already installed, which is
/// the normal case for every test after the first.
pub fn init() -> bool {
    init_with_filter(DEFAULT_LOG_FILTER, LogFormat::Pretty)
}

/// Install a subscriber using `config.log_filter`.
pub fn init_from_config(config: &HarnessConfig) -> bool {
    init_with_filter(&config.log_filter, LogFormat::Pretty)
}

/// Install a subscriber with an explicit filter and format.
pub fn init_with_filter(filter: &str, format: LogFormat) -> bool {
    let env_filter = build_filter(filter);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_test_writer();

    let installed = match format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };
    if installed {
        tracing::debug!(target: "jugar_headless::logging", filter, ?format, "subscriber installed");
    }
    installed
}

fn build_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_a_no_op() {
        let _ = init();
        assert!(!init());
        assert!(!init_with_filter("debug", LogFormat::Json));
    }

    #[test]
    fn test_bad_filter_falls_back() {
        // Must not panic on an unparsable directive.
        let _ = build_filter("jugar_headless=[");
    }
}
