//! Logging setup.
//!
//! Installs a `tracing-subscriber` formatter whose filter combines
//! `RUST_LOG` with the configured [`LogLevel`], writing text or JSON per
//! [`LogFormat`]. Installation is idempotent:
//! only the first call in a process takes effect, later calls report
//! `false` and leave the existing subscriber in place.

use crate::config::{LogFormat, LogLevel, SharedConfig};
use tracing_subscriber::EnvFilter;

/// Build the filter used by every safeguard subscriber.
pub fn build_filter(level: LogLevel) -> EnvFilter {
    let level: tracing::Level = level.into();
    EnvFilter::from_default_env().add_directive(level.into())
}

/// Install the global subscriber.
///
/// Returns `true` if this call installed it.
pub fn init_tracing(level: LogLevel, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_target(false)
        .with_line_number(true);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}

/// Install the global subscriber described by `shared`.
pub fn init_from_config(shared: &SharedConfig) -> bool {
    let installed = init_tracing(shared.log_level, shared.log_format);
    if installed {
        tracing::info!(service = %shared.service_name, format = ?shared.log_format, "logging initialised");
    }
    installed
}

/// Install a subscriber that writes through the test harness capture.
///
/// Intended for `#[test]` functions; safe to call from every test.
pub fn init_test_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(LogLevel::Debug))
        .with_test_writer()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_a_noop() {
        let _ = init_test_tracing();
        assert!(!init_test_tracing());
        assert!(!init_tracing(LogLevel::Error, LogFormat::Json));
        assert!(!init_from_config(&SharedConfig::default()));
    }

    #[test]
    fn filter_includes_configured_level() {
        let filter = build_filter(LogLevel::Warn);
        assert!(filter.to_string().contains("warn"));
    }
}
