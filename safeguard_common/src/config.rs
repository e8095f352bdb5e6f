//! Configuration loading traits and types.
//!
//! Every safeguard consumer reads its settings from a single TOML file. The
//! [`ConfigLoader`] trait is implemented for any deserializable type, and
//! semantic checks are expressed through [`Validate`] so that loading and
//! validating happen in one call.
//!
//! # Usage
//!
//! ```rust,no_run
//! use safeguard_common::config::{ConfigError, ConfigLoader, SharedConfig};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct DemoConfig {
//!     shared: SharedConfig,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = DemoConfig::load(Path::new("safeguard.toml"))?;
//!     config.shared.validate()?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Reading or TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Verbosity of the log output.
///
/// Lowercase in TOML (`log_level = "debug"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Every handler dispatch and release.
    Trace,
    /// Raised signals and recovery attempts.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Discarded results, un-finalized resources, tripped self-checks.
    Warn,
    /// Terminations and contract violations only.
    Error,
}

impl LogLevel {
    /// The `EnvFilter` directive matching this level.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Shape of the log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Fields every safeguard configuration embeds.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// log_format = "json"
/// service_name = "safeguard-demo"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Name attached to log output.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
            service_name: "safeguard".to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty
    /// or only whitespace.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Semantic validation run after deserialization.
pub trait Validate {
    /// Check cross-field constraints that serde cannot express.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Loading of configuration from TOML.
///
/// - `ConfigError::FileNotFound` if the file does not exist
/// - `ConfigError::ParseError` if reading fails or the TOML is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from an in-memory TOML document.
    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load, then run [`Validate::validate`].
    fn load_validated(path: &Path) -> Result<Self, ConfigError>
    where
        Self: Validate,
    {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        level: LogLevel,
    }

    #[test]
    fn log_level_defaults_to_info() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn log_level_parses_lowercase() {
        for (text, expected) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed = Wrapper::from_toml_str(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, expected);
            assert_eq!(expected.as_directive(), text);
        }
    }

    #[test]
    fn log_level_rejects_uppercase() {
        let result = Wrapper::from_toml_str("level = \"DEBUG\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn log_level_maps_to_tracing_level() {
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
        assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
    }

    #[test]
    fn shared_config_rejects_blank_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            log_format: LogFormat::Text,
            service_name: "   ".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(SharedConfig::default().validate().is_ok());
    }

    #[test]
    fn loader_reports_missing_file() {
        let result = Wrapper::load(Path::new("/nonexistent/safeguard.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(p)) if p.contains("safeguard.toml")));
    }

    #[test]
    fn loader_reports_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "level = {{{{").unwrap();
        let result = Wrapper::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn load_validated_runs_validation() {
        #[derive(Debug, Deserialize)]
        struct Demo {
            shared: SharedConfig,
        }
        impl Validate for Demo {
            fn validate(&self) -> Result<(), ConfigError> {
                self.shared.validate()
            }
        }

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[shared]\nservice_name = \"\"\n").unwrap();
        file.flush().unwrap();

        let result = Demo::load_validated(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
