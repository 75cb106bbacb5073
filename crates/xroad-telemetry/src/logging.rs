//! `tracing` subscriber setup.
//!
//! Logs go to stderr so that CLI output on stdout stays machine readable.
//!
//! ```rust,ignore
//! use xroad_telemetry::logging::{init_logging, LogConfig, LogFormat};
//!
//! let config = LogConfig { level: "xroad_wsdl=debug,info".into(), format: LogFormat::Json, ..LogConfig::default() };
//! init_logging(&config)?;
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human readable.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// JSON lines.
    Json,
}

/// The `[logging]` section of the client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Skip subscriber installation entirely.
    pub enabled: bool,
    /// `EnvFilter` directive, e.g. `info` or `xroad_client=debug,warn`.
    pub level: String,
    /// Line format.
    pub format: LogFormat,
    /// Log span close events with their timings.
    pub span_timings: bool,
    /// Attach source file and line.
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "warn,xroad_client=info".to_string(),
            format: LogFormat::Compact,
            span_timings: false,
            source_location: false,
        }
    }
}

impl LogConfig {
    /// Pretty output with every adapter crate at `debug`.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "info,xroad_core=debug,xroad_cache=debug,xroad_wsdl=debug,xroad_middleware=debug,xroad_client=debug"
                .to_string(),
            format: LogFormat::Pretty,
            source_location: true,
            ..Self::default()
        }
    }

    /// JSON lines at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            ..Self::default()
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// Fails on an invalid filter or when a global subscriber already exists.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let spans = if config.span_timings { FmtSpan::CLOSE } else { FmtSpan::NONE };
    let base = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(spans)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let layer = match config.format {
        LogFormat::Pretty => base.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => base.compact().with_filter(filter).boxed(),
        LogFormat::Json => base.json().with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses a filter directive.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| TelemetryError::InvalidFilter(format!("{directive}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(create_env_filter(&config.level).is_ok());
    }

    #[test]
    fn test_presets_have_valid_filters() {
        let dev = LogConfig::development();
        assert_eq!(dev.format, LogFormat::Pretty);
        assert!(create_env_filter(&dev.level).is_ok());

        let prod = LogConfig::production();
        assert_eq!(prod.format, LogFormat::Json);
        assert!(!prod.source_location);
    }

    #[test]
    fn test_invalid_filter() {
        assert!(matches!(
            create_env_filter("xroad=notalevel"),
            Err(TelemetryError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_section_from_toml_shape() {
        let config: LogConfig = serde_json::from_str(r#"{"level": "debug", "format": "json"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.enabled);
        assert!(!config.span_timings);
    }

    #[test]
    fn test_disabled_logging_is_noop() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
