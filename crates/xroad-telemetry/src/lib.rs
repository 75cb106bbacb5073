//! Logging and metrics for the X-Road protocol adapter.
//!
//! - **Logging**: a `tracing-subscriber` registry with an `EnvFilter` and a
//!   JSON or pretty formatter, see [`init_logging`].
//! - **Metrics**: counters emitted through the `metrics` facade. The library
//!   never installs an exporter; applications pick their own recorder.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `xroad_wsdl_cache_hits_total` | Counter | `backend` | Service descriptions served from cache |
//! | `xroad_wsdl_cache_misses_total` | Counter | `backend` | Lookups that went to the network |
//! | `xroad_wsdl_cache_errors_total` | Counter | `backend`, `op` | Backend failures downgraded to a miss |
//! | `xroad_wsdl_fetches_total` | Counter | `status` | Service-description downloads |
//!
//! # Example
//!
//! ```rust,ignore
//! use xroad_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(service = "EE/GOV/5678/SUB/getData", "client ready");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
