//! Telemetry and observability infrastructure
//!
//! TigerStyle: Explicit telemetry configuration with bounded resource usage.
//!
//! The runtime itself only emits `tracing` events; this module wires a
//! subscriber for binaries and examples that want to see them.

use crate::error::{Error, Result};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level filter (tracing `EnvFilter` syntax)
    pub log_level: String,
    /// Whether to include thread names in output (useful: one thread per entity)
    pub thread_names: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            thread_names: true,
        }
    }
}

impl TelemetryConfig {
    /// Set the log level filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Disable thread names in output
    pub fn without_thread_names(mut self) -> Self {
        self.thread_names = false;
        self
    }

    /// Create from environment variables
    ///
    /// Reads `RUST_LOG` for the level filter (default: "info").
    pub fn from_env() -> Self {
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        Self {
            log_level,
            thread_names: true,
        }
    }
}

/// Initialize the tracing subscriber
///
/// Sets up a fmt layer with an env filter. Fails if a global subscriber is
/// already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_thread_names(config.thread_names)
        .try_init()
        .map_err(|e| Error::internal(format!("failed to initialize tracing subscriber: {}", e)))?;

    tracing::debug!(log_level = %config.log_level, "telemetry initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(config.thread_names);
    }

    #[test]
    fn test_telemetry_config_builder() {
        let config = TelemetryConfig::default()
            .with_log_level("debug")
            .without_thread_names();

        assert_eq!(config.log_level, "debug");
        assert!(!config.thread_names);
    }
}
