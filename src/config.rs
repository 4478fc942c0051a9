//! # Loader Configuration Management
//!
//! Environment-aware configuration for the batch loader. Controls how the
//! coalescing window is deferred and whether flushes carry a timeout bound.
//! Defaults come from the detected environment and individual fields can be
//! overridden through `LOADER_*` environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for batch loader flush behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Deferral applied before a scheduled flush fires, in milliseconds.
    ///
    /// `None` defers to the next runtime suspension point (a single yield),
    /// which makes the coalescing window "the current synchronous burst of
    /// load calls". A bounded delay is the conservative approximation for
    /// hosts where that distinction is too fine-grained to rely on.
    pub flush_delay_ms: Option<u64>,

    /// Upper bound on one batch function invocation, in milliseconds.
    ///
    /// On expiry the in-flight flush is treated as a failure with a timeout
    /// error kind. `None` leaves the invocation unbounded.
    pub flush_timeout_ms: Option<u64>,
}

impl Default for LoaderConfig {
    /// Default configuration: yield-based coalescing, no flush timeout
    fn default() -> Self {
        Self {
            flush_delay_ms: None,
            flush_timeout_ms: None,
        }
    }
}

impl LoaderConfig {
    /// Create test-optimized configuration with a tight flush bound
    pub fn for_test() -> Self {
        Self {
            flush_delay_ms: None,
            flush_timeout_ms: Some(1_000),
        }
    }

    /// Load configuration from environment or use defaults
    pub fn from_environment() -> Self {
        let environment = env::var("LOADER_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "production".to_string());

        let config = match environment.as_str() {
            "test" => {
                info!("Loading test loader configuration (bounded flushes)");
                Self::for_test()
            }
            _ => Self::default(),
        };

        config.with_env_overrides()
    }

    /// Apply environment variable overrides to configuration
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(delay) = env::var("LOADER_FLUSH_DELAY_MS") {
            if let Ok(ms) = delay.parse::<u64>() {
                self.flush_delay_ms = Some(ms);
                info!("Flush delay override: {}ms", ms);
            }
        }

        if let Ok(timeout) = env::var("LOADER_FLUSH_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                self.flush_timeout_ms = Some(ms);
                info!("Flush timeout override: {}ms", ms);
            }
        }

        self
    }

    /// Get the flush deferral as a Duration, if a bounded delay is configured
    pub fn flush_delay(&self) -> Option<Duration> {
        self.flush_delay_ms.map(Duration::from_millis)
    }

    /// Get the flush timeout as a Duration, if configured
    pub fn flush_timeout(&self) -> Option<Duration> {
        self.flush_timeout_ms.map(Duration::from_millis)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.flush_timeout_ms == Some(0) {
            return Err("Flush timeout must be greater than 0 when set".to_string());
        }

        if let Some(delay) = self.flush_delay_ms {
            if delay > 1_000 {
                warn!(
                    "Flush delay of {}ms stalls every first load in a scope by that long",
                    delay
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoaderConfig::default();
        assert_eq!(config.flush_delay_ms, None);
        assert_eq!(config.flush_timeout_ms, None);
        assert!(config.flush_delay().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_test_config() {
        let config = LoaderConfig::for_test();
        assert_eq!(config.flush_timeout(), Some(Duration::from_secs(1)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = LoaderConfig {
            flush_delay_ms: None,
            flush_timeout_ms: Some(0),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("LOADER_FLUSH_DELAY_MS", "5");
        std::env::set_var("LOADER_FLUSH_TIMEOUT_MS", "250");
        let config = LoaderConfig::default().with_env_overrides();
        assert_eq!(config.flush_delay_ms, Some(5));
        assert_eq!(config.flush_timeout_ms, Some(250));
        std::env::remove_var("LOADER_FLUSH_DELAY_MS");
        std::env::remove_var("LOADER_FLUSH_TIMEOUT_MS");
    }
}
