//! Synchronization configuration.

use std::time::Duration;

/// Configuration for the partition-state synchronization manager.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay before resending after a top-level retryable error.
    pub retry_backoff: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_backoff: Duration::from_millis(50),
        }
    }
}

impl SyncConfig {
    /// Creates a configuration with the given retry backoff.
    #[must_use]
    pub const fn new(retry_backoff: Duration) -> Self {
        Self { retry_backoff }
    }

    /// Creates a configuration suitable for testing (short backoff).
    #[must_use]
    pub const fn fast_for_testing() -> Self {
        Self {
            retry_backoff: Duration::from_millis(5),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A zero backoff would hot-loop against an unhealthy controller.
        if self.retry_backoff.is_zero() {
            return Err(ConfigError::InvalidBackoff {
                message: "retry_backoff must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid retry backoff.
    InvalidBackoff {
        /// Error description.
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBackoff { message } => write!(f, "invalid backoff: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}
