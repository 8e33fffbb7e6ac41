//! Membership service configuration.
//!
//! Invitation lifetime, acceptance link base, sweep cadence, storage timeout and
//! password policy. Configuration is loaded from environment variables with
//! defaults suitable for local development.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Longest accepted invitation lifetime (one year).
pub const MAX_INVITATION_TTL_HOURS: i64 = 24 * 365;

impl ConfigError {
    fn invalid(key: &str, message: &str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

/// Configuration for the membership services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Hours an invitation stays valid.
    pub invitation_ttl_hours: i64,

    /// Base URL of the acceptance page (e.g., "https://app.example.com").
    pub invitation_base_url: String,

    /// Seconds between expiry sweeps.
    pub sweep_interval_secs: u64,

    /// Timeout for a single storage call, in milliseconds.
    pub store_timeout_ms: u64,

    /// Minimum accepted password length.
    pub min_password_length: usize,

    /// Attempts for a guarded write that keeps losing the administrator count race.
    pub guarded_write_attempts: u32,
}

impl Default for RosterConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            invitation_ttl_hours: 24,
            invitation_base_url: "http://localhost:3000".to_string(),
            sweep_interval_secs: 3600,
            store_timeout_ms: 5000,
            min_password_length: 3,
            guarded_write_attempts: 3,
        }
    }
}

impl RosterConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ROSTER_INVITATION_TTL_HOURS`: Invitation lifetime (default: 24)
    /// - `ROSTER_INVITATION_BASE_URL`: Acceptance page base (default: http://localhost:3000)
    /// - `ROSTER_SWEEP_INTERVAL_SECS`: Expiry sweep interval (default: 3600)
    /// - `ROSTER_STORE_TIMEOUT_MS`: Storage call timeout (default: 5000)
    /// - `ROSTER_MIN_PASSWORD_LENGTH`: Minimum password length (default: 3)
    /// - `ROSTER_GUARDED_WRITE_ATTEMPTS`: Guarded write attempts (default: 3)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a value fails [`RosterConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();

        let config = Self {
            invitation_ttl_hours: env_parse("ROSTER_INVITATION_TTL_HOURS")
                .unwrap_or(default.invitation_ttl_hours),
            invitation_base_url: std::env::var("ROSTER_INVITATION_BASE_URL")
                .unwrap_or(default.invitation_base_url),
            sweep_interval_secs: env_parse("ROSTER_SWEEP_INTERVAL_SECS")
                .unwrap_or(default.sweep_interval_secs),
            store_timeout_ms: env_parse("ROSTER_STORE_TIMEOUT_MS")
                .unwrap_or(default.store_timeout_ms),
            min_password_length: env_parse("ROSTER_MIN_PASSWORD_LENGTH")
                .unwrap_or(default.min_password_length),
            guarded_write_attempts: env_parse("ROSTER_GUARDED_WRITE_ATTEMPTS")
                .unwrap_or(default.guarded_write_attempts),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.invitation_ttl_hours <= 0 {
            return Err(ConfigError::invalid(
                "ROSTER_INVITATION_TTL_HOURS",
                "must be positive",
            ));
        }
        if self.invitation_ttl_hours > MAX_INVITATION_TTL_HOURS {
            return Err(ConfigError::invalid(
                "ROSTER_INVITATION_TTL_HOURS",
                &format!("must be at most {}", MAX_INVITATION_TTL_HOURS),
            ));
        }
        if self.invitation_base_url.trim().is_empty() {
            return Err(ConfigError::invalid(
                "ROSTER_INVITATION_BASE_URL",
                "must not be empty",
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "ROSTER_SWEEP_INTERVAL_SECS",
                "must be positive",
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "ROSTER_STORE_TIMEOUT_MS",
                "must be positive",
            ));
        }
        if self.guarded_write_attempts == 0 {
            return Err(ConfigError::invalid(
                "ROSTER_GUARDED_WRITE_ATTEMPTS",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Invitation lifetime, clamped to 1..=[`MAX_INVITATION_TTL_HOURS`] hours.
    pub fn invitation_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.invitation_ttl_hours.clamp(1, MAX_INVITATION_TTL_HOURS))
    }

    /// Interval between expiry sweeps, at least one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Timeout for one storage call.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Build the acceptance link for `token`.
    pub fn acceptance_url(&self, token: &str) -> String {
        let base = self.invitation_base_url.trim_end_matches('/');
        format!("{}/accept-invitation?token={}", base, token)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RosterConfig::default();
        assert_eq!(config.invitation_ttl_hours, 24);
        assert_eq!(config.sweep_interval(), Duration::from_secs(3600));
        assert_eq!(config.store_timeout(), Duration::from_millis(5000));
        assert_eq!(config.min_password_length, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_acceptance_url() {
        let mut config = RosterConfig::default();
        config.invitation_base_url = "https://app.example.com/".to_string();

        assert_eq!(
            config.acceptance_url("abc"),
            "https://app.example.com/accept-invitation?token=abc"
        );
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = RosterConfig::default();
        config.invitation_ttl_hours = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "ROSTER_INVITATION_TTL_HOURS"
        ));

        let mut config = RosterConfig::default();
        config.guarded_write_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = RosterConfig::default();
        config.invitation_base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_ttl() {
        let mut config = RosterConfig::default();
        config.invitation_ttl_hours = MAX_INVITATION_TTL_HOURS;
        assert!(config.validate().is_ok());

        config.invitation_ttl_hours = 9_000_000_000_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "ROSTER_INVITATION_TTL_HOURS"
        ));
    }

    #[test]
    fn test_derived_durations_never_panic() {
        let config = RosterConfig {
            invitation_ttl_hours: 9_000_000_000_000,
            sweep_interval_secs: 0,
            ..RosterConfig::default()
        };
        assert_eq!(
            config.invitation_ttl(),
            chrono::Duration::hours(MAX_INVITATION_TTL_HOURS)
        );
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));

        let config = RosterConfig {
            invitation_ttl_hours: -5,
            ..RosterConfig::default()
        };
        assert_eq!(config.invitation_ttl(), chrono::Duration::hours(1));
    }

    #[test]
    fn test_from_env_validates() {
        std::env::set_var("ROSTER_SWEEP_INTERVAL_SECS", "0");
        let result = RosterConfig::from_env();
        std::env::remove_var("ROSTER_SWEEP_INTERVAL_SECS");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "ROSTER_SWEEP_INTERVAL_SECS"
        ));
    }
}
