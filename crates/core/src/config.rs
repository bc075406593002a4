// Configuration
//
// Runtime tuning for the poller and the toast coordinator, loaded from
// environment variables with built-in defaults.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::poller::PollerConfig;
use crate::toast::ToastConfig;

/// Top-level configuration for the notification core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PulseConfig {
    pub poller: PollerConfig,
    pub toast: ToastConfig,
}

impl PulseConfig {
    /// Load configuration from environment variables.
    ///
    /// Invalid values are logged and replaced by defaults.
    ///
    /// Environment variables:
    /// - `PULSE_POLL_INTERVAL_MS`: periodic refresh interval (default: 30000)
    /// - `PULSE_FRESHNESS_WINDOW_SECS`: max age of a "new" notification (default: 60)
    /// - `PULSE_TOAST_HOLD_MS`: default visible duration of a toast (default: 3000)
    /// - `PULSE_TOAST_EXIT_MS`: exit animation budget (default: 500)
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|e| {
            warn!(error = %e, "Invalid notification config, using defaults");
            Self::default()
        })
    }

    /// Strict variant of [`PulseConfig::from_env`].
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_u64(&lookup, "PULSE_POLL_INTERVAL_MS")? {
            config.poller = config
                .poller
                .with_interval(Duration::from_millis(ms.max(1)));
        }
        if let Some(secs) = parse_u64(&lookup, "PULSE_FRESHNESS_WINDOW_SECS")? {
            config.poller = config
                .poller
                .with_freshness_window(Duration::from_secs(secs));
        }
        if let Some(ms) = parse_u64(&lookup, "PULSE_TOAST_HOLD_MS")? {
            config.toast.default_hold = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(&lookup, "PULSE_TOAST_EXIT_MS")? {
            config.toast.exit_duration = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn parse_u64<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}

/// Serde support for Duration as milliseconds
pub mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
