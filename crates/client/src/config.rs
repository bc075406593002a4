// Client configuration
//
// Loaded from PULSE_* environment variables; the CLI overrides individual
// fields from its flags.

use std::env;
use std::time::Duration;

use crate::error::ClientError;
use crate::retry::RetryPolicy;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL the endpoint paths are appended to
    pub base_url: String,
    /// Bearer token for the Authorization header
    pub token: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Load from environment variables.
    ///
    /// - `PULSE_API_URL` (default: `http://localhost:8080/api`)
    /// - `PULSE_API_TOKEN`
    /// - `PULSE_HTTP_TIMEOUT_SECS` (default: 10)
    /// - `PULSE_RETRY_MAX_ATTEMPTS` (default: 3)
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("PULSE_API_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url;
        }
        config.token = lookup("PULSE_API_TOKEN").filter(|v| !v.trim().is_empty());

        if let Some(secs) = parse_u64(&lookup, "PULSE_HTTP_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(attempts) = parse_u64(&lookup, "PULSE_RETRY_MAX_ATTEMPTS")? {
            let attempts = u32::try_from(attempts).map_err(|_| ClientError::InvalidConfig {
                name: "PULSE_RETRY_MAX_ATTEMPTS",
                value: attempts.to_string(),
            })?;
            config.retry = config.retry.with_max_attempts(attempts);
        }

        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn parse_u64<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ClientError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ClientError::InvalidConfig { name, value: raw }),
    }
}
