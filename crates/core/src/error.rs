// Error types for the notification core
//
// Nothing in this subsystem is fatal; these types exist so callers can log or
// surface failures while the periodic refresh heals local state.

use thiserror::Error;

use crate::model::NotificationId;

/// Failures of the notification backend, as seen by the core
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS, timeout, reset
    #[error("Network error: {0}")]
    Network(String),

    /// 401 / 403
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 429
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Non-success status other than the above
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// 2xx response carrying `success: false`
    #[error("Request rejected by server: {0}")]
    Rejected(String),

    /// Body could not be decoded
    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Notification not found: {0}")]
    NotFound(NotificationId),
}

impl TransportError {
    pub fn network(msg: impl Into<String>) -> Self {
        TransportError::Network(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        TransportError::Rejected(msg.into())
    }

    /// Whether repeating the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(_) | TransportError::RateLimited(_) => true,
            TransportError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Poller failures
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] TransportError),
}

/// Configuration failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid translation catalog: {0}")]
    Catalog(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TransportError::network("reset").is_retryable());
        assert!(TransportError::RateLimited("slow down".into()).is_retryable());
        assert!(TransportError::Api {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!TransportError::Api {
            status: 400,
            message: String::new()
        }
        .is_retryable());
        assert!(!TransportError::Unauthorized("expired".into()).is_retryable());
        assert!(!TransportError::rejected("nope").is_retryable());
    }

    #[test]
    fn test_display() {
        let err = TransportError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "API error (500): boom");
    }
}
