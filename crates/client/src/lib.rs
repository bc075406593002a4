// Pulse HTTP Client
//
// reqwest-backed implementation of pulse_core::NotificationTransport.
//
// Key design decisions:
// - Retry with exponential backoff lives here, below the core
// - HTTP failures map onto TransportError; auth, rate-limit and network
//   failures are also published to the AlertBus so they surface as toasts

pub mod config;
pub mod error;
pub mod http;
pub mod retry;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http::HttpTransport;
pub use retry::RetryPolicy;
