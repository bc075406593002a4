// Client setup errors
//
// Request failures are reported as pulse_core::TransportError; this type only
// covers building the client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid value for {name}: {value}")]
    InvalidConfig { name: &'static str, value: String },

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
