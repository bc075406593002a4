// HTTP transport for the notification service
//
// Every request goes through one retry loop: retryable failures (network,
// 429, 5xx) back off per RetryPolicy and publish `api-retry`; the final
// failure of a request publishes at most one auth / rate-limit / network
// alert.

use async_trait::async_trait;
use pulse_core::{
    Ack, AlertBus, AlertPayload, NotificationId, NotificationPage, NotificationTransport,
    TransportError, UnreadCountResponse,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::retry::RetryPolicy;

pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
    retry: RetryPolicy,
    bus: Option<AlertBus>,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(config.base_url));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pulse/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url,
            http,
            token: config.token,
            retry: config.retry,
            bus: None,
        })
    }

    /// Publish retry and failure alerts to `bus`.
    pub fn with_bus(mut self, bus: AlertBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, TransportError> {
        let mut attempt = 1;
        loop {
            match self.send_once(method.clone(), path).await {
                Ok(body) => return Ok(body),
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    let delay = self.retry.delay_for_retry(attempt);
                    warn!(
                        %method,
                        path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Request failed, retrying"
                    );
                    if let Some(bus) = &self.bus {
                        bus.api_retry(AlertPayload::default().with_attempt(attempt));
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    self.publish_failure(&err);
                    return Err(err);
                }
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        let body = response.text().await.map_err(request_error)?;
        debug!(%status, url = %url, "Response received");

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        // Some endpoints answer 204 with no body
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    fn publish_failure(&self, err: &TransportError) {
        let Some(bus) = &self.bus else {
            return;
        };
        match err {
            TransportError::Unauthorized(_) => bus.auth_error(AlertPayload::default()),
            TransportError::RateLimited(_) => bus.rate_limit_error(AlertPayload::default()),
            TransportError::Network(_) => bus.network_error(AlertPayload::default()),
            _ => {}
        }
    }
}

fn request_error(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        // Connect, timeout, reset and body read failures
        TransportError::Network(err.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> TransportError {
    let message = error_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => TransportError::RateLimited(message),
        _ => TransportError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Prefer a JSON `message` / `error` field, then the raw body, then the
/// status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl NotificationTransport for HttpTransport {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<NotificationPage, TransportError> {
        let page: NotificationPage = self.request(Method::GET, "/notifications").await?;
        if !page.success {
            return Err(TransportError::rejected("notification list"));
        }
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn fetch_unread_count(&self) -> Result<usize, TransportError> {
        let response: UnreadCountResponse = self
            .request(Method::GET, "/notifications/unread-count")
            .await?;
        if !response.success {
            return Err(TransportError::rejected("unread count"));
        }
        Ok(response.unread_count)
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, id: NotificationId) -> Result<(), TransportError> {
        let ack: Ack = self
            .request(Method::POST, &format!("/notifications/{}/read", id))
            .await
            .map_err(|e| match e {
                TransportError::Api { status: 404, .. } => TransportError::NotFound(id),
                other => other,
            })?;
        ack.into_result()
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self) -> Result<(), TransportError> {
        let ack: Ack = self
            .request(Method::POST, "/notifications/mark-all-read")
            .await?;
        ack.into_result()
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> Result<(), TransportError> {
        let ack: Ack = self.request(Method::DELETE, "/notifications").await?;
        ack.into_result()
    }
}
