//! Single delivery attempts.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::signature::SignedEnvelope;

/// Maximum number of response-body characters kept in an error.
const MAX_ERROR_BODY_CHARS: usize = 1000;

/// Successful response to one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptResponse {
    /// HTTP status code, always 2xx.
    pub status_code: u16,
}

/// Failure of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The destination answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// No response within the attempt timeout.
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Connection or protocol failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Builds a status error, truncating the response body.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
            Some((idx, _)) => body[..idx].to_string(),
            None => body,
        };
        DeliveryError::Status { status, body }
    }

    /// Returns the HTTP status code, if the destination responded.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DeliveryError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Performs exactly one network round trip per call. No retries.
#[async_trait]
pub trait DeliveryExecutor: Send + Sync {
    /// POSTs the signed envelope to `url`.
    ///
    /// Any non-2xx response is returned as [`DeliveryError::Status`].
    async fn attempt(
        &self,
        url: &str,
        envelope: &SignedEnvelope,
        timeout: Duration,
    ) -> Result<AttemptResponse, DeliveryError>;
}

/// `reqwest`-backed executor.
#[cfg(feature = "http-client")]
#[derive(Debug, Clone)]
pub struct HttpDeliveryExecutor {
    client: reqwest::Client,
    user_agent: String,
}

#[cfg(feature = "http-client")]
impl HttpDeliveryExecutor {
    /// Creates a new executor sending the given user agent.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), user_agent)
    }

    /// Creates an executor on a pre-built client.
    pub fn with_client(client: reqwest::Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
        }
    }
}

#[cfg(feature = "http-client")]
impl Default for HttpDeliveryExecutor {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_USER_AGENT)
    }
}

#[cfg(feature = "http-client")]
#[async_trait]
impl DeliveryExecutor for HttpDeliveryExecutor {
    async fn attempt(
        &self,
        url: &str,
        envelope: &SignedEnvelope,
        timeout: Duration,
    ) -> Result<AttemptResponse, DeliveryError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("X-Webhook-Signature", &envelope.signature)
            .header("X-Webhook-Event", &envelope.event)
            .header("X-Webhook-Delivery-Id", &envelope.delivery_id)
            .header("User-Agent", &self.user_agent)
            .timeout(timeout)
            .body(envelope.body.clone())
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if status.is_success() {
            return Ok(AttemptResponse {
                status_code: status.as_u16(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::status(status.as_u16(), body))
    }
}

#[cfg(feature = "http-client")]
fn classify(err: reqwest::Error, timeout: Duration) -> DeliveryError {
    if err.is_timeout() {
        DeliveryError::Timeout(timeout.as_millis() as u64)
    } else {
        DeliveryError::Transport(err.to_string())
    }
}
