//! Webhook error types.

use thiserror::Error;

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Error type for webhook operations.
///
/// Per-attempt network failures are not represented here. They are absorbed
/// into a [`DeliveryOutcome`](crate::DeliveryOutcome) by the retry coordinator,
/// so only "our own configuration or signing is broken" cases reach callers.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The destination secret cannot be used for signing.
    #[error("Invalid webhook secret")]
    InvalidSecret,

    /// A received signature does not match the body.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The persistence collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// No destination is configured for the owner.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The destination URL is not a valid http(s) URL.
    #[error("Invalid webhook URL: {0}")]
    InvalidUrl(String),

    /// One or more event names are not in the catalog.
    #[error("Invalid event types: {}", .0.join(", "))]
    InvalidEvents(Vec<String>),

    /// Invalid payload.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebhookError {
    /// Creates a new storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a new not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Returns true if this error was caused by caller input.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::InvalidSignature
                | Self::InvalidUrl(_)
                | Self::InvalidEvents(_)
                | Self::InvalidPayload(_)
        )
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidSignature => 401,
            Self::NotFound(_) => 404,
            Self::InvalidUrl(_) | Self::InvalidEvents(_) | Self::InvalidPayload(_) => 400,
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::InvalidPayload(err.to_string())
    }
}
