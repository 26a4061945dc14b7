//! Webhook receiver for verifying incoming webhooks.

use crate::envelope::DeliveryEnvelope;
use crate::error::{WebhookError, WebhookResult};
use crate::signature::WebhookSigner;

/// Verifies deliveries on the consuming side.
///
/// Receivers should verify against the raw request body, not a re-encoded
/// copy of the parsed JSON.
pub struct WebhookReceiver {
    signer: WebhookSigner,
}

impl WebhookReceiver {
    /// Creates a new webhook receiver.
    pub fn new(secret: impl Into<String>) -> WebhookResult<Self> {
        Ok(Self {
            signer: WebhookSigner::new(secret)?,
        })
    }

    /// Verifies the `X-Webhook-Signature` value and parses the envelope.
    pub fn verify(&self, signature: &str, body: &[u8]) -> WebhookResult<DeliveryEnvelope> {
        if !self.signer.verify(signature, body) {
            return Err(WebhookError::InvalidSignature);
        }

        Ok(serde_json::from_slice(body)?)
    }
}
