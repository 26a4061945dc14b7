//! HMAC signature generation and verification.

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::envelope::DeliveryEnvelope;
use crate::error::{WebhookError, WebhookResult};

type HmacSha256 = Hmac<Sha256>;

/// Signs a JSON payload with the given secret.
///
/// Returns the lowercase hex HMAC-SHA256 of the payload's `serde_json`
/// encoding. This is the same encoding used for the request body, so a
/// receiver verifies against the raw bytes it got.
pub fn sign<T: Serialize + ?Sized>(payload: &T, secret: &str) -> WebhookResult<String> {
    WebhookSigner::new(secret)?.sign(payload)
}

/// Webhook signer for generating and verifying signatures.
#[derive(Clone)]
pub struct WebhookSigner {
    secret: String,
}

impl std::fmt::Debug for WebhookSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSigner").finish_non_exhaustive()
    }
}

impl WebhookSigner {
    /// Creates a new signer with the given secret.
    ///
    /// Fails with [`WebhookError::InvalidSecret`] when the secret is empty.
    pub fn new(secret: impl Into<String>) -> WebhookResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(WebhookError::InvalidSecret);
        }
        Ok(Self { secret })
    }

    /// Generates a signature over the JSON encoding of `payload`.
    pub fn sign<T: Serialize + ?Sized>(&self, payload: &T) -> WebhookResult<String> {
        let body = serde_json::to_vec(payload)?;
        self.sign_bytes(&body)
    }

    /// Generates a signature over raw bytes.
    pub fn sign_bytes(&self, payload: &[u8]) -> WebhookResult<String> {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|_| WebhookError::InvalidSecret)?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Encodes and signs an envelope once, for every attempt of a delivery.
    pub fn sign_envelope(&self, envelope: &DeliveryEnvelope) -> WebhookResult<SignedEnvelope> {
        let body = serde_json::to_vec(envelope)?;
        let signature = self.sign_bytes(&body)?;

        Ok(SignedEnvelope {
            event: envelope.event.clone(),
            delivery_id: envelope.delivery_id.clone(),
            body,
            signature,
        })
    }

    /// Verifies a hex signature against raw bytes.
    pub fn verify(&self, signature: &str, payload: &[u8]) -> bool {
        match self.sign_bytes(payload) {
            Ok(expected) => constant_time_compare(&expected, &signature.to_ascii_lowercase()),
            Err(_) => false,
        }
    }
}

/// An envelope encoded to its wire body, with the body's signature.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    /// Event type, sent as `X-Webhook-Event`.
    pub event: String,
    /// Delivery id, sent as `X-Webhook-Delivery-Id`.
    pub delivery_id: String,
    /// JSON request body.
    pub body: Vec<u8>,
    /// Hex HMAC-SHA256 of `body`, sent as `X-Webhook-Signature`.
    pub signature: String,
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
