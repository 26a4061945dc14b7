//! Delivery outcomes and audit log rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::DeliveryEnvelope;
use crate::executor::DeliveryError;

/// Final result of one logical delivery, after all attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    /// Whether the last attempt got a 2xx response.
    pub success: bool,
    /// Status code of the last attempt, if the destination responded.
    pub status_code: Option<u16>,
    /// Number of attempts made.
    pub attempts: u32,
    /// Error of the last attempt.
    pub error: Option<String>,
    /// Delivery identifier shared by every attempt.
    pub delivery_id: String,
}

impl DeliveryOutcome {
    /// Creates a successful outcome.
    pub fn success(delivery_id: impl Into<String>, status_code: u16, attempts: u32) -> Self {
        Self {
            success: true,
            status_code: Some(status_code),
            attempts,
            error: None,
            delivery_id: delivery_id.into(),
        }
    }

    /// Creates a failed outcome from the last attempt's error.
    pub fn failure(delivery_id: impl Into<String>, error: &DeliveryError, attempts: u32) -> Self {
        Self {
            success: false,
            status_code: error.status_code(),
            attempts,
            error: Some(error.to_string()),
            delivery_id: delivery_id.into(),
        }
    }
}

/// Append-only audit row for one logical delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLog {
    /// Row ID.
    pub id: String,
    /// Destination owner.
    pub owner_id: String,
    /// Event type.
    pub event: String,
    /// Destination URL at the time of delivery.
    pub url: String,
    /// Whether the delivery succeeded.
    pub success: bool,
    /// Final HTTP status code.
    pub status_code: Option<u16>,
    /// Number of attempts made.
    pub attempts: u32,
    /// Final error message.
    pub error: Option<String>,
    /// Delivery identifier.
    pub delivery_id: String,
    /// The envelope that was sent. Never exposed through read APIs.
    pub payload: Value,
    /// When the delivery succeeded.
    pub delivered_at: Option<DateTime<Utc>>,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

impl DeliveryLog {
    /// Builds the audit row for an outcome.
    pub fn new(
        owner_id: impl Into<String>,
        url: impl Into<String>,
        envelope: &DeliveryEnvelope,
        outcome: &DeliveryOutcome,
    ) -> Self {
        let now = Utc::now();
        let payload = serde_json::to_value(envelope).unwrap_or_else(|e| {
            tracing::warn!(
                delivery_id = %envelope.delivery_id,
                error = %e,
                "Failed to encode delivery payload for audit log"
            );
            Value::Null
        });

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            event: envelope.event.clone(),
            url: url.into(),
            success: outcome.success,
            status_code: outcome.status_code,
            attempts: outcome.attempts,
            error: outcome.error.clone(),
            delivery_id: outcome.delivery_id.clone(),
            payload,
            delivered_at: outcome.success.then_some(now),
            created_at: now,
        }
    }

    /// Returns the read view of this row, without the payload.
    pub fn view(&self) -> DeliveryLogView {
        DeliveryLogView {
            id: self.id.clone(),
            event: self.event.clone(),
            url: self.url.clone(),
            success: self.success,
            status_code: self.status_code,
            attempts: self.attempts,
            error: self.error.clone(),
            delivery_id: self.delivery_id.clone(),
            delivered_at: self.delivered_at,
            created_at: self.created_at,
        }
    }
}

/// Audit row as returned by read APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLogView {
    pub id: String,
    pub event: String,
    pub url: String,
    pub success: bool,
    pub status_code: Option<u16>,
    pub attempts: u32,
    pub error: Option<String>,
    pub delivery_id: String,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
