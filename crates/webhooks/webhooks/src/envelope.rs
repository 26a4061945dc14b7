//! Delivery envelope sent to destinations.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The JSON body of a webhook request.
///
/// Field order is part of the signed encoding; do not reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEnvelope {
    /// Event type name.
    pub event: String,
    /// Identifier shared by every attempt of one logical delivery.
    pub delivery_id: String,
    /// ISO 8601 creation time.
    pub timestamp: String,
    /// Owner of the destination.
    pub user_id: String,
    /// Event data.
    pub data: Value,
}

impl DeliveryEnvelope {
    /// Builds an envelope with a fresh delivery id and the current time.
    pub fn new(event: impl Into<String>, user_id: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            delivery_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            user_id: user_id.into(),
            data,
        }
    }
}
