//! Best-effort delivery audit logging.

use std::sync::Arc;

use crate::delivery::{DeliveryLog, DeliveryOutcome};
use crate::envelope::DeliveryEnvelope;
use crate::storage::WebhookStorage;

/// Writes one audit row per logical delivery.
///
/// Storage failures are reported through `tracing` and never returned, so a
/// delivery outcome is never altered by the audit write.
#[derive(Clone)]
pub struct DeliveryLogger {
    storage: Arc<dyn WebhookStorage>,
}

impl DeliveryLogger {
    /// Creates a new logger on top of a storage backend.
    pub fn new(storage: Arc<dyn WebhookStorage>) -> Self {
        Self { storage }
    }

    /// Records the outcome of a delivery.
    pub async fn record(
        &self,
        owner_id: &str,
        event_type: &str,
        url: &str,
        envelope: &DeliveryEnvelope,
        outcome: &DeliveryOutcome,
    ) {
        let row = DeliveryLog::new(owner_id, url, envelope, outcome);

        if let Err(e) = self.storage.append_log(&row).await {
            tracing::error!(
                owner_id,
                event = event_type,
                delivery_id = %outcome.delivery_id,
                error = %e,
                "Failed to record webhook delivery"
            );
        }
    }
}
