//! Event dispatcher - entry point for emitting webhooks.

use serde_json::{Value, json};
use std::sync::Arc;

use crate::config::WebhookConfig;
use crate::delivery::DeliveryOutcome;
use crate::envelope::DeliveryEnvelope;
use crate::error::WebhookResult;
use crate::event::WebhookEvent;
use crate::executor::DeliveryExecutor;
use crate::logger::DeliveryLogger;
use crate::retry::RetryCoordinator;
use crate::storage::WebhookStorage;

/// Delivers events to the destination configured by their owner.
///
/// Every call is independent: the destination is loaded once per dispatch
/// and nothing is shared between concurrent dispatches.
#[derive(Clone)]
pub struct EventDispatcher {
    storage: Arc<dyn WebhookStorage>,
    coordinator: RetryCoordinator,
    logger: DeliveryLogger,
}

impl EventDispatcher {
    /// Creates a dispatcher from its collaborators.
    pub fn new(storage: Arc<dyn WebhookStorage>, coordinator: RetryCoordinator) -> Self {
        Self {
            logger: DeliveryLogger::new(Arc::clone(&storage)),
            storage,
            coordinator,
        }
    }

    /// Creates a dispatcher following a delivery configuration.
    pub fn from_config(
        storage: Arc<dyn WebhookStorage>,
        executor: Arc<dyn DeliveryExecutor>,
        config: &WebhookConfig,
    ) -> Self {
        Self::new(storage, RetryCoordinator::from_config(executor, config))
    }

    /// Gets the retry coordinator.
    pub fn coordinator(&self) -> &RetryCoordinator {
        &self.coordinator
    }

    /// Gets the storage backend.
    pub fn storage(&self) -> &Arc<dyn WebhookStorage> {
        &self.storage
    }

    /// Dispatches an event to the owner's destination.
    ///
    /// Returns `Ok(None)` without any network call when the owner has no
    /// enabled destination or has not enabled this event type. Storage and
    /// signing failures are returned as errors; delivery failures are part
    /// of the returned outcome.
    pub async fn dispatch(
        &self,
        owner_id: &str,
        event_type: &str,
        data: Value,
    ) -> WebhookResult<Option<DeliveryOutcome>> {
        let Some(config) = self.storage.get_destination(owner_id).await? else {
            tracing::debug!(owner_id, event = event_type, "No webhook destination configured");
            return Ok(None);
        };

        if !config.enabled {
            tracing::debug!(owner_id, event = event_type, "Webhook destination disabled");
            return Ok(None);
        }

        if !config.accepts(event_type) {
            tracing::debug!(owner_id, event = event_type, "Webhook event not enabled");
            return Ok(None);
        }

        let envelope = DeliveryEnvelope::new(event_type, owner_id, data);
        let outcome = self
            .coordinator
            .deliver_with_retry(&config.url, &envelope, &config.secret)
            .await?;

        self.logger
            .record(owner_id, event_type, &config.url, &envelope, &outcome)
            .await;

        Ok(Some(outcome))
    }

    /// Dispatches a catalog event.
    pub async fn dispatch_event(
        &self,
        owner_id: &str,
        event: WebhookEvent,
        data: Value,
    ) -> WebhookResult<Option<DeliveryOutcome>> {
        self.dispatch(owner_id, event.as_str(), data).await
    }

    // ==================== Event Helpers ====================

    /// Sends `resume.parsed`.
    pub async fn resume_parsed(
        &self,
        owner_id: &str,
        resume_id: &str,
        file_name: &str,
        parsed_data: Value,
    ) -> WebhookResult<Option<DeliveryOutcome>> {
        let data = json!({
            "resumeId": resume_id,
            "fileName": file_name,
            "parsedData": parsed_data,
            "status": "completed",
        });
        self.dispatch_event(owner_id, WebhookEvent::ResumeParsed, data).await
    }

    /// Sends `resume.parse_failed`.
    pub async fn resume_parse_failed(
        &self,
        owner_id: &str,
        resume_id: &str,
        file_name: &str,
        error: &str,
    ) -> WebhookResult<Option<DeliveryOutcome>> {
        let data = json!({
            "resumeId": resume_id,
            "fileName": file_name,
            "error": error,
            "status": "failed",
        });
        self.dispatch_event(owner_id, WebhookEvent::ResumeParseFailed, data).await
    }

    /// Sends `ats.check_completed`.
    pub async fn ats_check_completed(
        &self,
        owner_id: &str,
        check_id: &str,
        job_id: &str,
        score: f64,
        results: Value,
    ) -> WebhookResult<Option<DeliveryOutcome>> {
        let data = json!({
            "checkId": check_id,
            "jobId": job_id,
            "score": score,
            "results": results,
            "status": "completed",
        });
        self.dispatch_event(owner_id, WebhookEvent::AtsCheckCompleted, data).await
    }

    /// Sends `ats.check_failed`.
    pub async fn ats_check_failed(
        &self,
        owner_id: &str,
        check_id: &str,
        job_id: &str,
        error: &str,
    ) -> WebhookResult<Option<DeliveryOutcome>> {
        let data = json!({
            "checkId": check_id,
            "jobId": job_id,
            "error": error,
            "status": "failed",
        });
        self.dispatch_event(owner_id, WebhookEvent::AtsCheckFailed, data).await
    }

    /// Sends `tailoring.completed`.
    pub async fn tailoring_completed(
        &self,
        owner_id: &str,
        tailoring_id: &str,
        resume_id: &str,
        job_id: &str,
        result: Value,
    ) -> WebhookResult<Option<DeliveryOutcome>> {
        let data = json!({
            "tailoringId": tailoring_id,
            "resumeId": resume_id,
            "jobId": job_id,
            "result": result,
            "status": "completed",
        });
        self.dispatch_event(owner_id, WebhookEvent::TailoringCompleted, data).await
    }

    /// Sends `tailoring.failed`.
    pub async fn tailoring_failed(
        &self,
        owner_id: &str,
        tailoring_id: &str,
        resume_id: &str,
        job_id: &str,
        error: &str,
    ) -> WebhookResult<Option<DeliveryOutcome>> {
        let data = json!({
            "tailoringId": tailoring_id,
            "resumeId": resume_id,
            "jobId": job_id,
            "error": error,
            "status": "failed",
        });
        self.dispatch_event(owner_id, WebhookEvent::TailoringFailed, data).await
    }

    /// Sends `operation.cancelled`.
    pub async fn operation_cancelled(
        &self,
        owner_id: &str,
        operation_id: &str,
        operation_type: &str,
        reason: &str,
    ) -> WebhookResult<Option<DeliveryOutcome>> {
        let data = json!({
            "operationId": operation_id,
            "operationType": operation_type,
            "reason": reason,
            "status": "cancelled",
        });
        self.dispatch_event(owner_id, WebhookEvent::OperationCancelled, data).await
    }
}
