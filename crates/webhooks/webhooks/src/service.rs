//! Destination management, test deliveries, and delivery log queries.

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::delivery::{DeliveryLog, DeliveryLogView, DeliveryOutcome};
use crate::destination::{DestinationConfig, DestinationUpdate, DestinationView};
use crate::dispatcher::EventDispatcher;
use crate::envelope::DeliveryEnvelope;
use crate::error::{WebhookError, WebhookResult};
use crate::event::TEST_EVENT;
use crate::storage::{LogQuery, WebhookStorage};

/// Window covered by [`WebhookService::stats`].
const STATS_WINDOW_DAYS: i64 = 30;

/// Result of saving a destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationSaved {
    /// The saved destination.
    pub config: DestinationView,
    /// The signing secret, present only when the destination was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// One page of delivery logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPage {
    pub logs: Vec<DeliveryLogView>,
    pub pagination: Pagination,
}

/// Pagination details of a [`LogPage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// Delivery counters for one event type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Delivery statistics over the last 30 days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage of successful deliveries, two decimals.
    pub success_rate: f64,
    /// Mean attempts per delivery, two decimals.
    pub average_attempts: f64,
    pub by_event: BTreeMap<String, EventStats>,
}

impl DeliveryStats {
    /// Aggregates delivery log rows.
    pub fn from_logs(logs: &[DeliveryLog]) -> Self {
        let mut stats = DeliveryStats {
            total: logs.len(),
            ..Default::default()
        };

        let mut attempts = 0u64;
        for log in logs {
            attempts += u64::from(log.attempts);
            let entry = stats.by_event.entry(log.event.clone()).or_default();
            entry.total += 1;
            if log.success {
                stats.successful += 1;
                entry.successful += 1;
            } else {
                stats.failed += 1;
                entry.failed += 1;
            }
        }

        if stats.total > 0 {
            stats.success_rate = round2(stats.successful as f64 / stats.total as f64 * 100.0);
            stats.average_attempts = round2(attempts as f64 / stats.total as f64);
        }

        stats
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Owner-facing webhook operations.
#[derive(Clone)]
pub struct WebhookService {
    storage: Arc<dyn WebhookStorage>,
    dispatcher: EventDispatcher,
}

impl WebhookService {
    /// Creates a service around a dispatcher, sharing its storage.
    pub fn new(dispatcher: EventDispatcher) -> Self {
        Self {
            storage: Arc::clone(dispatcher.storage()),
            dispatcher,
        }
    }

    /// Gets the dispatcher.
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Gets an owner's destination, without its secret.
    pub async fn get_config(&self, owner_id: &str) -> WebhookResult<Option<DestinationView>> {
        Ok(self.storage.get_destination(owner_id).await?.map(|c| c.view()))
    }

    /// Creates or updates an owner's destination.
    ///
    /// An existing secret is kept; a new destination gets a fresh one, which
    /// is returned only in this response.
    pub async fn upsert_config(&self, owner_id: &str, update: DestinationUpdate) -> WebhookResult<DestinationSaved> {
        let events = update.validate()?;
        let enabled = update.enabled.unwrap_or(true);

        let (config, secret) = match self.storage.get_destination(owner_id).await? {
            Some(mut existing) => {
                existing.url = update.url;
                existing.enabled = enabled;
                existing.enabled_events = Some(events);
                existing.updated_at = Utc::now();
                (existing, None)
            }
            None => {
                let mut created = DestinationConfig::new(owner_id, update.url);
                created.enabled = enabled;
                created.enabled_events = Some(events);
                let secret = created.secret.clone();
                (created, Some(secret))
            }
        };

        self.storage.save_destination(&config).await?;

        tracing::info!(
            owner_id,
            url = %config.url,
            enabled = config.enabled,
            events_count = config.enabled_events.as_ref().map_or(0, BTreeSet::len),
            "Webhook configuration updated"
        );

        Ok(DestinationSaved {
            config: config.view(),
            secret,
        })
    }

    /// Deletes an owner's destination. Later dispatches become no-ops.
    pub async fn delete_config(&self, owner_id: &str) -> WebhookResult<()> {
        if !self.storage.delete_destination(owner_id).await? {
            return Err(WebhookError::not_found("No webhook configuration found"));
        }

        tracing::info!(owner_id, "Webhook configuration deleted");
        Ok(())
    }

    /// Replaces an owner's secret and returns the new one.
    pub async fn rotate_secret(&self, owner_id: &str) -> WebhookResult<String> {
        let mut config = self
            .storage
            .get_destination(owner_id)
            .await?
            .ok_or_else(|| WebhookError::not_found("No webhook configuration found"))?;

        let secret = config.rotate_secret().to_string();
        self.storage.save_destination(&config).await?;

        tracing::info!(owner_id, "Webhook secret regenerated");
        Ok(secret)
    }

    /// Sends a single `webhook.test` delivery, ignoring enabled flags.
    ///
    /// Test deliveries make one attempt and are not written to the audit log.
    pub async fn send_test(&self, owner_id: &str) -> WebhookResult<DeliveryOutcome> {
        let config = self.storage.get_destination(owner_id).await?.ok_or_else(|| {
            WebhookError::not_found("No webhook configuration found. Please configure a webhook first.")
        })?;

        let mut envelope = DeliveryEnvelope::new(TEST_EVENT, owner_id, json!({}));
        envelope.data = json!({
            "message": "This is a test webhook from RoleReady",
            "testId": envelope.delivery_id,
        });

        let outcome = self
            .dispatcher
            .coordinator()
            .single_attempt()
            .deliver_with_retry(&config.url, &envelope, &config.secret)
            .await?;

        if outcome.success {
            tracing::info!(owner_id, url = %config.url, status_code = outcome.status_code, "Test webhook sent");
        } else {
            tracing::warn!(
                owner_id,
                url = %config.url,
                status_code = outcome.status_code,
                error = outcome.error.as_deref().unwrap_or_default(),
                "Test webhook failed"
            );
        }

        Ok(outcome)
    }

    /// Lists an owner's delivery logs, newest first. Payloads are never included.
    pub async fn list_logs(&self, owner_id: &str, query: LogQuery) -> WebhookResult<LogPage> {
        let query = query.normalized();
        let (logs, total) = self.storage.list_logs(owner_id, &query).await?;

        Ok(LogPage {
            logs: logs.iter().map(DeliveryLog::view).collect(),
            pagination: Pagination {
                total,
                limit: query.limit,
                offset: query.offset,
                has_more: query.offset.saturating_add(query.limit) < total,
            },
        })
    }

    /// Aggregates an owner's deliveries over the last 30 days.
    pub async fn stats(&self, owner_id: &str) -> WebhookResult<DeliveryStats> {
        let since = Utc::now() - ChronoDuration::days(STATS_WINDOW_DAYS);
        let logs = self.storage.logs_since(owner_id, since).await?;
        Ok(DeliveryStats::from_logs(&logs))
    }
}
