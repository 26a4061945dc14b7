//! Webhook storage trait for persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::delivery::DeliveryLog;
use crate::destination::DestinationConfig;
use crate::error::WebhookResult;

/// Default page size for log queries.
pub const DEFAULT_LOG_LIMIT: usize = 50;
/// Largest page size for log queries.
pub const MAX_LOG_LIMIT: usize = 100;

/// Filter and pagination for delivery log queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogQuery {
    /// Page size, clamped to `1..=100`.
    pub limit: usize,
    /// Rows to skip.
    pub offset: usize,
    /// Only rows for this event type.
    pub event: Option<String>,
    /// Only successful or only failed rows.
    pub success: Option<bool>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LOG_LIMIT,
            offset: 0,
            event: None,
            success: None,
        }
    }
}

impl LogQuery {
    /// Returns the query with its limit clamped to the allowed range.
    pub fn normalized(mut self) -> Self {
        self.limit = self.limit.clamp(1, MAX_LOG_LIMIT);
        self
    }

    /// Checks whether a row passes the event and success filters.
    pub fn matches(&self, log: &DeliveryLog) -> bool {
        self.event.as_deref().is_none_or(|e| log.event == e)
            && self.success.is_none_or(|s| log.success == s)
    }
}

/// Trait for webhook storage backends.
#[async_trait]
pub trait WebhookStorage: Send + Sync {
    // ==================== Destination Operations ====================

    /// Gets the destination of an owner.
    async fn get_destination(&self, owner_id: &str) -> WebhookResult<Option<DestinationConfig>>;

    /// Inserts or replaces the destination of `config.owner_id`.
    async fn save_destination(&self, config: &DestinationConfig) -> WebhookResult<()>;

    /// Deletes the destination of an owner. Returns whether one existed.
    async fn delete_destination(&self, owner_id: &str) -> WebhookResult<bool>;

    // ==================== Delivery Log Operations ====================

    /// Appends a delivery log row.
    async fn append_log(&self, log: &DeliveryLog) -> WebhookResult<()>;

    /// Lists an owner's rows newest first, with the total before pagination.
    async fn list_logs(&self, owner_id: &str, query: &LogQuery) -> WebhookResult<(Vec<DeliveryLog>, usize)>;

    /// Lists an owner's rows created at or after `since`.
    async fn logs_since(&self, owner_id: &str, since: DateTime<Utc>) -> WebhookResult<Vec<DeliveryLog>>;
}

/// In-memory webhook storage for testing.
pub struct InMemoryWebhookStorage {
    destinations: RwLock<HashMap<String, DestinationConfig>>,
    logs: RwLock<Vec<DeliveryLog>>,
}

impl InMemoryWebhookStorage {
    /// Creates a new in-memory storage.
    pub fn new() -> Self {
        Self {
            destinations: RwLock::new(HashMap::new()),
            logs: RwLock::new(Vec::new()),
        }
    }

    /// Returns every stored log row, oldest first.
    pub async fn all_logs(&self) -> Vec<DeliveryLog> {
        self.logs.read().await.clone()
    }
}

impl Default for InMemoryWebhookStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookStorage for InMemoryWebhookStorage {
    async fn get_destination(&self, owner_id: &str) -> WebhookResult<Option<DestinationConfig>> {
        let destinations = self.destinations.read().await;
        Ok(destinations.get(owner_id).cloned())
    }

    async fn save_destination(&self, config: &DestinationConfig) -> WebhookResult<()> {
        let mut destinations = self.destinations.write().await;
        destinations.insert(config.owner_id.clone(), config.clone());
        Ok(())
    }

    async fn delete_destination(&self, owner_id: &str) -> WebhookResult<bool> {
        let mut destinations = self.destinations.write().await;
        Ok(destinations.remove(owner_id).is_some())
    }

    async fn append_log(&self, log: &DeliveryLog) -> WebhookResult<()> {
        let mut logs = self.logs.write().await;
        logs.push(log.clone());
        Ok(())
    }

    async fn list_logs(&self, owner_id: &str, query: &LogQuery) -> WebhookResult<(Vec<DeliveryLog>, usize)> {
        let logs = self.logs.read().await;
        let matching: Vec<&DeliveryLog> = logs
            .iter()
            .rev()
            .filter(|l| l.owner_id == owner_id && query.matches(l))
            .collect();

        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn logs_since(&self, owner_id: &str, since: DateTime<Utc>) -> WebhookResult<Vec<DeliveryLog>> {
        let logs = self.logs.read().await;
        Ok(logs
            .iter()
            .filter(|l| l.owner_id == owner_id && l.created_at >= since)
            .cloned()
            .collect())
    }
}
