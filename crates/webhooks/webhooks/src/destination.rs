//! Destination configuration.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{WebhookError, WebhookResult};
use crate::event::WebhookEvent;

/// Number of random bytes in a generated secret.
const SECRET_BYTES: usize = 32;

/// Generates a new destination secret (64 lowercase hex chars).
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// An owner's webhook destination. One per owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Owner identifier.
    pub owner_id: String,
    /// Target URL.
    pub url: String,
    /// Secret for signing payloads.
    pub secret: String,
    /// Whether deliveries are enabled.
    pub enabled: bool,
    /// Enabled event names. `None` means every event; an empty set means none.
    pub enabled_events: Option<BTreeSet<String>>,
    /// When the destination was created.
    pub created_at: DateTime<Utc>,
    /// When the destination was last updated.
    pub updated_at: DateTime<Utc>,
}

impl DestinationConfig {
    /// Creates an enabled destination with a fresh secret and no event restriction.
    pub fn new(owner_id: impl Into<String>, url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            owner_id: owner_id.into(),
            url: url.into(),
            secret: generate_secret(),
            enabled: true,
            enabled_events: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Restricts delivery to the given events.
    pub fn events(mut self, events: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.enabled_events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Disables the destination.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Checks whether the event type passes the enabled-events filter.
    pub fn accepts(&self, event_type: &str) -> bool {
        self.enabled_events
            .as_ref()
            .is_none_or(|events| events.contains(event_type))
    }

    /// Checks if this destination should receive an event.
    pub fn should_receive(&self, event_type: &str) -> bool {
        self.enabled && self.accepts(event_type)
    }

    /// Replaces the secret, leaving URL and events untouched.
    pub fn rotate_secret(&mut self) -> &str {
        self.secret = generate_secret();
        self.updated_at = Utc::now();
        &self.secret
    }

    /// Returns the read view, which never carries the secret.
    pub fn view(&self) -> DestinationView {
        DestinationView {
            url: self.url.clone(),
            enabled: self.enabled,
            enabled_events: match &self.enabled_events {
                Some(events) => events.iter().cloned().collect(),
                None => WebhookEvent::names(),
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Destination as returned by read APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationView {
    pub url: String,
    pub enabled: bool,
    pub enabled_events: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert request for a destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationUpdate {
    pub url: String,
    /// Defaults to `true`.
    pub enabled: Option<bool>,
    /// Defaults to the full catalog.
    pub enabled_events: Option<Vec<String>>,
}

impl DestinationUpdate {
    /// Creates an update for the given URL with defaults for everything else.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the enabled flag.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Sets the enabled events.
    pub fn events(mut self, events: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.enabled_events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    /// Validates the URL and event names, returning the resolved event set.
    pub fn validate(&self) -> WebhookResult<BTreeSet<String>> {
        validate_url(&self.url)?;

        let events = self.enabled_events.clone().unwrap_or_else(WebhookEvent::names);
        let invalid: Vec<String> = events
            .iter()
            .filter(|e| e.parse::<WebhookEvent>().is_err())
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(WebhookError::InvalidEvents(invalid));
        }

        Ok(events.into_iter().collect())
    }
}

/// Checks that a destination URL is an absolute http(s) URL.
pub fn validate_url(raw: &str) -> WebhookResult<()> {
    let parsed = url::Url::parse(raw).map_err(|e| WebhookError::InvalidUrl(format!("{raw}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(WebhookError::InvalidUrl(format!("unsupported scheme '{other}'"))),
    }
}
