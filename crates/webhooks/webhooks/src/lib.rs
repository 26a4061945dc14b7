//! # RoleReady Webhooks
//!
//! Webhook delivery for RoleReady providing:
//! - Per-owner destination configuration
//! - HMAC-SHA256 signed deliveries
//! - Retries on a configurable delay schedule
//! - Best-effort delivery audit logging
//!
//! ## Example
//!
//! ```rust,ignore
//! use roleready_webhooks::{EventDispatcher, HttpDeliveryExecutor, InMemoryWebhookStorage, WebhookConfig};
//!
//! let config = WebhookConfig::default();
//! let dispatcher = EventDispatcher::from_config(
//!     Arc::new(InMemoryWebhookStorage::new()),
//!     Arc::new(HttpDeliveryExecutor::new(&config.user_agent)),
//!     &config,
//! );
//!
//! // `None` when the owner has no destination for this event
//! let outcome = dispatcher
//!     .resume_parsed("user-1", "resume-1", "cv.pdf", parsed)
//!     .await?;
//! ```

mod config;
mod delivery;
mod destination;
mod dispatcher;
mod envelope;
mod error;
mod event;
mod executor;
mod logger;
mod receiver;
mod retry;
mod service;
mod signature;
mod storage;

pub use config::{DEFAULT_USER_AGENT, WebhookConfig};
pub use delivery::{DeliveryLog, DeliveryLogView, DeliveryOutcome};
pub use destination::{DestinationConfig, DestinationUpdate, DestinationView, generate_secret, validate_url};
pub use dispatcher::EventDispatcher;
pub use envelope::DeliveryEnvelope;
pub use error::{WebhookError, WebhookResult};
pub use event::{TEST_EVENT, UnknownEvent, WebhookEvent};
pub use executor::{AttemptResponse, DeliveryError, DeliveryExecutor};
#[cfg(feature = "http-client")]
pub use executor::HttpDeliveryExecutor;
pub use logger::DeliveryLogger;
pub use receiver::WebhookReceiver;
pub use retry::{DelaySchedule, NoRetry, RetryCoordinator, RetryState, RetryStrategy};
pub use service::{DeliveryStats, DestinationSaved, EventStats, LogPage, Pagination, WebhookService};
pub use signature::{SignedEnvelope, WebhookSigner, sign};
pub use storage::{DEFAULT_LOG_LIMIT, InMemoryWebhookStorage, LogQuery, MAX_LOG_LIMIT, WebhookStorage};
