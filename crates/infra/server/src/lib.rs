//! # RoleReady Webhooks Server
//!
//! Standalone HTTP service exposing webhook destination management, test
//! deliveries, delivery logs, and delivery statistics.

mod config;
mod extractor;
mod routes;

pub use config::{AppConfig, ConfigError, ServerConfig, load_config, parse_config};
pub use extractor::{OWNER_HEADER, Owner, OwnerRejection};
pub use routes::{ApiError, webhook_routes};

use axum::Router;
use roleready_webhooks::{
    EventDispatcher, HttpDeliveryExecutor, InMemoryWebhookStorage, WebhookService, WebhookStorage,
};
use std::sync::Arc;

/// The webhook server.
pub struct WebhookServer {
    /// Server configuration.
    pub config: ServerConfig,
    service: WebhookService,
}

impl WebhookServer {
    /// Creates a server backed by the given storage.
    pub fn new(config: AppConfig, storage: Arc<dyn WebhookStorage>) -> Self {
        let executor = Arc::new(HttpDeliveryExecutor::new(&config.delivery.user_agent));
        let dispatcher = EventDispatcher::from_config(storage, executor, &config.delivery);

        Self {
            config: config.server,
            service: WebhookService::new(dispatcher),
        }
    }

    /// Creates a server with in-memory storage.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(config, Arc::new(InMemoryWebhookStorage::new()))
    }

    /// Gets the webhook service, e.g. to dispatch events from the host.
    pub fn service(&self) -> &WebhookService {
        &self.service
    }

    /// Builds the application router.
    pub fn router(&self) -> Router {
        Router::new().nest(&self.config.base_path, webhook_routes(self.service.clone()))
    }

    /// Starts the server.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let address = self.config.bind_address();
        let listener = tokio::net::TcpListener::bind(&address).await?;

        tracing::info!("Starting RoleReady Webhooks Server on {}", address);
        tracing::info!("Webhook routes mounted at {}", self.config.base_path);

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

impl Default for WebhookServer {
    fn default() -> Self {
        Self::in_memory(AppConfig::default())
    }
}
