//! RoleReady Webhooks Server binary.

use roleready_webhooks_server::{AppConfig, WebhookServer, load_config};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the TOML configuration file.
const CONFIG_ENV: &str = "ROLEREADY_WEBHOOKS_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = match std::env::args().nth(1).or_else(|| std::env::var(CONFIG_ENV).ok()) {
        Some(path) => load_config(&path)?,
        None => AppConfig::default(),
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Create and run server
    let server = WebhookServer::in_memory(config);
    server.run().await?;

    Ok(())
}
