//! Concord gateway client entry point
//!
//! Run with:
//! ```bash
//! CONCORD_TOKEN=... cargo run -p concord-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use std::sync::Arc;

use concord_cache::MemoryCache;
use concord_common::{try_init_tracing, ClientConfig};
use concord_gateway::{lifecycle, GatewaySession};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize tracing
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    // Run the client
    if let Err(e) = run().await {
        error!(error = %e, "Gateway client failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Concord gateway client...");

    // Load configuration
    let config = ClientConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        gateway = %config.gateway.url,
        "Configuration loaded"
    );

    let cache = Arc::new(MemoryCache::new());
    let session = GatewaySession::new(config, cache.clone());

    session.on(lifecycle::SESSION_READY, |payload| async move {
        info!(guilds = %payload["guilds"], "Session ready");
    });
    session.on(lifecycle::SESSION_READY_SUPPLEMENTAL, |payload| async move {
        info!(
            members = %payload["members"],
            gaps = %payload["gaps"],
            "Bootstrap reconciled; startup consumers may run"
        );
    });
    session.on("MESSAGE_CREATE", |payload| async move {
        info!(
            channel = %payload["channel_id"],
            "Message received"
        );
    });

    session.run().await?;

    Ok(())
}
