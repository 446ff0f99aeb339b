//! Transit server
//!
//! Serves every transit resource from in-memory storage. Configuration is
//! read from `$TRANSIT_CONFIG` or `./transit.yaml`; log filtering follows
//! `RUST_LOG`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use transit::config::TransitConfig;
use transit::server::{AppState, ServerBuilder};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("transit=info,tower_http=info")),
        )
        .init();

    let config = TransitConfig::load()?;
    let state = AppState::in_memory(config.paging.paginator());

    if config.server.seed_demo_data {
        state.seed_demo_data().await?;
    }

    let builder = ServerBuilder::new()
        .with_state(state)
        .register_transit_resources();

    tracing::info!(
        resources = ?builder.entity_types(),
        default_page_size = config.paging.default_page_size,
        max_page_size = config.paging.max_page_size,
        "Starting transit server"
    );

    builder.serve(&config.server.bind).await
}
