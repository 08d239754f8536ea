//! Gateway Library
//!
//! HTTP front end that opens one database session per request.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod repositories;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use driver::MemoryEngine;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::GatewayConfig;
use crate::routes::create_router;
use crate::state::AppState;

/// Run the HTTP server with the given configuration.
pub async fn run_server(
    host: &str,
    port: u16,
    config: GatewayConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        address = %config.database.address,
        namespace = %config.database.namespace,
        database = %config.database.database,
        "Using database"
    );
    let engine = MemoryEngine::open();

    // Create app state
    let state = AppState::new(config, engine);

    // Build router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Build address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Gateway listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
