//! Application wiring — builds the engine and serves the router.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use beamcast_core::config::AppConfig;
use beamcast_core::error::AppError;
use beamcast_realtime::RealtimeEngine;
use beamcast_realtime::auth::ChannelAuth;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the engine and runs the server until a shutdown signal arrives.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    let config = Arc::new(config);
    let auth = Arc::new(ChannelAuth::new(&config.auth.secret));
    let engine = Arc::new(RealtimeEngine::new(config.limits.clone(), auth.clone()));
    engine.start_sweeper();

    let state = AppState {
        config: config.clone(),
        engine: engine.clone(),
        auth,
        stats: engine.clone(),
    };
    let router = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| AppError::configuration(format!("Invalid bind address: {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, ws_path = %config.server.ws_path, "beamcast listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(engine))
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}

/// Waits for ctrl-c, then closes every connection before the listener stops.
async fn shutdown_signal(engine: Arc<RealtimeEngine>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
    engine.shutdown();
}
