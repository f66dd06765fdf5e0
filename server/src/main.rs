use std::sync::Arc;

use fiscal_server::env_config;
use fiscal_server::server::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let port = env_config::server_port();
    let config = env_config::engine_config()?;
    env_config::init_rayon_threads();
    log::info!(
        "Starting fiscal simulation API (Monte Carlo {}..={} iterations)",
        config.monte_carlo.min_iterations,
        config.monte_carlo.max_iterations
    );

    let app = create_router(Arc::new(AppState { config }));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    log::info!("Server is running on port {port}. Press Ctrl+C to stop.");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Stopping server...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to install CTRL+C signal handler: {e}");
        std::future::pending::<()>().await;
    }
}
