mod api;
mod app;
mod config;
mod db;
mod domain;
mod engine;
mod error;
mod logging;
mod middleware;
mod routes;
mod services;
mod stores;

use anyhow::Result;

use services::{materializer, PaymentClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting TidyNest backend"
    );

    // Create database pool
    let pool = db::create_pool(&settings).await?;

    // Create payment service client
    let payments = PaymentClient::new(
        &settings.payment_service_url,
        &settings.payment_service_token,
        settings.payment_service_timeout_seconds,
    )?;

    // Optionally check payment service health (non-blocking)
    tokio::spawn({
        let payments = payments.clone();
        async move {
            match payments.health_check().await {
                Ok(()) => tracing::info!("Payment service is healthy"),
                Err(e) => tracing::warn!(error = %e, "Payment service health check failed - will retry on first request"),
            }
        }
    });

    // Create application state
    let state = app::AppState::new(pool, settings.clone(), payments);

    // Start the recurrence materializer loop
    materializer::spawn(state.clone());
    tracing::info!(
        interval_seconds = settings.materializer_interval_seconds,
        "Recurrence materializer scheduled"
    );

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
