mod app_state;
mod config;
mod error;
mod middleware;
mod models;
mod routes;
mod services;

use app_state::AppState;
use config::Config;
use routes::create_router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fanvault=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FanVault Backend");

    // Load configuration
    let config = Config::load()?;

    tracing::info!(
        "Loaded configuration - Server: {}:{}",
        config.server.host,
        config.server.port
    );

    // Initialize application state
    let state = AppState::new(config.clone()).await?;

    tracing::info!("Initialized application state");

    // Background sweep: retry payout requests stuck pending after a
    // crash between balance reservation and the bank transfer.
    spawn_withdrawal_sweep(&state);

    // Create router
    let app = create_router(state);

    // Create server address
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_withdrawal_sweep(state: &AppState) {
    let withdrawals = state.withdrawals.clone();
    let interval_seconds = state.config.withdrawals.sweep_interval_seconds;
    let retry_after = time::Duration::seconds(state.config.withdrawals.retry_after_seconds as i64);

    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(interval_seconds));
        // First tick fires immediately; skip it
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match withdrawals.sweep_pending(retry_after).await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Withdrawal sweep resolved {} stuck requests", n),
                Err(e) => tracing::warn!("Withdrawal sweep failed: {:?}", e),
            }
        }
    });
}
