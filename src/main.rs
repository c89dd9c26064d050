use anyhow::Context;
use tracing_subscriber::EnvFilter;

use hospital_api::{app, config::AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hospital_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        "Starting Hospital API in {:?} mode ({:?} storage)",
        config.environment,
        config.database.backend
    );

    let port = config.api.port;
    let state = AppState::from_config(config)
        .await
        .context("failed to initialize application state")?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Hospital API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
