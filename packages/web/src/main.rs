use std::sync::Arc;

use anyhow::Context;
use api::db::{get_pool, migrate, PgStore};
use api::{router, AppState, Settings};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let settings = Settings::new().context("Failed to load settings")?;
    settings.validate().context("Invalid settings")?;

    let pool = get_pool(&settings.database)
        .await
        .context("Failed to connect to database")?;
    migrate(pool).await.context("Failed to run migrations")?;

    if !settings.oauth.enabled() {
        info!("OAuth login disabled, set oauth.client_id to enable it");
    }

    let address = settings.server.address();
    let gateway: Arc<dyn store::Store> = Arc::new(PgStore::new(pool.clone()));
    let app = router(AppState::new(gateway, settings));

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
