//! Trailbook booking service.

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use trailbook::providers::{AnyNotifier, ConsoleNotifier, SmtpNotifier};
use trailbook::router::api_router;
use trailbook::stores::{MemoryRateLimiter, PostgresInventoryStore};
use trailbook::{AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,trailbook=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
        .connect(&config.postgres.url)
        .await?;

    let store = PostgresInventoryStore::new(pool);
    store.migrate().await?;
    tracing::info!("database migrations applied");

    let notifier = match &config.smtp {
        Some(smtp) => {
            tracing::info!(server = %smtp.server, "using SMTP notifier");
            AnyNotifier::Smtp(SmtpNotifier::new(smtp))
        }
        None => {
            tracing::info!("SMTP not configured, using console notifier");
            AnyNotifier::Console(ConsoleNotifier::new())
        }
    };

    let state = AppState::new(
        store,
        Arc::new(notifier),
        Arc::new(MemoryRateLimiter::new()),
        config.rate_limit.clone(),
    );

    let app = api_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
