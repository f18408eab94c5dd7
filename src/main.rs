use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use stacksafe::api::router::api_router;
use stacksafe::config::{self, Settings};
use stacksafe::db;
use stacksafe::pipeline::AnalysisEngine;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!(
        "{} starting v{} (calc {})",
        config::SERVICE_NAME,
        config::SERVICE_VERSION,
        config::CALC_VERSION
    );

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(error) => {
            tracing::error!(%error, "invalid configuration");
            std::process::exit(1);
        }
    };

    let conn = match db::open_database(&settings.db_path) {
        Ok(conn) => conn,
        Err(error) => {
            tracing::error!(%error, path = %settings.db_path.display(), "cannot open database");
            std::process::exit(1);
        }
    };

    let bind_addr = settings.bind_addr;
    let engine = Arc::new(AnalysisEngine::new(settings, conn));
    let router = api_router(engine);

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, %bind_addr, "cannot bind");
            std::process::exit(1);
        }
    };
    tracing::info!("listening on {bind_addr}");

    if let Err(error) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
