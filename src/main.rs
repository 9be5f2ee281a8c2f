use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pdf_translator_backend::{routes, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pdf_translator_backend=debug,tower_http=debug")),
        )
        .init();

    let (config, loaded_path) = Config::discover()?;
    match loaded_path {
        Some(path) => info!("Loaded configuration from: {}", path),
        None => info!("No configuration file found, using defaults"),
    }

    if config.deepl_config.dry_run {
        warn!("Dry run enabled: documents are not sent to DeepL");
    }

    let addr = config.bind_address();
    let app_state = AppState::new(config)?;
    let app = routes::create_router(app_state);

    info!("Starting server on {}", addr);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
