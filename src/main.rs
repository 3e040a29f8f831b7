use anyhow::{Context, Result};
use clap::Parser;
use lingua_relay::{create_router, AppState, Config};
use std::sync::Arc;
use tracing::info;

/// Real-time transcription relay for Lingua meetings
#[derive(Debug, Parser)]
#[command(name = "lingua-relay", version)]
struct Args {
    /// Path to the configuration file (extension optional)
    #[arg(long, default_value = "config/lingua-relay")]
    config: String,

    /// Override the HTTP listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }
    cfg.validate()?;

    info!("{} starting", cfg.service.name);
    info!("Speech model: {} ({})", cfg.stt.model, cfg.stt.language);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(Arc::new(cfg));
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
