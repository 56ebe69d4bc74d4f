#![doc = include_str!("../README.md")]

mod config;
mod server;
mod telemetry;

use std::sync::Arc;

use clap::Parser;
use config::{CliArgs, ServerConfig};
use flakegen::{LockSnowflakeGenerator, MonotonicClock};
use tokio::{net::TcpListener, signal};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    // Before resolving the node ID, so derivation is logged.
    telemetry::init_tracing();
    let config = ServerConfig::try_from(args)?;

    let generator = Arc::new(LockSnowflakeGenerator::new(
        config.node_id,
        MonotonicClock::default(),
    ));
    let listener = TcpListener::bind(&config.server_addr).await?;
    log_startup_info(&config);

    server::serve(listener, generator, config.reply_format, shutdown_signal()).await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting ID sidecar with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting ID sidecar on {} with node id {}",
            config.server_addr,
            config.node_id
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
