//! Lineup Queue Engine - Main Entry Point

mod settings;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lineup_api_rpc::{RpcServer, RpcServerConfig};
use lineup_core::application::{ChangeNotifier, NotificationDispatcher, QueueOpsService};
use lineup_core::port::id_provider::UuidProvider;
use lineup_core::port::notify::NotificationChannel;
use lineup_core::port::time_provider::SystemTimeProvider;
use lineup_infra_channels::{HttpEmailChannel, HttpSmsChannel};
use lineup_infra_realtime::{RealtimeHub, DEFAULT_TOPIC_CAPACITY};
use lineup_infra_sqlite::{create_pool, run_migrations, SqliteLedger, SqliteQueueRepository};
use settings::Settings;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let settings = Settings::from_env();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("lineup=info"))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    match settings.log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Lineup Queue Engine v{} starting...", VERSION);

    // 2. Initialize database
    info!(db_path = %settings.db_path, "Initializing database...");
    let pool = create_pool(&settings.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let ledger = Arc::new(SqliteLedger::new(pool.clone()));
    let repo = Arc::new(SqliteQueueRepository::new(pool.clone()));

    let hub = Arc::new(RealtimeHub::new(DEFAULT_TOPIC_CAPACITY));
    let notifier = Arc::new(ChangeNotifier::new(
        hub.clone(),
        settings.service_estimate_minutes,
    ));

    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();
    match &settings.email {
        Some(config) => {
            channels.push(Arc::new(
                HttpEmailChannel::new(config.clone())
                    .map_err(|e| anyhow::anyhow!("email channel setup failed: {}", e))?,
            ));
            info!("Email channel configured");
        }
        None => info!("Email channel not configured; email notifications disabled"),
    }
    match &settings.sms {
        Some(config) => {
            channels.push(Arc::new(
                HttpSmsChannel::new(config.clone())
                    .map_err(|e| anyhow::anyhow!("sms channel setup failed: {}", e))?,
            ));
            info!("SMS channel configured");
        }
        None => info!("SMS channel not configured; SMS notifications disabled"),
    }
    let dispatcher = Arc::new(NotificationDispatcher::new(
        channels,
        settings.service_estimate_minutes,
    ));

    let service = Arc::new(QueueOpsService::new(
        ledger,
        repo,
        notifier,
        dispatcher,
        id_provider,
        time_provider,
        settings.service_estimate_minutes,
    ));

    // 4. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        host: settings.rpc_host.clone(),
        port: settings.rpc_port,
    };
    let rpc_handle = RpcServer::new(rpc_config, service)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!("System ready. Accepting queue operations.");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    pool.close().await;

    info!("Shutdown complete.");

    Ok(())
}
