//! Turnstile Daemon - Main Entry Point
//!
//! Composition root: wires the store adapters, the two admission queues,
//! their schedulers and the JSON-RPC edge.

mod telemetry;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Import workspace crates
use turnstile_api_rpc::{RpcServer, RpcServerConfig};
use turnstile_core::application::{
    shutdown_channel, AdmissionQueue, EvictionScheduler, PromotionScheduler,
};
use turnstile_core::domain::PromotionPolicy;
use turnstile_core::port::time_provider::SystemTimeProvider;
use turnstile_core::port::token_provider::UuidTokenProvider;
use turnstile_infra_sqlite::{create_pool, run_migrations, SqliteMemberStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_DB_PATH: &str = "turnstile.db";

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("TURNSTILE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("turnstile=info"))
        .expect("Failed to create env filter");

    let fmt_layer = match log_format.as_str() {
        // Production: JSON structured logging
        "json" => fmt::layer().json().boxed(),
        // Development: Pretty formatting with colors
        _ => fmt::layer().pretty().boxed(),
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(fmt_layer);

    // 1.1. OpenTelemetry layers onto the same registry (optional)
    #[cfg(feature = "telemetry")]
    match telemetry::otlp_layer() {
        Ok(otlp) => {
            let otlp_enabled = otlp.is_some();
            registry.with(otlp).init();
            if otlp_enabled {
                info!("OpenTelemetry initialized successfully");
            }
        }
        Err(e) => {
            registry.init();
            tracing::warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
        }
    }

    #[cfg(not(feature = "telemetry"))]
    {
        registry.init();
        telemetry::warn_if_configured();
    }

    info!("Turnstile v{} starting...", VERSION);

    // 2. Load configuration
    let db_path =
        std::env::var("TURNSTILE_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    let rpc_port: u16 = env_i64("TURNSTILE_RPC_PORT", 9640) as u16;

    let entrance_batch = env_i64("TURNSTILE_ENTRANCE_BATCH", 50);
    let order_capacity = env_i64("TURNSTILE_ORDER_CAPACITY", 100);
    let promotion_interval =
        Duration::from_millis(env_i64("TURNSTILE_PROMOTION_INTERVAL_MS", 1_000) as u64);
    let eviction_interval =
        Duration::from_millis(env_i64("TURNSTILE_EVICTION_INTERVAL_MS", 10_000) as u64);
    let lease_timeout_ms = env_i64("TURNSTILE_LEASE_TIMEOUT_MS", 600_000);

    info!(db_path = %db_path, "Initializing store...");

    // 3. Initialize store
    let pool = create_pool(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("Store pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let token_provider = Arc::new(UuidTokenProvider);

    let entrance = Arc::new(AdmissionQueue::new(
        "entrance",
        PromotionPolicy::rate(entrance_batch)?,
        Arc::new(SqliteMemberStore::new(pool.clone(), "entrance:wait")),
        Arc::new(SqliteMemberStore::new(pool.clone(), "entrance:active")),
        time_provider.clone(),
    ));

    let order = Arc::new(AdmissionQueue::new(
        "order",
        PromotionPolicy::capacity(order_capacity)?,
        Arc::new(SqliteMemberStore::new(pool.clone(), "order:wait")),
        Arc::new(SqliteMemberStore::new(pool.clone(), "order:active")),
        time_provider.clone(),
    ));

    // 5. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        port: rpc_port,
        ..Default::default()
    };
    let rpc_server = RpcServer::new(
        rpc_config,
        entrance.clone(),
        order.clone(),
        token_provider,
    );
    let rpc_handle = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 6. Start schedulers
    // Single-writer deployment: exactly one daemon instance runs these loops
    // against a given store, which keeps the capacity check-then-act race
    // out of the picture.
    info!("Starting schedulers...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let entrance_promoter = PromotionScheduler::new(entrance.clone(), promotion_interval);
    let entrance_handle = tokio::spawn(entrance_promoter.run(shutdown_rx.clone()));

    let order_promoter = PromotionScheduler::new(order.clone(), promotion_interval);
    let order_handle = tokio::spawn(order_promoter.run(shutdown_rx.clone()));

    // Eviction guards bounded occupancy only; the rate queue has nothing to
    // protect.
    let evictor_handle = if order.policy().has_bounded_occupancy() {
        let evictor = EvictionScheduler::new(order.clone(), eviction_interval, lease_timeout_ms);
        tokio::spawn(evictor.run(shutdown_rx))
    } else {
        tokio::spawn(async {})
    };

    info!("System ready. Waiting for admissions...");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    let _ = tokio::time::timeout(
        Duration::from_secs(5),
        join_schedulers(entrance_handle, order_handle, evictor_handle),
    )
    .await;

    info!("Shutdown complete.");

    Ok(())
}

async fn join_schedulers(
    a: tokio::task::JoinHandle<()>,
    b: tokio::task::JoinHandle<()>,
    c: tokio::task::JoinHandle<()>,
) {
    let _ = a.await;
    let _ = b.await;
    let _ = c.await;
}
