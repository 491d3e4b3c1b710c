//! CRASH: crash-game round server
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the round engine on the tokio scheduler and serves the JSON API
//! until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crash::api;
use crash::config::AppConfig;
use crash::engine::scheduler::TokioScheduler;
use crash::engine::RoundEngine;

const BANNER: &str = r#"
  ____ ____      _    ____  _   _
 / ___|  _ \    / \  / ___|| | | |
| |   | |_) |  / _ \ \___ \| |_| |
| |___|  _ <  / ___ \ ___) |  _  |
 \____|_| \_\/_/   \_\____/|_| |_|

  Round engine v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path = std::env::var("CRASH_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let cfg = AppConfig::load_or_default(&config_path)?;

    println!("{BANNER}");
    info!(
        config = %config_path,
        port = cfg.server.port,
        tick_interval_ms = cfg.engine.tick_interval_ms,
        growth_factor = cfg.engine.growth_factor,
        history_capacity = cfg.engine.history_capacity,
        disclosure = ?cfg.engine.crash_point_disclosure,
        "CRASH starting up"
    );
    if cfg.server.cors_origin == "*" {
        warn!("CORS allows any origin");
    }

    let scheduler = Arc::new(TokioScheduler::current()?);
    let engine = Arc::new(RoundEngine::new(cfg.engine.clone(), scheduler));

    api::serve(Arc::clone(&engine), &cfg.server, shutdown_signal()).await?;

    engine.reset();
    info!("CRASH shut down cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crash=info"));

    let json_logging = std::env::var("CRASH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
