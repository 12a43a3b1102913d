//! Service entry point: configuration, logging, runtime, HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use channel_optimizer::http::{self, AppState};
use channel_optimizer::metrics::Metrics;
use channel_optimizer::Config;

fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config);

    info!("Starting Channel Optimizer");
    info!(?config, "Configuration loaded");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("Failed to build runtime")?;

    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<()> {
    let metrics = Metrics::new().context("Failed to register metrics")?;
    let state = Arc::new(AppState {
        config: config.clone(),
        metrics,
    });

    let app = http::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::builder()
        .with_default_directive(
            config
                .log_level
                .parse()
                .unwrap_or_else(|_| Level::INFO.into()),
        )
        .from_env_lossy();

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .init();
    }
}
