//! TicketTriage Server
//!
//! Single-endpoint HTTP service that classifies free-text customer-support
//! tickets by delegating inference to an OpenAI-compatible chat API, guarded
//! by API-key authentication and per-address rate limiting.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

use tickettriage_server::{config, routes, state::AppState};

#[derive(Parser, Debug)]
#[command(name = "tickettriage-server")]
#[command(about = "Customer-support ticket classification service", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Model identifier override
    #[arg(short, long)]
    model: Option<String>,

    /// Listen address
    #[arg(short = 'l', long, default_value = "0.0.0.0")]
    listen: String,

    /// Listen port
    #[arg(short = 'P', long, default_value = "8000")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    info!("Starting TicketTriage Server");

    // Load configuration; secrets come from the environment and are required
    let config = config::ServerConfig::load(&cli.config, cli.model.as_deref())?;
    let secrets = config::Secrets::from_env()?;
    info!("Configuration loaded successfully");
    info!("Provider: {}", config.provider.base_url);
    info!("Model: {}", config.provider.model);
    info!(
        "Rate limit: {} requests per {}s per address",
        config.rate_limit.max_requests, config.rate_limit.window_secs
    );

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    // Initialize application state
    let state = AppState::new(config, secrets, metrics_handle)?;

    let addr: SocketAddr = format!("{}:{}", cli.listen, cli.port).parse()?;
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    // Graceful shutdown handler
    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("tickettriage=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tickettriage=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "tickettriage_requests_total",
        "Total number of classification requests received"
    );
    metrics::describe_counter!(
        "tickettriage_classifications_total",
        "Successful classifications by category"
    );
    metrics::describe_counter!(
        "tickettriage_errors_total",
        "Request failures by kind"
    );
    metrics::describe_histogram!(
        "tickettriage_request_latency_seconds",
        metrics::Unit::Seconds,
        "End-to-end request latency in seconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
