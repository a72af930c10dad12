use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use rebac_engine::{CancelHandle, Cancellation};
use rebac_server::{
    config::{LogConfig, LogFormat},
    create_app, RebacServer, ServerConfig,
};

/// ReBAC HTTP Server
#[derive(Parser, Debug)]
#[command(name = "rebac-server")]
#[command(about = "Relationship-based access control HTTP API server")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "REBAC_CONFIG", default_value = "rebac.toml")]
    config: String,

    /// Server bind address, overrides the config file
    #[arg(long)]
    host: Option<String>,

    /// Server port, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = ServerConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    init_tracing(&config.log, args.verbose)?;

    info!("Starting ReBAC server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        backend = ?config.storage.backend,
        fetch_concurrency = config.engine.fetch_concurrency,
        timeout_ms = ?config.engine.timeout_ms,
        "Configuration loaded"
    );

    let (shutdown, cancellation) = Cancellation::new();
    let addr = config.bind_address();
    let server = RebacServer::from_config(config, cancellation).await?;
    let app = create_app(server);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("ReBAC server running on http://{}", addr);
    info!("Health check available at: http://{}/healthy", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C and cancels in-flight traversals
async fn shutdown_signal(shutdown: CancelHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}

fn init_tracing(log: &LogConfig, verbose: bool) -> anyhow::Result<()> {
    let directives = if verbose {
        "rebac_server=debug,rebac_engine=debug,tower_http=debug,sqlx=warn"
    } else {
        log.filter.as_str()
    };

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directives))?;

    match log.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_timer(ChronoUtc::rfc_3339()),
            )
            .try_init()?,
        // Structured JSON logging for production
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init()?,
    }

    Ok(())
}
