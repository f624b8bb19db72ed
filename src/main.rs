use anyhow::{Context, Result};
use clap::Parser;
use s2s_relay::{create_router, AppState, Config, TranslationServiceFactory};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Real-time speech-to-speech translation relay
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/s2s-relay")]
    config: String,

    /// Override the HTTP port from the config file
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_thread_names(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_json);

    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Audio: {}Hz, {} samples/chunk ({:.2}s), {} channel(s)",
        cfg.audio.sample_rate,
        cfg.audio.chunk_size,
        cfg.audio.seconds_per_chunk(),
        cfg.audio.channels
    );

    let service = TranslationServiceFactory::create(&cfg.translation, &cfg.audio);
    info!("Connecting to {} translation service...", service.name());
    match service.connect().await {
        Ok(()) => info!("Connected to translation service"),
        Err(e) => warn!("{} - will retry when a client connects", e),
    }

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(cfg, service.clone());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Disconnecting from translation service...");
    service.disconnect();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
