use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use unicat_api::{AppState, RestApi};
use unicat_core::CatalogConfig;
use unicat_engine::{EtlConfig, EtlEngine};

/// Unified product catalog over heterogeneous stores
#[derive(Parser, Debug)]
#[command(name = "unicat")]
#[command(about = "Unified catalog: schema mapping, scheduled ETL and federated queries", long_about = None)]
struct Args {
    /// Path to the JSON catalog configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP API port
    #[arg(long, default_value_t = 5000)]
    http_port: u16,

    /// Override the batch interval from the config file
    #[arg(long)]
    interval_minutes: Option<u64>,

    /// Override the per-source sample limit from the config file
    #[arg(long)]
    sample_limit: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting UniCat v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading catalog config from {:?}", path);
            CatalogConfig::load(path).with_context(|| format!("loading {:?}", path))?
        }
        None => {
            warn!("No --config given, starting with no sources");
            CatalogConfig::default()
        }
    };
    if let Some(minutes) = args.interval_minutes {
        config.interval_minutes = minutes;
    }
    if let Some(limit) = args.sample_limit {
        config.sample_limit = limit;
    }
    config.validate()?;

    let connectors = config.build_connectors()?;
    info!(
        "Configured {} sources, interval {} min, sample limit {}",
        connectors.len(),
        config.interval_minutes,
        config.sample_limit
    );

    let engine = Arc::new(EtlEngine::new(connectors, EtlConfig::from(&config)));
    let scheduler = engine.schedule();

    let state = Arc::new(AppState::new(engine.clone()));
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("UniCat started successfully");
    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    scheduler.stop().await;
    Ok(())
}
