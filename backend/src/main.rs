use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use dashboard_edge::config::{Config, LoggingConfig};
use dashboard_edge::{AppState, build_gate_state, build_router};

#[derive(Debug, Parser)]
#[command(name = "dashboard-edge", version, about = "Locale and authentication edge for the dashboard")]
struct Args {
    /// Path to config.toml (defaults to conf/config.toml or ./config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Override server.host
    #[arg(long)]
    host: Option<String>,

    /// Override server.port
    #[arg(long)]
    port: Option<u16>,
}

fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    let Some(file) = &config.file else {
        registry.init();
        return None;
    };

    let path = Path::new(file);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "dashboard-edge.log".into());

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
    registry.with(fmt::layer().with_writer(writer).with_ansi(false)).init();
    Some(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Config loading logs overrides before the configured subscriber exists.
    let bootstrap = fmt().with_env_filter(EnvFilter::new("info")).finish();
    let mut config =
        tracing::subscriber::with_default(bootstrap, || Config::load(args.config.as_deref()))?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let _log_guard = init_logging(&config.logging);
    for warning in config.warnings() {
        tracing::warn!("⚠️  {}", warning);
    }

    let gate = build_gate_state(&config)?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let upstream = config.upstream.url.clone();
    let state = Arc::new(AppState::new(&config)?);
    let app = build_router(state, gate);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("dashboard-edge listening on {} (upstream {})", addr, upstream);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
