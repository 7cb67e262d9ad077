use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tts_gateway::config::GatewayConfig;
use tts_gateway::gateway::Gateway;
use tts_gateway::serve;

#[derive(Parser)]
#[command(
    name = "tts-gateway",
    version,
    about = "Authenticated routing gateway for serverless TTS engines"
)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Fails fast here when auth is enabled without a signing secret.
    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    let gateway = Arc::new(Gateway::from_config(&config));

    let engines = gateway.engine_names();
    if engines.is_empty() {
        warn!("no engine endpoints configured; synthesis requests will fail");
    }
    info!(
        auth_enabled = config.auth_enabled,
        engines = ?engines,
        "starting gateway"
    );
    if !config.auth_enabled {
        warn!("token auth is DISABLED; synthesis requests are open to anyone");
    }

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, serve::router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
