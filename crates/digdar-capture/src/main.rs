//! digdar-capture - radar sweep capture daemon.
//!
//! Listens for the digdar digitizer's pulse stream, assembles sweeps, and
//! publishes them for the scan-conversion consumer. Configuration comes from
//! `digdar.toml` (or `--config`) plus `DIGDAR_`-prefixed environment
//! variables; log filtering follows `RUST_LOG`.

use anyhow::Result;
use clap::Parser;
use digdar_capture::capture::CaptureServer;
use digdar_capture::config::CaptureConfig;
use digdar_capture::digitizer;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "digdar-capture", version, about = "Radar sweep capture daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = CaptureConfig::load(args.config.as_deref())?;
    info!(
        site = %config.site,
        port = config.listen_port,
        max_pulses = config.max_pulses,
        ns = config.samples_per_pulse,
        "digdar capture starting"
    );

    let server = CaptureServer::bind(config.clone()).await?;

    if let Some(dig) = &config.digitizer {
        if let Err(err) = digitizer::start_remote(dig, &config).await {
            warn!("could not start remote digitizer: {err:#}");
        }
    }

    server.run().await?;
    Ok(())
}
