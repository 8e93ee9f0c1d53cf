//! DinkBank API server

use anyhow::{Context, Result};
use clap::Parser;
use dinkbank_api::{
    create_routes, initialize_logging, load_config, shutdown_signal, start_rate_limit_purger,
    ApiState,
};
use earnings_engine::Dataset;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "dinkbank-api")]
#[command(about = "DinkBank player earnings API")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory with players.json, payouts.json and payout_tables.json
    /// (defaults to the embedded dataset)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    initialize_logging(&config.logging)?;
    info!("Starting DinkBank API v{}", env!("CARGO_PKG_VERSION"));

    let addr = config.server_addr().context("Invalid server address")?;

    let state = match &args.data_dir {
        Some(dir) => {
            let dataset = Dataset::load_from_dir(dir)
                .with_context(|| format!("Failed to load dataset from {:?}", dir))?;
            ApiState::with_dataset(config, dataset)
        }
        None => ApiState::new(config)?,
    };
    let state = Arc::new(state);
    info!("Serving {} players", state.dataset.player_count());

    let purger = start_rate_limit_purger(state.clone());

    let routes = create_routes(state);
    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, shutdown_signal())
        .context("Failed to bind server")?;

    info!("Listening on http://{}", bound);
    server.await;

    purger.abort();
    info!("DinkBank API stopped");

    Ok(())
}
