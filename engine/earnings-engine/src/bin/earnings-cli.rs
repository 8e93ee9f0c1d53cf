//! # Earnings CLI Binary
//!
//! Command-line interface for querying rankings and payout ladders.

use anyhow::Result;
use clap::Parser;
use earnings_engine::cli::{Cli, CliHandler};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let handler = CliHandler::new(cli.data_dir.as_ref(), cli.season)?;

    handler.handle_command(cli.command)?;

    Ok(())
}
