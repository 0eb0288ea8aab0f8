//! bx - bucket explorer client
//!
//! A command-line interface for buckets exposed through a dashboard
//! storage API.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bucket_explorer::commands::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --debug; logs go to stderr to keep stdout clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.debug { "debug" } else { "warn" }));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
