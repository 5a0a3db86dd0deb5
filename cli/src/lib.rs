use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;

type Result<T> = std::result::Result<T, error::Error>;

pub fn run() {
    init_tracing();

    let cli = cli::Cli::parse();
    cli.run();
}

/// Log to standard error, filtered by `RUST_LOG`. Engine warnings are shown by default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("energy_invoice=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
