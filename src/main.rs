// src/main.rs - judgebench entry point

use clap::Parser;

use judgebench::cli::{Cli, Commands};
use judgebench::infra::config::Config;
use judgebench::infra::logger;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG / JUDGEBENCH_LOG)
    logger::init_logging("info");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Defaults < config file < environment < flags
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    match cli.command.clone().unwrap_or(Commands::Run) {
        Commands::Run => judgebench::cli::run::run_batch(&config).await,
        Commands::Pending => judgebench::cli::run::run_pending(&config).await,
        Commands::Summary => judgebench::cli::run::run_summary(&config).await,
        Commands::Ingest { file } => judgebench::cli::ingest::run_ingest(&config, &file).await,
    }
}
