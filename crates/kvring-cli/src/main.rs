//! CLI entry point for kvring.

use clap::Parser;
use kvring_cli::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = CliConfig::parse();
    kvring_cli::commands::run(config).await
}
