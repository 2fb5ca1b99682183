use anyhow::Result;
use clap::Parser;

mod api;
mod cli;
mod config;
mod enhance;
mod limiter;
mod selector;
mod sources;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr: hook handlers own stdout.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    cli.run().await
}
