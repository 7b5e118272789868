//! Capsule command-line client.
//!
//! Thin wrapper over `capsule-sdk`: every subcommand maps onto one SDK call,
//! except `run`, which creates a throwaway sandbox and deletes it afterwards.
//! Results go to stdout, logs to stderr.

mod cli;
mod commands;

use capsule_sdk::{CapsuleClient, ClientConfig};
use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("capsule_cli=info".parse()?)
                .add_directive("capsule_sdk=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::builder()
        .base_url(cli.url)
        .timeout(Duration::from_secs(cli.timeout_secs))
        .build()?;
    tracing::debug!(?config, "Configuration loaded");

    let client = CapsuleClient::with_config(config)?;
    commands::execute(&client, cli.command).await
}
