//! rendergate CLI entry point.

use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use rendergate_cli::cli::{Cli, Commands, OutputFormat};
use rendergate_cli::driver::{classify, load_config, simulate};
use rendergate_cli::output::{format_json, pretty};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, reports to stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rendergate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config().context("invalid RENDERGATE_* environment")?;

    match cli.command {
        Commands::Classify(cmd) => {
            let component_stack = match &cmd.file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            let report = classify(
                &cmd.route,
                cmd.shell.into(),
                &component_stack,
                cmd.prelude.map(Into::into),
                cmd.sync_error,
            )?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_json(&report)?),
                OutputFormat::Pretty => println!("{}", pretty::format_classify(&report)),
            }
        }
        Commands::Simulate(cmd) => {
            let runtime_prefetch = cmd.runtime_prefetch || config.runtime_prefetch;
            let report = simulate(&cmd.steps, runtime_prefetch, cmd.abortable).await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_json(&report)?),
                OutputFormat::Pretty => println!("{}", pretty::format_simulation(&report)),
            }
        }
    }

    Ok(())
}
