//! TaskMaster command-line client
//!
//! Signs in against the TaskMaster REST API and manages the user's tasks.
//! Logs go to stderr; rendered output goes to stdout.

mod app;
mod cli;
mod config;
mod render;
mod routes;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::cli::Cli;
use crate::config::{Config, DEFAULT_LOG_FILTER};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("taskmaster error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_cli(&cli)?;
    tracing::debug!("Using token file: {:?}", config.token_file);

    let mut app = App::new(config);
    app.start().await;

    let result = app.run(cli.command).await;
    for line in app.take_notifications() {
        eprintln!("{}", line);
    }

    println!("{}", result?);
    Ok(())
}
