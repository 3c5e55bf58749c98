//! Deletes old GitHub Actions workflow runs of a repository.

use std::process::ExitCode;

use clap::Parser as _;
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

use workflow_retention::{
    cli::Cli,
    janitor::{Janitor, Summary},
    report::TracingReporter,
};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(run(&cli)));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            // Marks the step as failed when running in GitHub Actions
            println!("::error::{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<Summary> {
    let options = cli.options()?;
    let client = cli.client(options.repository.clone())?;

    Janitor::new(client, options)
        .run(&mut TracingReporter)
        .await
}
