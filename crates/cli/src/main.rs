//! CloudNet CLI - Main Entry Point
//!
//! Reconciles one network per invocation and prints a result document on
//! stdout. Logs go to stderr.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use cloudnet_common::{ApiConfig, RunSummary};
use cloudnet_provider::{HttpApiClient, NetworkReconciler};

mod args;
mod output;

use args::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let format = cli.format;
    match run(cli).await {
        Ok(summary) => output::print_item(&summary, format),
        Err(e) => {
            error!("{:#}", e);
            output::print_failure(&format!("{:#}", e), format);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    let params = cli.module_params()?;
    let (spec, state) = params.validate()?;
    let dry_run = params.check_mode();
    let poll_policy = params.poll_policy()?;

    // Credentials must resolve before any API call
    let config = ApiConfig::resolve(&params.credentials()?, params.api_region.as_deref())?;
    info!("Using API endpoint {} ({:?})", config.endpoint, config.method);
    let client = HttpApiClient::new(config)?;

    let reconciler = NetworkReconciler::new(Arc::new(client))
        .with_poll_async(params.poll_async())
        .with_poll_policy(poll_policy);

    let outcome = reconciler.reconcile(&spec, state, dry_run).await?;
    if outcome.changed {
        info!("Network '{}' changed", spec.name);
    }

    Ok(outcome.summary())
}
