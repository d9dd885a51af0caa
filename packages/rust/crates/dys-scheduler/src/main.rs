//! dys-scheduler CLI: list, inspect, estimate, create and watch scheduled runs.
//!
//! Endpoints come from `dys-scheduler.yaml` settings; `--api-url` / `--signer-url` override.
//!
//! Logging: set `RUST_LOG=dys_scheduler=debug,dys_bridge=debug` to see bridge traffic on stderr.

mod bridge_builder;
mod cli;
mod nodes;
mod prompt;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dys_scheduler::{SchedulerError, load_runtime_settings, set_config_home_override};

use crate::bridge_builder::build_endpoints;
use crate::cli::{Cli, Command};
use crate::nodes::{
    run_block_mode, run_create_mode, run_estimate_gas_mode, run_functions_mode, run_list_mode,
    run_query_mode, run_schema_mode, run_watch_mode, run_wire_schema_mode,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(conf_dir) = cli.conf.clone() {
        set_config_home_override(conf_dir);
    }

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "dys_scheduler=debug,dys_bridge=debug"
        } else {
            "dys_scheduler=info,dys_bridge=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let runtime_settings = load_runtime_settings();
    if let Command::WireSchema = cli.command {
        return run_wire_schema_mode();
    }
    let endpoints = build_endpoints(
        &runtime_settings,
        cli.api_url.as_deref(),
        cli.signer_url.as_deref(),
    )?;

    let outcome = match cli.command {
        Command::List {
            listing,
            pages,
            json,
        } => run_list_mode(listing, pages, json, &endpoints, &runtime_settings).await,
        Command::Functions { address, json } => {
            run_functions_mode(address, json, &endpoints).await
        }
        Command::Schema { address, function } => {
            run_schema_mode(address, function, &endpoints).await
        }
        Command::Query { draft } => run_query_mode(draft, &endpoints).await,
        Command::EstimateGas { draft } => run_estimate_gas_mode(draft, &endpoints).await,
        Command::Create { draft, fee, yes } => {
            run_create_mode(draft, fee, yes, &endpoints, &runtime_settings).await
        }
        Command::Block => run_block_mode(&endpoints).await,
        Command::Watch { listing } => run_watch_mode(listing, &endpoints, &runtime_settings).await,
        Command::WireSchema => run_wire_schema_mode(),
    };

    match outcome {
        Err(error)
            if matches!(
                error.downcast_ref::<SchedulerError>(),
                Some(SchedulerError::UserAborted)
            ) =>
        {
            tracing::info!(event = "dys.cli.aborted", "submission aborted by operator");
            Ok(())
        }
        other => other,
    }
}
