use std::sync::Arc;

use dys_bridge::{AccountCallback, WalletBridge};
use dys_scheduler::{RuntimeSettings, ScheduledRunPager, SchedulerError, ViewState};
use dys_types::{AccountInfo, ScheduledRun};

use crate::bridge_builder::Endpoints;
use crate::cli::ListingArgs;

pub(crate) async fn run_list_mode(
    listing: ListingArgs,
    pages: usize,
    json: bool,
    endpoints: &Endpoints,
    runtime_settings: &RuntimeSettings,
) -> anyhow::Result<()> {
    let mut view = resolve_view(&listing);
    if view.prefix.is_empty() {
        view.prefix = connected_address(&endpoints.wallet).await?;
    }
    let mut pager = ScheduledRunPager::new(
        Arc::clone(&endpoints.bridge),
        runtime_settings.reverse_convention(),
        view.filter(),
    );
    for _ in 0..pages.max(1) {
        if !pager.load_more().await? {
            break;
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(pager.runs())?);
    } else {
        print_runs(pager.runs());
        eprintln!(
            "{} run(s), {} page(s){}; view: ?{}",
            pager.runs().len(),
            pager.pages_loaded(),
            if pager.has_more() { ", more available" } else { "" },
            ViewState::from(pager.filter()).to_query()
        );
    }
    Ok(())
}

/// `--view` first, then explicit `--prefix` / `--reversed`.
pub(crate) fn resolve_view(listing: &ListingArgs) -> ViewState {
    let mut view = listing
        .view
        .as_deref()
        .map(ViewState::from_query)
        .unwrap_or_default();
    if let Some(prefix) = listing.prefix.as_deref() {
        view.prefix = prefix.trim().to_string();
    }
    if listing.reversed {
        view.reversed = true;
    }
    view
}

/// Account address when a wallet is reachable; empty (unfiltered) otherwise.
async fn connected_address(wallet: &dyn WalletBridge) -> anyhow::Result<String> {
    let ignore: AccountCallback = Arc::new(|_: AccountInfo| {});
    match wallet.connect(ignore).await {
        Ok((account, _subscription)) => Ok(account.bech32_address),
        Err(error) => match SchedulerError::from(error) {
            SchedulerError::MissingWallet => {
                tracing::info!(
                    event = "dys.cli.list_unfiltered",
                    "no wallet available; listing without prefix"
                );
                Ok(String::new())
            }
            other => Err(other.into()),
        },
    }
}

pub(crate) fn print_runs(runs: &[ScheduledRun]) {
    for run in runs {
        println!("{}", format_run(run));
    }
}

fn format_run(run: &ScheduledRun) -> String {
    let mut line = format!(
        "{}\t{}\theight={}\tgas={}\t{}@{}",
        run.index,
        run.status(),
        run.height,
        run.gas,
        if run.msg.function_name.is_empty() {
            "-"
        } else {
            run.msg.function_name.as_str()
        },
        run.msg.address
    );
    if let Some(error) = run.error.as_deref() {
        line.push_str("\terror=");
        line.push_str(error);
    }
    line
}
