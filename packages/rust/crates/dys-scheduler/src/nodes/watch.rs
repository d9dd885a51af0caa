use std::sync::Arc;

use dys_scheduler::{
    AutoConfirmPrompt, BlockPoller, Dashboard, FilterDebouncer, OperatorPrompt, RuntimeSettings,
};
use dys_types::BlockInfo;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::bridge_builder::{Endpoints, dashboard_options};
use crate::cli::ListingArgs;
use crate::nodes::listing::{print_runs, resolve_view};

/// Follow the listing until Ctrl+C or `quit`.
///
/// Stdin lines: empty or `more` loads the next page, `reverse` flips ordering, `refresh`
/// reloads, `reconnect` asks the wallet again, anything else is debounced and becomes the
/// new prefix.
pub(crate) async fn run_watch_mode(
    listing: ListingArgs,
    endpoints: &Endpoints,
    runtime_settings: &RuntimeSettings,
) -> anyhow::Result<()> {
    // Watching never submits.
    let prompt: Arc<dyn OperatorPrompt> = Arc::new(AutoConfirmPrompt::new(0));
    let options = dashboard_options(runtime_settings, resolve_view(&listing));
    let mut dashboard = Dashboard::connect(
        Arc::clone(&endpoints.bridge),
        &endpoints.wallet,
        prompt,
        options,
    )
    .await?;
    dashboard.load_more().await?;
    render(&dashboard);

    let poller = BlockPoller::spawn(
        Arc::clone(&endpoints.bridge),
        runtime_settings.block_poll_interval(),
    );
    let mut blocks = poller.subscribe();
    let (debouncer, mut settled) = FilterDebouncer::spawn(runtime_settings.debounce_window());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut filter_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(event = "dys.watch.interrupted", "watch stopped by ctrl-c");
                break;
            }
            changed = blocks.changed() => {
                if changed.is_err() {
                    break;
                }
                let height = blocks
                    .borrow_and_update()
                    .as_ref()
                    .and_then(BlockInfo::height_value);
                let Some(height) = height else {
                    continue;
                };
                match dashboard.on_block(height).await {
                    Ok(true) => render(&dashboard),
                    Ok(false) => {}
                    Err(error) => report(&error),
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        let input = line.trim();
                        match input {
                            "" | "more" => load_more(&mut dashboard).await,
                            "reverse" => {
                                dashboard.toggle_reversed();
                                load_more(&mut dashboard).await;
                            }
                            "refresh" => match dashboard.refresh().await {
                                Ok(()) => render(&dashboard),
                                Err(error) => report(&error),
                            },
                            "reconnect" => match dashboard.reconnect(&endpoints.wallet).await {
                                Ok(true) => load_more(&mut dashboard).await,
                                Ok(false) => {}
                                Err(error) => report(&error),
                            },
                            "quit" | "exit" => break,
                            prefix => debouncer.push(prefix),
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(error) => {
                        tracing::warn!(
                            event = "dys.watch.stdin_failed",
                            error = %error,
                            "stdin read failed; filter input disabled"
                        );
                        stdin_open = false;
                    }
                }
            }
            prefix = settled.recv(), if filter_open => {
                let Some(prefix) = prefix else {
                    filter_open = false;
                    continue;
                };
                if dashboard.set_prefix(prefix) {
                    load_more(&mut dashboard).await;
                }
            }
        }

        if dashboard.sync_account() {
            load_more(&mut dashboard).await;
        }
    }

    debouncer.cancel();
    poller.stop();
    Ok(())
}

async fn load_more(dashboard: &mut Dashboard) {
    match dashboard.load_more().await {
        Ok(_) => render(dashboard),
        Err(error) => report(&error),
    }
}

fn render(dashboard: &Dashboard) {
    print_runs(dashboard.runs());
    eprintln!(
        "-- {} run(s){}; view: ?{}",
        dashboard.runs().len(),
        if dashboard.has_more() {
            ", enter for more"
        } else {
            ""
        },
        dashboard.view_state().to_query()
    );
}

fn report(error: &dys_scheduler::SchedulerError) {
    if let Some(message) = error.operator_message() {
        eprintln!("error: {message}");
    }
}
