//! Debounced filter input.

mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common::{Listing, ManualWallet, ScriptedPrompt, listing_bridge};
use dys_bridge::QUERY_SCHEDULED_RUN_ALL;
use dys_scheduler::{Dashboard, DashboardOptions, FilterDebouncer};
use tokio::sync::mpsc::error::TryRecvError;

const WINDOW: Duration = Duration::from_millis(300);

#[tokio::test(start_paused = true)]
async fn rapid_keystrokes_emit_the_last_value_once() {
    let (debouncer, mut settled) = FilterDebouncer::spawn(WINDOW);
    for text in ["a", "ab", "abc"] {
        debouncer.push(text);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    assert_eq!(settled.recv().await.as_deref(), Some("abc"));
    tokio::time::sleep(WINDOW * 3).await;
    assert_eq!(settled.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn separated_inputs_each_settle() {
    let (debouncer, mut settled) = FilterDebouncer::spawn(WINDOW);
    debouncer.push("dys1a");
    assert_eq!(settled.recv().await.as_deref(), Some("dys1a"));
    debouncer.push("dys1b");
    assert_eq!(settled.recv().await.as_deref(), Some("dys1b"));
}

#[tokio::test(start_paused = true)]
async fn repeating_the_settled_value_is_suppressed() {
    let (debouncer, mut settled) = FilterDebouncer::spawn(WINDOW);
    debouncer.push("same");
    assert_eq!(settled.recv().await.as_deref(), Some("same"));
    debouncer.push("same");
    tokio::time::sleep(WINDOW * 2).await;
    assert_eq!(settled.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn cancel_discards_pending_input() {
    let (debouncer, mut settled) = FilterDebouncer::spawn(WINDOW);
    debouncer.push("pending");
    tokio::time::sleep(Duration::from_millis(50)).await;
    debouncer.cancel();
    assert_eq!(settled.recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn typing_a_prefix_fetches_the_listing_once() -> Result<()> {
    let bridge = Arc::new(listing_bridge(Listing::default(), 1));
    let wallet = ManualWallet::with_account("dys1alice");
    let prompt = Arc::new(ScriptedPrompt::default());
    let mut dashboard = Dashboard::connect(
        bridge.clone(),
        &wallet,
        prompt,
        DashboardOptions::default(),
    )
    .await?;
    dashboard.load_more().await?;

    let (debouncer, mut settled) = FilterDebouncer::spawn(WINDOW);
    for text in ["a", "ab", "abc"] {
        debouncer.push(text);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(WINDOW * 3).await;
    while let Ok(prefix) = settled.try_recv() {
        if dashboard.set_prefix(prefix) {
            dashboard.load_more().await?;
        }
    }

    let fetched: Vec<String> = bridge
        .payloads_for(QUERY_SCHEDULED_RUN_ALL)
        .iter()
        .map(|payload| payload["query"]["index"].as_str().unwrap_or("?").to_string())
        .collect();
    assert_eq!(fetched, ["dys1alice", "abc"]);
    Ok(())
}
