//! Dashboard session: account scoping, maturity-driven refresh and run creation.

mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{Listing, ManualWallet, ScriptedBridge, ScriptedPrompt, listing_bridge, run};
use dys_bridge::{
    BridgeError, QUERY_QUERY_SCRIPT, QUERY_SCHEDULED_RUN_ALL, SEND_CREATE_SCHEDULED_RUN,
};
use dys_scheduler::{Dashboard, DashboardOptions, RunDraft, SchedulerError, ViewState};
use serde_json::{Value, json};

async fn connect(
    bridge: Arc<ScriptedBridge>,
    wallet: &ManualWallet,
    options: DashboardOptions,
) -> Result<Dashboard> {
    let prompt = Arc::new(ScriptedPrompt::default());
    Ok(Dashboard::connect(bridge, wallet, prompt, options).await?)
}

fn listing_prefixes(bridge: &ScriptedBridge) -> Vec<String> {
    bridge
        .payloads_for(QUERY_SCHEDULED_RUN_ALL)
        .iter()
        .map(|payload| payload["query"]["index"].as_str().unwrap_or("?").to_string())
        .collect()
}

#[tokio::test]
async fn missing_wallet_fails_to_connect() {
    let bridge = Arc::new(listing_bridge(Listing::default(), 1));
    let result = connect(bridge, &ManualWallet::missing(), DashboardOptions::default()).await;
    let error = result.err().expect("no wallet");
    assert!(matches!(
        error.downcast_ref::<SchedulerError>(),
        Some(SchedulerError::MissingWallet)
    ));
    assert_eq!(error.to_string(), "dys not available");
}

#[tokio::test]
async fn prefix_defaults_to_account_unless_view_restores_one() -> Result<()> {
    let bridge = Arc::new(listing_bridge(Listing::default(), 1));
    let wallet = ManualWallet::with_account("dys1alice");

    let mut dashboard = connect(bridge.clone(), &wallet, DashboardOptions::default()).await?;
    dashboard.load_more().await?;
    assert_eq!(dashboard.filter().prefix, "dys1alice");

    let restored = DashboardOptions {
        view: ViewState::from_query("?prefix=dys1bob&reversed=true"),
        ..DashboardOptions::default()
    };
    let mut dashboard = connect(bridge.clone(), &wallet, restored).await?;
    dashboard.load_more().await?;
    assert_eq!(dashboard.view_state().to_query(), "prefix=dys1bob&reversed=true");

    assert_eq!(listing_prefixes(&bridge), ["dys1alice", "dys1bob"]);
    Ok(())
}

#[tokio::test]
async fn account_switch_rescopes_the_listing() -> Result<()> {
    let bridge = Arc::new(listing_bridge(Listing::default(), 1));
    let wallet = ManualWallet::with_account("dys1alice");
    let mut dashboard = connect(bridge.clone(), &wallet, DashboardOptions::default()).await?;
    assert!(!dashboard.sync_account());

    wallet.switch_to("dys1carol");
    assert!(dashboard.sync_account());
    assert_eq!(dashboard.account().bech32_address, "dys1carol");
    assert_eq!(dashboard.filter().prefix, "dys1carol");
    assert_eq!(dashboard.draft(None).creator, "dys1carol");
    Ok(())
}

#[tokio::test]
async fn reconnect_picks_up_a_silent_account_change() -> Result<()> {
    let bridge = Arc::new(listing_bridge(Listing::default(), 1));
    let wallet = ManualWallet::with_account("dys1alice");
    let mut dashboard = connect(bridge, &wallet, DashboardOptions::default()).await?;
    assert!(dashboard.is_subscribed());

    wallet.replace_account("dys1dave");
    assert!(!dashboard.sync_account(), "no change was published");
    assert!(dashboard.reconnect(&wallet).await?);
    assert_eq!(wallet.connections(), 2);
    assert_eq!(dashboard.account().bech32_address, "dys1dave");
    assert_eq!(dashboard.filter().prefix, "dys1dave");
    assert!(dashboard.is_subscribed());

    // The fresh subscription delivers later switches.
    wallet.switch_to("dys1erin");
    assert!(dashboard.sync_account());
    assert_eq!(dashboard.filter().prefix, "dys1erin");
    assert!(!dashboard.reconnect(&wallet).await?, "same account");
    Ok(())
}

#[tokio::test]
async fn failed_reconnect_keeps_the_session() -> Result<()> {
    let bridge = Arc::new(listing_bridge(Listing::default(), 1));
    let wallet = ManualWallet::with_account("dys1alice");
    let mut dashboard = connect(bridge, &wallet, DashboardOptions::default()).await?;

    wallet.disconnect();
    let error = dashboard.reconnect(&wallet).await.err().expect("wallet gone");
    assert!(matches!(error, SchedulerError::MissingWallet));
    assert!(dashboard.is_subscribed());
    assert_eq!(dashboard.account().bech32_address, "dys1alice");
    Ok(())
}

#[tokio::test]
async fn explicit_prefix_survives_reconnect() -> Result<()> {
    let bridge = Arc::new(listing_bridge(Listing::default(), 1));
    let wallet = ManualWallet::with_account("dys1alice");
    let mut dashboard = connect(bridge, &wallet, DashboardOptions::default()).await?;
    assert!(dashboard.set_prefix("dys1shared"));

    wallet.replace_account("dys1dave");
    assert!(dashboard.reconnect(&wallet).await?);
    assert_eq!(dashboard.filter().prefix, "dys1shared");
    Ok(())
}

#[tokio::test]
async fn maturing_run_triggers_one_refresh() -> Result<()> {
    let listing = Listing::default().page("", vec![run("r1", 105), run("r2", 90)], None);
    let bridge = Arc::new(listing_bridge(listing.clone(), 100));
    let wallet = ManualWallet::with_account("dys1alice");
    let mut dashboard = connect(bridge.clone(), &wallet, DashboardOptions::default()).await?;
    dashboard.load_more().await?;

    assert!(!dashboard.on_block(100).await?);
    assert!(!dashboard.on_block(105).await?);
    assert!(!dashboard.on_block(106).await?);

    let mut executed = run("r1", 105);
    executed["resp"] = json!({"response": "{\"ok\": true}"});
    listing.replace_page("", vec![executed, run("r2", 90)], None);

    assert!(dashboard.on_block(107).await?);
    assert_eq!(
        dashboard.runs()[0].status(),
        dys_types::RunStatus::Succeeded
    );
    // Reconciler reset: further blocks do not refetch again.
    assert!(!dashboard.on_block(108).await?);
    assert_eq!(bridge.payloads_for(QUERY_SCHEDULED_RUN_ALL).len(), 2);
    Ok(())
}

#[tokio::test]
async fn refresh_forgets_runs_that_left_the_listing() -> Result<()> {
    let listing = Listing::default().page("", vec![run("r1", 105), run("r2", 110)], None);
    let bridge = Arc::new(listing_bridge(listing.clone(), 100));
    let wallet = ManualWallet::with_account("dys1alice");
    let mut dashboard = connect(bridge, &wallet, DashboardOptions::default()).await?;
    dashboard.load_more().await?;

    assert!(!dashboard.on_block(100).await?);
    assert_eq!(dashboard.tracked_runs(), 2);

    listing.replace_page("", vec![run("r2", 110)], None);
    dashboard.refresh().await?;
    assert_eq!(dashboard.runs().len(), 1);
    assert_eq!(dashboard.tracked_runs(), 1);
    Ok(())
}

#[tokio::test]
async fn create_run_submits_then_refreshes() -> Result<()> {
    let listing = Listing::default().page("", vec![run("r1", 120)], None);
    let answering = listing.clone();
    let bridge = Arc::new(ScriptedBridge::new(move |command, payload| match command {
        QUERY_SCHEDULED_RUN_ALL => answering.answer(payload),
        QUERY_QUERY_SCRIPT => Ok(json!({"response": "{\"script_gas_consumed\": 1000}"})),
        SEND_CREATE_SCHEDULED_RUN => Ok(json!({"code": 0, "rawLog": "[]"})),
        other => Err(BridgeError::Unsupported(other.to_string())),
    }));
    let wallet = ManualWallet::with_account("dys1alice");
    let mut dashboard = connect(
        bridge.clone(),
        &wallet,
        DashboardOptions {
            default_fee: 250,
            ..DashboardOptions::default()
        },
    )
    .await?;

    let mut draft = dashboard.draft(Some("120"));
    draft.select_function("tick");
    draft.set_kwargs(&json!({"n": 1}));
    let estimate = dashboard.estimate_gas(&mut draft).await?;
    assert_eq!(estimate.suggested_gas, Some(1200));
    assert_eq!(draft.gas, "1200");

    let result = dashboard.create_run(&draft).await?;
    assert_eq!(result.fee, 250);
    assert_eq!(result.attempts, 1);
    assert_eq!(dashboard.runs().len(), 1);

    let sent = bridge.payloads_for(SEND_CREATE_SCHEDULED_RUN);
    assert_eq!(sent.len(), 1);
    let value: &Value = &sent[0]["value"];
    assert_eq!(value["creator"], "dys1alice");
    assert_eq!(value["height"], "120");
    assert_eq!(value["gas"], "1200");
    assert_eq!(value["msg"]["address"], "dys1alice");
    assert_eq!(value["msg"]["function_name"], "tick");
    assert_eq!(value["msg"]["kwargs"], "{\"n\":1}");
    assert_eq!(sent[0]["gas"], "2500000");
    Ok(())
}

#[test]
fn draft_prefills_account_and_height() {
    let mut draft = RunDraft::initial("dys1alice", Some("42"));
    assert_eq!(draft.creator, "dys1alice");
    assert_eq!(draft.msg_creator, "dys1alice");
    assert_eq!(draft.msg_address, "dys1alice");
    assert_eq!(draft.height, "42");

    draft.select_function("tick");
    draft.set_kwargs(&json!({"a": 1}));
    draft.select_function("tick");
    assert_eq!(draft.msg_kwargs, "{\"a\":1}", "reselecting keeps kwargs");
    draft.select_function("tock");
    assert!(draft.msg_kwargs.is_empty(), "changing function clears kwargs");

    let msg = draft.msg();
    assert_eq!(msg.function_name, "tock");
    assert_eq!(msg.address, "dys1alice");
}
