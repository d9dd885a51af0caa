//! Fee confirmation, out-of-gas escalation and dry-run gas estimation.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Result;
use common::{ScriptedBridge, ScriptedPrompt};
use dys_bridge::{BridgeError, QUERY_QUERY_SCRIPT, SEND_CREATE_SCHEDULED_RUN};
use dys_scheduler::{
    AutoConfirmPrompt, GasRetrySubmitter, OperatorPrompt, SchedulerError, estimate_gas,
    is_out_of_gas, submission_payload, suggested_gas,
};
use serde_json::json;

const OUT_OF_GAS: &str =
    "out of gas in location: WriteFlat; gasWanted: 2000000, gasUsed: 2000100: out of gas";

/// Bridge rejecting the first `failures` submissions with `message`.
fn failing_then_ok(failures: u32, message: &'static str) -> ScriptedBridge {
    let seen = AtomicU32::new(0);
    ScriptedBridge::new(move |_, _| {
        if seen.fetch_add(1, Ordering::SeqCst) < failures {
            Err(BridgeError::rejected(message))
        } else {
            Ok(json!({"code": 0, "rawLog": "[{\"events\": []}]"}))
        }
    })
}

#[test]
fn payload_derives_gas_from_fee() {
    assert_eq!(
        submission_payload(json!({"creator": "dys1alice"}), 200),
        json!({
            "value": {"creator": "dys1alice"},
            "fee": [{"amount": "200", "denom": "dys"}],
            "gas": "2000000",
        })
    );
}

#[test]
fn out_of_gas_is_a_suffix_match() {
    assert!(is_out_of_gas(OUT_OF_GAS));
    assert!(is_out_of_gas("...: out of gas \n"));
    assert!(!is_out_of_gas("out of gas? no: insufficient funds"));
}

#[tokio::test]
async fn out_of_gas_retries_once_with_double_fee() -> Result<()> {
    let bridge = Arc::new(failing_then_ok(1, OUT_OF_GAS));
    let prompt = Arc::new(ScriptedPrompt::default());
    let submitter = GasRetrySubmitter::new(bridge.clone(), prompt.clone());

    let result = submitter
        .submit(SEND_CREATE_SCHEDULED_RUN, json!({"creator": "dys1alice"}), 200)
        .await?;

    assert_eq!(result.attempts, 2);
    assert_eq!(result.fee, 400);
    assert_eq!(result.gas, 4_000_000);
    assert_eq!(prompt.asked(), [(200, false), (400, true)]);
    assert_eq!(prompt.failures().len(), 1);

    let sent = bridge.payloads_for(SEND_CREATE_SCHEDULED_RUN);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["gas"], "2000000");
    assert_eq!(sent[1]["fee"][0]["amount"], "400");
    assert_eq!(sent[1]["gas"], "4000000");
    // rawLog arrives decoded.
    assert!(result.response["rawLog"].is_array());
    Ok(())
}

#[tokio::test]
async fn other_rejections_are_not_retried() {
    let bridge = Arc::new(failing_then_ok(1, "insufficient funds"));
    let prompt = Arc::new(ScriptedPrompt::default());
    let submitter = GasRetrySubmitter::new(bridge.clone(), prompt.clone());

    let error = submitter
        .submit(SEND_CREATE_SCHEDULED_RUN, json!({}), 200)
        .await
        .expect_err("rejection");

    assert!(matches!(error, SchedulerError::RemoteRejected(ref m) if m == "insufficient funds"));
    assert_eq!(bridge.calls().len(), 1);
    assert_eq!(prompt.asked(), [(200, false)]);
    assert_eq!(prompt.failures(), ["insufficient funds"]);
}

#[tokio::test]
async fn declining_the_prompt_aborts_without_dispatch() {
    let bridge = Arc::new(failing_then_ok(0, ""));
    let prompt = Arc::new(ScriptedPrompt::answering([None]));
    let submitter = GasRetrySubmitter::new(bridge.clone(), prompt);

    let error = submitter
        .submit(SEND_CREATE_SCHEDULED_RUN, json!({}), 200)
        .await
        .expect_err("aborted");
    assert!(matches!(error, SchedulerError::UserAborted));
    assert_eq!(error.operator_message(), None);
    assert!(bridge.calls().is_empty());
}

#[tokio::test]
async fn declining_the_retry_prompt_aborts() {
    let bridge = Arc::new(failing_then_ok(5, OUT_OF_GAS));
    let prompt = Arc::new(ScriptedPrompt::answering([Some(300), None]));
    let submitter = GasRetrySubmitter::new(bridge.clone(), prompt.clone());

    let error = submitter
        .submit(SEND_CREATE_SCHEDULED_RUN, json!({}), 200)
        .await
        .expect_err("aborted on retry");
    assert!(matches!(error, SchedulerError::UserAborted));
    // The operator's adjusted fee is what gets doubled.
    assert_eq!(prompt.asked(), [(200, false), (600, true)]);
    assert_eq!(bridge.calls().len(), 1);
}

#[tokio::test]
async fn zero_initial_fee_falls_back_to_default() -> Result<()> {
    let bridge = Arc::new(failing_then_ok(0, ""));
    let prompt = Arc::new(ScriptedPrompt::default());
    let submitter = GasRetrySubmitter::new(bridge, prompt.clone());
    let result = submitter.submit(SEND_CREATE_SCHEDULED_RUN, json!({}), 0).await?;
    assert_eq!(result.fee, 200);
    assert_eq!(prompt.asked(), [(200, false)]);
    Ok(())
}

#[tokio::test]
async fn auto_confirm_stops_after_its_budget() {
    let prompt = AutoConfirmPrompt::new(2);
    assert_eq!(prompt.confirm_fee(200, false).await, Some(200));
    assert_eq!(prompt.confirm_fee(400, true).await, Some(400));
    assert_eq!(prompt.confirm_fee(800, true).await, None);
}

#[test]
fn suggested_gas_applies_margin() {
    assert_eq!(suggested_gas(1000.0), Some(1200));
    assert_eq!(suggested_gas(333.0), Some(400));
    assert_eq!(suggested_gas(0.0), None);
    assert_eq!(suggested_gas(f64::NAN), None);
}

#[tokio::test]
async fn estimate_reads_script_gas_consumed() -> Result<()> {
    let bridge = ScriptedBridge::new(|command, payload| {
        assert_eq!(command, QUERY_QUERY_SCRIPT);
        assert_eq!(payload["query"]["function_name"], "tick");
        Ok(json!({
            "response": "{\"result\": \"ok\", \"script_gas_consumed\": 1000}"
        }))
    });
    let estimate = estimate_gas(
        &bridge,
        json!({"address": "dys1script", "function_name": "tick"}),
    )
    .await?;
    assert_eq!(estimate.suggested_gas, Some(1200));
    assert_eq!(estimate.response["response"]["result"], "ok");
    Ok(())
}

#[tokio::test]
async fn estimate_without_consumption_suggests_nothing() -> Result<()> {
    let bridge = ScriptedBridge::new(|_, _| Ok(json!({"response": "not json"})));
    let estimate = estimate_gas(&bridge, json!({})).await?;
    assert_eq!(estimate.suggested_gas, None);
    assert_eq!(estimate.response["response"], "not json");
    Ok(())
}
