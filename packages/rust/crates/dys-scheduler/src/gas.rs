//! Fee confirmation, out-of-gas escalation and gas estimation.
//!
//! Submission loop (strictly sequential):
//! 1. Operator confirms a fee (declining aborts the whole submission).
//! 2. `gas = fee * 10000`; dispatch `{value, fee: [{amount, denom: "dys"}], gas}`.
//! 3. A failure ending in `"out of gas"` re-prompts with double the fee, flagged as a retry.
//! 4. Any other failure is reported and returned.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use dys_bridge::{QUERY_QUERY_SCRIPT, RemoteBridge};
use dys_types::{FEE_DENOM, decode_field_in_place};
use serde_json::{Value, json};

use crate::error::{SchedulerError, SchedulerResult};

/// Gas units granted per unit of fee.
pub const GAS_PER_FEE: u64 = 10_000;
/// Fee offered when the caller has no better suggestion.
pub const DEFAULT_FEE: u64 = 200;
/// Safety margin applied to `script_gas_consumed`.
pub const GAS_ESTIMATE_MARGIN: f64 = 1.2;

const OUT_OF_GAS_SUFFIX: &str = "out of gas";

/// Whether a rejection message signals gas exhaustion.
#[must_use]
pub fn is_out_of_gas(message: &str) -> bool {
    message.trim_end().ends_with(OUT_OF_GAS_SUFFIX)
}

/// Operator interaction during submission.
#[async_trait]
pub trait OperatorPrompt: Send + Sync {
    /// Ask the operator to confirm or adjust the fee. `None` declines.
    async fn confirm_fee(&self, suggested: u64, retrying: bool) -> Option<u64>;

    /// Show a failed attempt to the operator.
    fn report_failure(&self, message: &str) {
        let _ = message;
    }
}

/// Accepts every suggested fee, declining once `max_prompts` prompts were answered.
#[derive(Debug)]
pub struct AutoConfirmPrompt {
    max_prompts: u32,
    prompted: AtomicU32,
}

impl AutoConfirmPrompt {
    #[must_use]
    pub fn new(max_prompts: u32) -> Self {
        Self {
            max_prompts,
            prompted: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl OperatorPrompt for AutoConfirmPrompt {
    async fn confirm_fee(&self, suggested: u64, retrying: bool) -> Option<u64> {
        let prompted = self.prompted.fetch_add(1, Ordering::Relaxed);
        if prompted >= self.max_prompts {
            tracing::info!(
                event = "dys.submit.auto_confirm_exhausted",
                max_prompts = self.max_prompts,
                "auto-confirm prompt budget exhausted"
            );
            return None;
        }
        tracing::info!(
            event = "dys.submit.fee_confirmed",
            fee = suggested,
            retrying,
            "fee auto-confirmed"
        );
        Some(suggested)
    }

    fn report_failure(&self, message: &str) {
        tracing::warn!(
            event = "dys.submit.attempt_failed",
            error = %message,
            "submission attempt failed"
        );
    }
}

/// Signed submission outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct TxResult {
    /// Broadcast response, with `rawLog` decoded when it carried JSON.
    pub response: Value,
    /// Fee that was finally accepted.
    pub fee: u64,
    /// Gas limit sent with the accepted attempt.
    pub gas: u64,
    /// Number of dispatch attempts (1 when no escalation happened).
    pub attempts: u32,
}

/// Dispatch payload for one submission attempt.
#[must_use]
pub fn submission_payload(value: Value, fee: u64) -> Value {
    json!({
        "value": value,
        "fee": [{ "amount": fee.to_string(), "denom": FEE_DENOM }],
        "gas": fee.saturating_mul(GAS_PER_FEE).to_string(),
    })
}

/// Runs the confirm → dispatch → escalate loop.
pub struct GasRetrySubmitter {
    bridge: Arc<dyn RemoteBridge>,
    prompt: Arc<dyn OperatorPrompt>,
}

impl GasRetrySubmitter {
    pub fn new(bridge: Arc<dyn RemoteBridge>, prompt: Arc<dyn OperatorPrompt>) -> Self {
        Self { bridge, prompt }
    }

    /// Submit `payload` under `command`, escalating the fee on out-of-gas rejections.
    ///
    /// # Errors
    /// [`SchedulerError::UserAborted`] when a fee prompt is declined; the classified bridge
    /// error ([`SchedulerError::RemoteRejected`], [`SchedulerError::MissingWallet`], ...) for
    /// any failure other than gas exhaustion.
    pub async fn submit(
        &self,
        command: &str,
        payload: Value,
        initial_fee: u64,
    ) -> SchedulerResult<TxResult> {
        let mut suggested = if initial_fee == 0 {
            DEFAULT_FEE
        } else {
            initial_fee
        };
        let mut retrying = false;
        let mut attempts = 0_u32;
        loop {
            let Some(fee) = self
                .prompt
                .confirm_fee(suggested, retrying)
                .await
                .filter(|fee| *fee > 0)
            else {
                tracing::info!(
                    event = "dys.submit.aborted",
                    command,
                    attempts,
                    "fee prompt declined; submission aborted"
                );
                return Err(SchedulerError::UserAborted);
            };
            attempts += 1;
            let gas = fee.saturating_mul(GAS_PER_FEE);
            let body = submission_payload(payload.clone(), fee);
            match self.bridge.dispatch(command, body).await {
                Ok(mut response) => {
                    decode_field_in_place(&mut response, "rawLog");
                    tracing::info!(
                        event = "dys.submit.accepted",
                        command,
                        fee,
                        gas,
                        attempts,
                        "submission accepted"
                    );
                    return Ok(TxResult {
                        response,
                        fee,
                        gas,
                        attempts,
                    });
                }
                Err(error) => {
                    let message = error.to_string();
                    self.prompt.report_failure(&message);
                    if is_out_of_gas(&message) {
                        tracing::warn!(
                            event = "dys.submit.out_of_gas",
                            command,
                            fee,
                            next_fee = fee.saturating_mul(2),
                            "submission ran out of gas; retrying with doubled fee"
                        );
                        suggested = fee.saturating_mul(2);
                        retrying = true;
                        continue;
                    }
                    tracing::warn!(
                        event = "dys.submit.rejected",
                        command,
                        fee,
                        error = %message,
                        "submission rejected"
                    );
                    return Err(SchedulerError::from(error));
                }
            }
        }
    }
}

/// Result of a dry-run gas estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct GasEstimate {
    /// Dry-run response, `response` decoded when it carried JSON.
    pub response: Value,
    /// `round(script_gas_consumed * 1.2)`; `None` when consumption was missing or zero.
    pub suggested_gas: Option<u64>,
}

/// Suggested gas limit for a measured consumption.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn suggested_gas(consumed: f64) -> Option<u64> {
    let scaled = (consumed * GAS_ESTIMATE_MARGIN).round();
    if scaled.is_finite() && scaled >= 1.0 {
        Some(scaled as u64)
    } else {
        None
    }
}

/// Dry-run a script call (`QueryQueryScript`). Never submits a transaction.
///
/// # Errors
/// Returns the classified bridge error when the query fails.
pub async fn query_script(bridge: &dyn RemoteBridge, msg: Value) -> SchedulerResult<Value> {
    let mut response = bridge
        .dispatch(QUERY_QUERY_SCRIPT, json!({ "query": msg }))
        .await?;
    decode_field_in_place(&mut response, "response");
    Ok(response)
}

/// Dry-run the message and derive a gas suggestion from `script_gas_consumed`.
///
/// # Errors
/// Returns the classified bridge error when the query fails.
pub async fn estimate_gas(bridge: &dyn RemoteBridge, msg: Value) -> SchedulerResult<GasEstimate> {
    let response = query_script(bridge, msg).await?;
    let consumed = response
        .get("response")
        .and_then(|inner| inner.get("script_gas_consumed"))
        .and_then(|value| match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        });
    let suggested_gas = consumed.and_then(suggested_gas);
    tracing::debug!(
        event = "dys.gas.estimated",
        consumed = consumed.unwrap_or_default(),
        suggested = suggested_gas.unwrap_or_default(),
        "gas estimate computed"
    );
    Ok(GasEstimate {
        response,
        suggested_gas,
    })
}
