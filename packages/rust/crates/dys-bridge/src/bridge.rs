//! Remote bridge contract: `dispatch(command, payload)` plus `get(key)` lookups.
//!
//! Queries carry their arguments under `{"query": {...}}`; signed submissions carry
//! `{"value": ..., "fee": [...], "gas": "..."}`. Implementations decide how a command
//! reaches the chain (REST, signer service, in-memory fake).

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// List scheduled runs, paginated.
pub const QUERY_SCHEDULED_RUN_ALL: &str = "dyson/QueryScheduledRunAll";
/// Sign and broadcast a new scheduled run.
pub const SEND_CREATE_SCHEDULED_RUN: &str = "dyson/sendMsgCreateScheduledRun";
/// Dry-run a script call without submitting a transaction.
pub const QUERY_QUERY_SCRIPT: &str = "dyson/QueryQueryScript";
/// Fetch the declared function schemas of a script.
pub const QUERY_SCHEMA: &str = "dyson/QuerySchema";
/// Latest block header.
pub const SERVICE_GET_LATEST_BLOCK: &str = "cosmos.base.tendermint.v1beta1/ServiceGetLatestBlock";

/// Store getter holding the chain REST endpoint; absent or empty means queries are disabled.
pub const API_ENDPOINT_KEY: &str = "common/env/apiCosmos";

/// Failure reported by a bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Network-level failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote answered with a failure. Display is the remote message verbatim.
    #[error("{message}")]
    Status {
        /// HTTP status code, when the failure came over HTTP.
        status: Option<u16>,
        /// Remote-provided message.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Command not known to this bridge.
    #[error("unsupported command: {0}")]
    Unsupported(String),

    /// No wallet/signer is available for a wallet-dependent action.
    #[error("wallet not available")]
    MissingWallet,
}

impl BridgeError {
    /// Build a remote rejection without an HTTP status.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Status {
            status: None,
            message: message.into(),
        }
    }
}

/// Command dispatcher and store lookup backed by a remote chain client.
#[async_trait]
pub trait RemoteBridge: Send + Sync {
    /// Send `command` with `payload` and return the decoded response body.
    ///
    /// # Errors
    /// Returns [`BridgeError`] when the command is unknown, the transport fails, or the
    /// remote rejects the request.
    async fn dispatch(&self, command: &str, payload: Value) -> Result<Value, BridgeError>;

    /// Configuration/store lookup; `None` when the key is unset.
    fn get(&self, key: &str) -> Option<Value>;

    /// Whether the chain query endpoint is configured.
    fn api_available(&self) -> bool {
        match self.get(API_ENDPOINT_KEY) {
            Some(Value::String(url)) => !url.trim().is_empty(),
            Some(Value::Null) | None => false,
            Some(Value::Bool(flag)) => flag,
            Some(_) => true,
        }
    }
}
