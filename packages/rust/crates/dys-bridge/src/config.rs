//! HTTP bridge config: chain REST endpoint plus optional signer service.

use serde::{Deserialize, Serialize};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ACCOUNT_POLL_SECS: u64 = 5;

/// Endpoints and timeouts for [`crate::HttpBridge`] and [`crate::HttpWallet`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpBridgeConfig {
    /// Chain REST endpoint (e.g. `http://127.0.0.1:1317`).
    pub api_url: String,
    /// Signer service that owns keys and broadcasts transactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_url: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Interval between account checks on the signer service.
    #[serde(default = "default_account_poll_secs")]
    pub account_poll_secs: u64,
}

impl HttpBridgeConfig {
    /// Config with only the chain REST endpoint; submissions are unavailable.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            signer_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            account_poll_secs: DEFAULT_ACCOUNT_POLL_SECS,
        }
    }

    /// Attach a signer service.
    #[must_use]
    pub fn with_signer(mut self, signer_url: impl Into<String>) -> Self {
        self.signer_url = Some(signer_url.into());
        self
    }
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_account_poll_secs() -> u64 {
    DEFAULT_ACCOUNT_POLL_SECS
}
