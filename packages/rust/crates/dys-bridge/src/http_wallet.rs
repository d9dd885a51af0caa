//! Wallet bridge over the signer service: `GET {signer_url}/account`.
//!
//! Account changes are detected by polling; the watcher task lives inside the returned
//! [`Subscription`].

use std::time::Duration;

use async_trait::async_trait;
use dys_types::AccountInfo;
use reqwest::Client;

use crate::bridge::BridgeError;
use crate::config::HttpBridgeConfig;
use crate::wallet::{AccountCallback, Subscription, WalletBridge};

/// Signer-service backed [`WalletBridge`].
pub struct HttpWallet {
    client: Client,
    signer_url: Option<String>,
    poll_interval: Duration,
}

impl HttpWallet {
    /// Build a wallet bridge from config. Without `signer_url` every connect fails with
    /// [`BridgeError::MissingWallet`].
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &HttpBridgeConfig) -> Result<Self, BridgeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| BridgeError::Transport(format!("reqwest client: {e}")))?;
        Ok(Self {
            client,
            signer_url: config
                .signer_url
                .as_deref()
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            poll_interval: Duration::from_secs(config.account_poll_secs.max(1)),
        })
    }
}

async fn fetch_account(client: &Client, signer_url: &str) -> Result<AccountInfo, BridgeError> {
    let response = client
        .get(format!("{signer_url}/account"))
        .send()
        .await
        .map_err(|e| BridgeError::Transport(format!("wallet account: {e}")))?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND
        || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
    {
        return Err(BridgeError::MissingWallet);
    }
    if !status.is_success() {
        return Err(BridgeError::Status {
            status: Some(status.as_u16()),
            message: format!("wallet account: HTTP {status}"),
        });
    }
    response
        .json::<AccountInfo>()
        .await
        .map_err(|e| BridgeError::Decode(format!("wallet account: {e}")))
}

#[async_trait]
impl WalletBridge for HttpWallet {
    async fn connect(
        &self,
        on_account_change: AccountCallback,
    ) -> Result<(AccountInfo, Subscription), BridgeError> {
        let Some(signer_url) = self.signer_url.clone() else {
            return Err(BridgeError::MissingWallet);
        };
        let account = fetch_account(&self.client, &signer_url).await?;
        tracing::info!(
            event = "dys.wallet.connected",
            address = %account.bech32_address,
            "wallet connected"
        );

        let client = self.client.clone();
        let poll_interval = self.poll_interval;
        let mut current = account.bech32_address.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match fetch_account(&client, &signer_url).await {
                    Ok(next) if next.bech32_address != current => {
                        tracing::info!(
                            event = "dys.wallet.account_changed",
                            previous = %current,
                            address = %next.bech32_address,
                            "wallet account changed"
                        );
                        current = next.bech32_address.clone();
                        on_account_change(next);
                    }
                    Ok(_) => {}
                    Err(error) => {
                        tracing::debug!(
                            event = "dys.wallet.poll_failed",
                            error = %error,
                            "wallet account poll failed"
                        );
                    }
                }
            }
        });
        Ok((account, Subscription::from_task(task)))
    }
}
