//! Wallet bridge: account discovery with an explicit change subscription.

use std::sync::Arc;

use async_trait::async_trait;
use dys_types::AccountInfo;
use tokio::task::JoinHandle;

use crate::bridge::BridgeError;

/// Callback invoked when the wallet switches accounts.
pub type AccountCallback = Arc<dyn Fn(AccountInfo) + Send + Sync>;

/// Handle for an account-change subscription. Dropping it cancels delivery.
#[derive(Debug, Default)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Subscription backed by a watcher task; the task is aborted on cancel/drop.
    #[must_use]
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Subscription that never delivers (wallets without change notifications).
    #[must_use]
    pub fn inert() -> Self {
        Self { task: None }
    }

    /// Stop delivering account changes.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether the subscription can still deliver changes.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Wallet extension contract. `connect` may be called again to force a reconnect.
#[async_trait]
pub trait WalletBridge: Send + Sync {
    /// Connect and return the active account plus a change subscription.
    ///
    /// # Errors
    /// Returns [`BridgeError::MissingWallet`] when no wallet is reachable.
    async fn connect(
        &self,
        on_account_change: AccountCallback,
    ) -> Result<(AccountInfo, Subscription), BridgeError>;
}
