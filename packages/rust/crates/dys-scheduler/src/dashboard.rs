//! Operator session: connected account, run listing, freshness tracking and run creation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dys_bridge::{
    AccountCallback, RemoteBridge, SEND_CREATE_SCHEDULED_RUN, Subscription, WalletBridge,
};
use dys_types::{AccountInfo, ScheduledRun};
use serde_json::Value;
use tokio::sync::watch;

use crate::draft::RunDraft;
use crate::error::SchedulerResult;
use crate::freshness::{FreshnessReconciler, Reconcile};
use crate::gas::{self, DEFAULT_FEE, GasEstimate, GasRetrySubmitter, OperatorPrompt, TxResult};
use crate::pagination::{PageFilter, ReverseConvention, ScheduledRunPager};
use crate::schema::SchemaResolver;
use crate::view_state::ViewState;

/// Session knobs, usually derived from [`crate::RuntimeSettings`].
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// Mapping of the reversed toggle onto the request flag.
    pub convention: ReverseConvention,
    /// Fee proposed before the first submission attempt.
    pub default_fee: u64,
    /// Restored listing state; an empty prefix falls back to the account address.
    pub view: ViewState,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            convention: ReverseConvention::default(),
            default_fee: DEFAULT_FEE,
            view: ViewState::default(),
        }
    }
}

/// One operator session against a chain and a wallet.
pub struct Dashboard {
    bridge: Arc<dyn RemoteBridge>,
    account: AccountInfo,
    account_rx: watch::Receiver<AccountInfo>,
    subscription: Subscription,
    pager: ScheduledRunPager,
    reconcilers: HashMap<String, FreshnessReconciler>,
    submitter: GasRetrySubmitter,
    schemas: SchemaResolver,
    default_fee: u64,
}

impl Dashboard {
    /// Connect the wallet and open a listing scoped to the account (or the restored prefix).
    ///
    /// # Errors
    /// [`crate::SchedulerError::MissingWallet`] when no wallet is reachable; other wallet
    /// failures are classified as usual.
    pub async fn connect(
        bridge: Arc<dyn RemoteBridge>,
        wallet: &dyn WalletBridge,
        prompt: Arc<dyn OperatorPrompt>,
        options: DashboardOptions,
    ) -> SchedulerResult<Self> {
        let (account, account_rx, subscription) = connect_wallet(wallet).await?;
        let prefix = if options.view.prefix.is_empty() {
            account.bech32_address.clone()
        } else {
            options.view.prefix.clone()
        };
        tracing::info!(
            event = "dys.dashboard.connected",
            account = %account.bech32_address,
            prefix = %prefix,
            reversed = options.view.reversed,
            "dashboard session connected"
        );
        let pager = ScheduledRunPager::new(
            Arc::clone(&bridge),
            options.convention,
            PageFilter::new(prefix, options.view.reversed),
        );
        Ok(Self {
            submitter: GasRetrySubmitter::new(Arc::clone(&bridge), prompt),
            schemas: SchemaResolver::new(Arc::clone(&bridge)),
            bridge,
            account,
            account_rx,
            subscription,
            pager,
            reconcilers: HashMap::new(),
            default_fee: options.default_fee,
        })
    }

    /// Account the session currently acts for.
    #[must_use]
    pub fn account(&self) -> &AccountInfo {
        &self.account
    }

    /// Pick up an account switch published by the wallet. A switch re-scopes the listing
    /// when it was still filtered by the previous address.
    pub fn sync_account(&mut self) -> bool {
        if !self.account_rx.has_changed().unwrap_or(false) {
            return false;
        }
        let next = self.account_rx.borrow_and_update().clone();
        self.apply_account(next)
    }

    /// Call the wallet again, replacing the account subscription. The returned account goes
    /// through the same re-scoping as [`Self::sync_account`]; returns whether it changed.
    ///
    /// # Errors
    /// Same as [`Self::connect`]. On failure the previous subscription stays in place.
    pub async fn reconnect(&mut self, wallet: &dyn WalletBridge) -> SchedulerResult<bool> {
        let (account, account_rx, subscription) = connect_wallet(wallet).await?;
        self.account_rx = account_rx;
        self.subscription = subscription;
        tracing::info!(
            event = "dys.dashboard.reconnected",
            account = %account.bech32_address,
            "wallet reconnected"
        );
        Ok(self.apply_account(account))
    }

    fn apply_account(&mut self, next: AccountInfo) -> bool {
        if next.bech32_address.is_empty() || next == self.account {
            return false;
        }
        tracing::info!(
            event = "dys.dashboard.account_changed",
            previous = %self.account.bech32_address,
            current = %next.bech32_address,
            "wallet account changed"
        );
        let previous = std::mem::replace(&mut self.account, next);
        if self.pager.filter().prefix == previous.bech32_address {
            self.pager.set_prefix(self.account.bech32_address.clone());
            self.reconcilers.clear();
        }
        true
    }

    /// Whether the wallet subscription is still delivering account changes.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    /// Runs loaded so far, in listing order.
    #[must_use]
    pub fn runs(&self) -> &[ScheduledRun] {
        self.pager.runs()
    }

    /// Whether another page can be requested.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.pager.has_more()
    }

    /// Active listing filter.
    #[must_use]
    pub fn filter(&self) -> &PageFilter {
        self.pager.filter()
    }

    /// Current listing state in query-string form.
    #[must_use]
    pub fn view_state(&self) -> ViewState {
        ViewState::from(self.pager.filter())
    }

    /// # Errors
    /// See [`ScheduledRunPager::load_more`].
    pub async fn load_more(&mut self) -> SchedulerResult<bool> {
        self.pager.load_more().await
    }

    /// Replace the filter; returns whether it changed.
    pub fn set_filter(&mut self, filter: PageFilter) -> bool {
        let changed = self.pager.set_filter(filter);
        if changed {
            self.reconcilers.clear();
        }
        changed
    }

    /// Change the prefix, keeping the ordering; returns whether the filter changed.
    pub fn set_prefix(&mut self, prefix: impl Into<String>) -> bool {
        let filter = PageFilter::new(prefix, self.pager.filter().reversed);
        self.set_filter(filter)
    }

    /// Flip the ordering and restart the listing.
    pub fn toggle_reversed(&mut self) {
        let filter = PageFilter::new(
            self.pager.filter().prefix.clone(),
            !self.pager.filter().reversed,
        );
        self.set_filter(filter);
    }

    /// # Errors
    /// See [`ScheduledRunPager::refresh`].
    pub async fn refresh(&mut self) -> SchedulerResult<()> {
        self.pager.refresh().await?;
        self.prune_reconcilers();
        Ok(())
    }

    /// Feed a new chain height to every displayed run. Refreshes the listing once when any
    /// run crossed its target. Returns whether a refresh happened.
    ///
    /// # Errors
    /// See [`ScheduledRunPager::refresh`].
    pub async fn on_block(&mut self, current_height: i64) -> SchedulerResult<bool> {
        let mut invalidated = 0_usize;
        for run in self.pager.runs() {
            let Some(target) = run.target_height() else {
                continue;
            };
            let reconciler = self.reconcilers.entry(run.index.clone()).or_default();
            if reconciler.observe(target, current_height) == Reconcile::Invalidate {
                invalidated += 1;
            }
        }
        if invalidated == 0 {
            return Ok(false);
        }
        tracing::info!(
            event = "dys.dashboard.runs_matured",
            height = current_height,
            invalidated,
            "scheduled runs reached their target height; refreshing listing"
        );
        self.refresh().await?;
        Ok(true)
    }

    /// Number of runs with freshness state; only runs still listed are tracked.
    #[must_use]
    pub fn tracked_runs(&self) -> usize {
        self.reconcilers.len()
    }

    fn prune_reconcilers(&mut self) {
        let listed: HashSet<&str> = self
            .pager
            .runs()
            .iter()
            .map(|run| run.index.as_str())
            .collect();
        self.reconcilers.retain(|index, _| listed.contains(index.as_str()));
    }

    /// Form prefilled for the connected account at `current_height`.
    #[must_use]
    pub fn draft(&self, current_height: Option<&str>) -> RunDraft {
        RunDraft::initial(&self.account.bech32_address, current_height)
    }

    /// Submit a new scheduled run, then refresh the listing.
    ///
    /// # Errors
    /// See [`GasRetrySubmitter::submit`]. A failed refresh after an accepted submission is
    /// logged, not returned.
    pub async fn create_run(&mut self, draft: &RunDraft) -> SchedulerResult<TxResult> {
        let result = self
            .submitter
            .submit(
                SEND_CREATE_SCHEDULED_RUN,
                draft.create_value(),
                self.default_fee,
            )
            .await?;
        if let Err(error) = self.refresh().await {
            tracing::warn!(
                event = "dys.dashboard.refresh_failed",
                error = %error,
                "listing refresh after submission failed"
            );
        }
        Ok(result)
    }

    /// Dry-run the draft's call and write the suggested gas into it.
    ///
    /// # Errors
    /// See [`gas::estimate_gas`].
    pub async fn estimate_gas(&self, draft: &mut RunDraft) -> SchedulerResult<GasEstimate> {
        let estimate = gas::estimate_gas(self.bridge.as_ref(), draft.msg_value()).await?;
        if let Some(suggested) = estimate.suggested_gas {
            draft.apply_gas_estimate(suggested);
        }
        Ok(estimate)
    }

    /// # Errors
    /// See [`gas::query_script`].
    pub async fn query(&self, draft: &RunDraft) -> SchedulerResult<Value> {
        gas::query_script(self.bridge.as_ref(), draft.msg_value()).await
    }

    /// # Errors
    /// See [`SchemaResolver::list_functions`].
    pub async fn functions(&self, address: &str) -> SchedulerResult<Vec<String>> {
        self.schemas.list_functions(address).await
    }

    /// # Errors
    /// See [`SchemaResolver::get_schema`].
    pub async fn schema(&self, address: &str, function_name: &str) -> SchedulerResult<Value> {
        self.schemas.get_schema(address, function_name).await
    }
}

async fn connect_wallet(
    wallet: &dyn WalletBridge,
) -> SchedulerResult<(AccountInfo, watch::Receiver<AccountInfo>, Subscription)> {
    let (account_tx, account_rx) = watch::channel(AccountInfo::default());
    let on_change: AccountCallback = Arc::new(move |account: AccountInfo| {
        account_tx.send_replace(account);
    });
    let (account, subscription) = wallet.connect(on_change).await?;
    Ok((account, account_rx, subscription))
}
