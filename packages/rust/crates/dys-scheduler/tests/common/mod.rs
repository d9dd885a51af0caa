//! Scripted bridge, wallet and prompt doubles shared by workflow tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dys_bridge::{
    API_ENDPOINT_KEY, AccountCallback, BridgeError, QUERY_SCHEDULED_RUN_ALL, RemoteBridge,
    SERVICE_GET_LATEST_BLOCK, Subscription, WalletBridge,
};
use dys_scheduler::OperatorPrompt;
use dys_types::AccountInfo;
use serde_json::{Value, json};

type Handler = Box<dyn Fn(&str, &Value) -> Result<Value, BridgeError> + Send + Sync>;

/// In-memory [`RemoteBridge`] answering from a closure and recording every dispatch.
pub struct ScriptedBridge {
    handler: Handler,
    calls: Mutex<Vec<(String, Value)>>,
    api_configured: bool,
}

impl ScriptedBridge {
    pub fn new(
        handler: impl Fn(&str, &Value) -> Result<Value, BridgeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            api_configured: true,
        }
    }

    pub fn without_api(mut self) -> Self {
        self.api_configured = false;
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn payloads_for(&self, command: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| name == command)
            .map(|(_, payload)| payload)
            .collect()
    }
}

#[async_trait]
impl RemoteBridge for ScriptedBridge {
    async fn dispatch(&self, command: &str, payload: Value) -> Result<Value, BridgeError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((command.to_string(), payload.clone()));
        }
        (self.handler)(command, &payload)
    }

    fn get(&self, key: &str) -> Option<Value> {
        (self.api_configured && key == API_ENDPOINT_KEY).then(|| json!("http://mock-chain"))
    }
}

/// Minimal scheduled run record as the chain returns it.
pub fn run(index: &str, height: i64) -> Value {
    json!({
        "index": index,
        "creator": "dys1alice",
        "height": height.to_string(),
        "gas": "20000",
        "msg": {
            "creator": "dys1alice",
            "address": "dys1script",
            "function_name": "tick",
            "args": "[]",
            "kwargs": "{}",
            "coins": ""
        }
    })
}

/// Pages keyed by request cursor (`""` for the first page).
#[derive(Clone, Default)]
pub struct Listing {
    pages: Arc<Mutex<HashMap<String, (Vec<Value>, Option<String>)>>>,
}

impl Listing {
    pub fn page(self, cursor: &str, runs: Vec<Value>, next_key: Option<&str>) -> Self {
        if let Ok(mut pages) = self.pages.lock() {
            pages.insert(cursor.to_string(), (runs, next_key.map(str::to_string)));
        }
        self
    }

    /// Replace the listing contents (e.g. after runs executed).
    pub fn replace_page(&self, cursor: &str, runs: Vec<Value>, next_key: Option<&str>) {
        if let Ok(mut pages) = self.pages.lock() {
            pages.insert(cursor.to_string(), (runs, next_key.map(str::to_string)));
        }
    }

    pub fn answer(&self, payload: &Value) -> Result<Value, BridgeError> {
        let cursor = payload["query"]["pagination.key"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let pages = self
            .pages
            .lock()
            .map_err(|_| BridgeError::Transport("listing lock poisoned".to_string()))?;
        let (runs, next_key) = pages.get(&cursor).cloned().unwrap_or_default();
        Ok(json!({
            "scheduled_run": runs,
            "pagination": {"next_key": next_key, "total": "0"}
        }))
    }
}

/// Bridge serving a listing plus a fixed chain head; other commands are unsupported.
pub fn listing_bridge(listing: Listing, head: i64) -> ScriptedBridge {
    ScriptedBridge::new(move |command, payload| match command {
        QUERY_SCHEDULED_RUN_ALL => listing.answer(payload),
        SERVICE_GET_LATEST_BLOCK => Ok(json!({
            "block": {"header": {"chain_id": "dyson-test", "height": head.to_string(), "time": ""}}
        })),
        other => Err(BridgeError::Unsupported(other.to_string())),
    })
}

/// Prompt answering from a script and recording `(suggested, retrying)` per call.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Option<u64>>>,
    asked: Mutex<Vec<(u64, bool)>>,
    failures: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answers: impl IntoIterator<Item = Option<u64>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn asked(&self) -> Vec<(u64, bool)> {
        self.asked.lock().map(|asked| asked.clone()).unwrap_or_default()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures
            .lock()
            .map(|failures| failures.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OperatorPrompt for ScriptedPrompt {
    async fn confirm_fee(&self, suggested: u64, retrying: bool) -> Option<u64> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push((suggested, retrying));
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .unwrap_or(Some(suggested))
    }

    fn report_failure(&self, message: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(message.to_string());
        }
    }
}

/// Wallet holding a switchable account and keeping the latest change callback so the test
/// can fire it. Each connect hands out a live subscription.
pub struct ManualWallet {
    account: Mutex<Option<AccountInfo>>,
    callback: Mutex<Option<AccountCallback>>,
    connections: Mutex<usize>,
}

fn operator(address: &str) -> AccountInfo {
    AccountInfo {
        name: "operator".to_string(),
        bech32_address: address.to_string(),
    }
}

impl ManualWallet {
    pub fn with_account(address: &str) -> Self {
        Self {
            account: Mutex::new(Some(operator(address))),
            callback: Mutex::new(None),
            connections: Mutex::new(0),
        }
    }

    pub fn missing() -> Self {
        Self {
            account: Mutex::new(None),
            callback: Mutex::new(None),
            connections: Mutex::new(0),
        }
    }

    /// Change the account and notify the current subscriber.
    pub fn switch_to(&self, address: &str) {
        self.replace_account(address);
        let callback = self.callback.lock().ok().and_then(|slot| slot.clone());
        if let Some(callback) = callback {
            callback(operator(address));
        }
    }

    /// Change the account without notifying anyone.
    pub fn replace_account(&self, address: &str) {
        if let Ok(mut account) = self.account.lock() {
            *account = Some(operator(address));
        }
    }

    /// Make further connects fail as if the wallet went away.
    pub fn disconnect(&self) {
        if let Ok(mut account) = self.account.lock() {
            *account = None;
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.lock().map(|count| *count).unwrap_or_default()
    }
}

#[async_trait]
impl WalletBridge for ManualWallet {
    async fn connect(
        &self,
        on_account_change: AccountCallback,
    ) -> Result<(AccountInfo, Subscription), BridgeError> {
        let account = self
            .account
            .lock()
            .ok()
            .and_then(|account| account.clone())
            .ok_or(BridgeError::MissingWallet)?;
        if let Ok(mut slot) = self.callback.lock() {
            *slot = Some(on_account_change);
        }
        if let Ok(mut count) = self.connections.lock() {
            *count += 1;
        }
        let watcher = tokio::spawn(std::future::pending::<()>());
        Ok((account, Subscription::from_task(watcher)))
    }
}
