//! Bridge layer for the Dyson scheduled-run client.
//!
//! The workflow code only sees two seams: [`RemoteBridge`] (`dispatch` + `get`) for chain
//! queries and signed submissions, and [`WalletBridge`] for the connected account. The HTTP
//! implementations talk to a chain REST endpoint and a signer service that owns the keys.

mod bridge;
mod config;
mod http;
mod http_wallet;
mod wallet;

pub use bridge::{
    API_ENDPOINT_KEY, BridgeError, QUERY_QUERY_SCRIPT, QUERY_SCHEDULED_RUN_ALL, QUERY_SCHEMA,
    RemoteBridge, SEND_CREATE_SCHEDULED_RUN, SERVICE_GET_LATEST_BLOCK,
};
pub use config::HttpBridgeConfig;
pub use http::HttpBridge;
pub use http_wallet::HttpWallet;
pub use wallet::{AccountCallback, Subscription, WalletBridge};
