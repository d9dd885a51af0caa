use std::sync::Arc;

use anyhow::Context;
use dys_bridge::{HttpBridge, HttpWallet, RemoteBridge};
use dys_scheduler::{DashboardOptions, RuntimeSettings, ViewState};

/// Chain bridge plus wallet, built from settings and CLI overrides.
pub(crate) struct Endpoints {
    pub(crate) bridge: Arc<dyn RemoteBridge>,
    pub(crate) wallet: HttpWallet,
}

pub(crate) fn build_endpoints(
    runtime_settings: &RuntimeSettings,
    api_url: Option<&str>,
    signer_url: Option<&str>,
) -> anyhow::Result<Endpoints> {
    let mut config = runtime_settings.bridge_config();
    if let Some(api_url) = api_url.map(str::trim).filter(|url| !url.is_empty()) {
        config.api_url = api_url.to_string();
    }
    if let Some(signer_url) = signer_url.map(str::trim).filter(|url| !url.is_empty()) {
        config.signer_url = Some(signer_url.to_string());
    }
    tracing::debug!(
        event = "dys.cli.endpoints",
        api_url = %config.api_url,
        signer_url = config.signer_url.as_deref().unwrap_or("-"),
        "bridge endpoints resolved"
    );
    let bridge = HttpBridge::from_config(&config).context("failed to build chain bridge")?;
    let wallet = HttpWallet::from_config(&config).context("failed to build wallet bridge")?;
    Ok(Endpoints {
        bridge: Arc::new(bridge),
        wallet,
    })
}

pub(crate) fn dashboard_options(
    runtime_settings: &RuntimeSettings,
    view: ViewState,
) -> DashboardOptions {
    DashboardOptions {
        convention: runtime_settings.reverse_convention(),
        default_fee: runtime_settings.default_fee(),
        view,
    }
}
