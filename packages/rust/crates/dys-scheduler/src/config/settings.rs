//! Runtime settings loader for dys-scheduler.
//!
//! Loads and merges:
//! - System defaults: `<PRJ_ROOT>/packages/conf/dys-scheduler.yaml`
//! - User overrides:  `<PRJ_CONFIG_HOME>/dys-scheduler/settings.yaml`
//!
//! Merge precedence is user over system.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use dys_bridge::HttpBridgeConfig;
use serde::Deserialize;

use crate::block::DEFAULT_BLOCK_POLL_INTERVAL;
use crate::debounce::DEFAULT_DEBOUNCE;
use crate::gas::DEFAULT_FEE;
use crate::pagination::ReverseConvention;

const DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH: &str = "packages/conf/dys-scheduler.yaml";
const DEFAULT_USER_SETTINGS_RELATIVE_PATH: &str = "dys-scheduler/settings.yaml";
const DEFAULT_CONFIG_HOME_RELATIVE_PATH: &str = ".config";
const DEFAULT_API_URL: &str = "http://127.0.0.1:1317";
static CONFIG_HOME_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

/// Merged `dys-scheduler` settings; every value is optional and resolved by the accessors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeSettings {
    /// Chain and signer endpoints.
    #[serde(default)]
    pub bridge: BridgeSettings,
    /// Listing request options.
    #[serde(default)]
    pub pagination: PaginationSettings,
    /// Head polling.
    #[serde(default)]
    pub block: BlockSettings,
    /// Prefix input handling.
    #[serde(default)]
    pub filter: FilterSettings,
    /// Transaction submission.
    #[serde(default)]
    pub submit: SubmitSettings,
}

/// `bridge:` chain API and signer endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeSettings {
    /// Chain REST API base URL.
    pub api_url: Option<String>,
    /// Signer service base URL; unset disables submission.
    pub signer_url: Option<String>,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: Option<u64>,
    /// How often the signer account is re-read.
    pub account_poll_secs: Option<u64>,
}

/// `pagination:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationSettings {
    /// `direct` or `negated`.
    pub reverse_convention: Option<String>,
}

/// `block:` head polling.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockSettings {
    /// Latest-block poll interval.
    pub poll_interval_secs: Option<u64>,
}

/// `filter:` prefix input debounce.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterSettings {
    /// Quiet period before typed prefix text is applied.
    pub debounce_ms: Option<u64>,
}

/// `submit:` fee defaults and non-interactive confirmation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitSettings {
    /// Fee proposed on the first attempt; `0` means the built-in default.
    pub default_fee: Option<u64>,
    /// Fee prompts accepted by `--yes` before giving up.
    pub auto_confirm_max_prompts: Option<u32>,
}

impl RuntimeSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            bridge: self.bridge.merge(overlay.bridge),
            pagination: PaginationSettings {
                reverse_convention: overlay
                    .pagination
                    .reverse_convention
                    .or(self.pagination.reverse_convention),
            },
            block: BlockSettings {
                poll_interval_secs: overlay
                    .block
                    .poll_interval_secs
                    .or(self.block.poll_interval_secs),
            },
            filter: FilterSettings {
                debounce_ms: overlay.filter.debounce_ms.or(self.filter.debounce_ms),
            },
            submit: SubmitSettings {
                default_fee: overlay.submit.default_fee.or(self.submit.default_fee),
                auto_confirm_max_prompts: overlay
                    .submit
                    .auto_confirm_max_prompts
                    .or(self.submit.auto_confirm_max_prompts),
            },
        }
    }

    /// Bridge endpoints, falling back to a local chain REST endpoint.
    #[must_use]
    pub fn bridge_config(&self) -> HttpBridgeConfig {
        let api_url = self
            .bridge
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL);
        let mut config = HttpBridgeConfig::new(api_url);
        if let Some(signer_url) = self
            .bridge
            .signer_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
        {
            config = config.with_signer(signer_url);
        }
        if let Some(timeout) = self.bridge.request_timeout_secs {
            config.request_timeout_secs = timeout.max(1);
        }
        if let Some(poll) = self.bridge.account_poll_secs {
            config.account_poll_secs = poll.max(1);
        }
        config
    }

    /// How the reversed toggle maps onto `pagination.reverse`; unknown values fall back to
    /// [`ReverseConvention::Direct`] with a warning.
    #[must_use]
    pub fn reverse_convention(&self) -> ReverseConvention {
        let Some(raw) = self.pagination.reverse_convention.as_deref() else {
            return ReverseConvention::default();
        };
        ReverseConvention::parse(raw).unwrap_or_else(|| {
            tracing::warn!(
                value = raw,
                "unknown pagination.reverse_convention; using direct"
            );
            ReverseConvention::default()
        })
    }

    #[must_use]
    pub fn block_poll_interval(&self) -> Duration {
        self.block
            .poll_interval_secs
            .map_or(DEFAULT_BLOCK_POLL_INTERVAL, |secs| {
                Duration::from_secs(secs.max(1))
            })
    }

    #[must_use]
    pub fn debounce_window(&self) -> Duration {
        self.filter
            .debounce_ms
            .map_or(DEFAULT_DEBOUNCE, Duration::from_millis)
    }

    #[must_use]
    pub fn default_fee(&self) -> u64 {
        self.submit
            .default_fee
            .filter(|fee| *fee > 0)
            .unwrap_or(DEFAULT_FEE)
    }

    #[must_use]
    pub fn auto_confirm_max_prompts(&self) -> u32 {
        self.submit.auto_confirm_max_prompts.unwrap_or(4).max(1)
    }
}

impl BridgeSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            api_url: overlay.api_url.or(self.api_url),
            signer_url: overlay.signer_url.or(self.signer_url),
            request_timeout_secs: overlay.request_timeout_secs.or(self.request_timeout_secs),
            account_poll_secs: overlay.account_poll_secs.or(self.account_poll_secs),
        }
    }
}

/// Load merged runtime settings (user overrides system).
pub fn load_runtime_settings() -> RuntimeSettings {
    let (system_path, user_path) = runtime_settings_paths();
    load_runtime_settings_from_paths(&system_path, &user_path)
}

#[doc(hidden)]
pub fn runtime_settings_paths() -> (PathBuf, PathBuf) {
    let root = project_root();
    let system_path = root.join(DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH);
    let user_path = resolve_config_home(&root).join(DEFAULT_USER_SETTINGS_RELATIVE_PATH);
    (system_path, user_path)
}

#[doc(hidden)]
pub fn load_runtime_settings_from_paths(system: &Path, user: &Path) -> RuntimeSettings {
    load_one(system).merge(load_one(user))
}

fn load_one(path: &Path) -> RuntimeSettings {
    if !path.exists() {
        return RuntimeSettings::default();
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to read settings file; ignoring"
            );
            return RuntimeSettings::default();
        }
    };
    match serde_yaml::from_str::<RuntimeSettings>(&raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to parse settings yaml; ignoring file"
            );
            RuntimeSettings::default()
        }
    }
}

fn project_root() -> PathBuf {
    std::env::var("PRJ_ROOT")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Set config-home override (used by CLI `--conf`).
///
/// The path can be absolute, or relative to `PRJ_ROOT`/cwd.
pub fn set_config_home_override(path: impl Into<PathBuf>) {
    let path = path.into();
    if path.as_os_str().is_empty() {
        return;
    }
    if CONFIG_HOME_OVERRIDE.set(path.clone()).is_err()
        && let Some(current) = CONFIG_HOME_OVERRIDE.get()
        && current != &path
    {
        tracing::warn!(
            current = %current.display(),
            ignored = %path.display(),
            "config home override already set; ignoring subsequent value"
        );
    }
}

fn resolve_config_home(project_root: &Path) -> PathBuf {
    if let Some(path) = CONFIG_HOME_OVERRIDE.get() {
        return absolutize(project_root, path.clone());
    }

    let configured = std::env::var("PRJ_CONFIG_HOME")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_HOME_RELATIVE_PATH.to_string());
    absolutize(project_root, PathBuf::from(configured))
}

fn absolutize(project_root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}
