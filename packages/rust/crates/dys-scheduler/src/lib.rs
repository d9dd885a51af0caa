//! Operator workflows for Dyson scheduled runs.
//!
//! - [`ScheduledRunPager`]: cursor pagination with filter epochs and dedupe.
//! - [`GasRetrySubmitter`]: fee confirmation with out-of-gas escalation.
//! - [`SchemaResolver`]: callable functions and kwargs schemas of a script.
//! - [`FreshnessReconciler`]: listing invalidation once pending runs mature.
//! - [`BlockPoller`] / [`FilterDebouncer`]: background tasks feeding a [`Dashboard`] session.
//!
//! All chain access goes through [`dys_bridge::RemoteBridge`].

mod block;
mod config;
mod dashboard;
mod debounce;
mod draft;
mod error;
mod freshness;
mod gas;
mod pagination;
mod schema;
mod view_state;

pub use block::{BlockPoller, DEFAULT_BLOCK_POLL_INTERVAL, block_diff, latest_block};
pub use config::{
    BlockSettings, BridgeSettings, FilterSettings, PaginationSettings, RuntimeSettings,
    SubmitSettings, load_runtime_settings, load_runtime_settings_from_paths,
    runtime_settings_paths, set_config_home_override,
};
pub use dashboard::{Dashboard, DashboardOptions};
pub use debounce::{DEFAULT_DEBOUNCE, FilterDebouncer};
pub use draft::RunDraft;
pub use error::{SchedulerError, SchedulerResult};
pub use freshness::{FreshnessReconciler, Reconcile};
pub use gas::{
    AutoConfirmPrompt, DEFAULT_FEE, GAS_ESTIMATE_MARGIN, GAS_PER_FEE, GasEstimate,
    GasRetrySubmitter, OperatorPrompt, TxResult, estimate_gas, is_out_of_gas, query_script,
    submission_payload, suggested_gas,
};
pub use pagination::{
    FetchTicket, PAGE_LIMIT, PageFilter, ReverseConvention, ScheduledRunPager, fetch_page,
    page_request,
};
pub use schema::{FunctionOption, SchemaResolver, function_options, parse_schema_list};
pub use view_state::ViewState;
