mod block;
mod create;
mod listing;
mod script;
mod watch;

pub(crate) use block::{run_block_mode, run_wire_schema_mode};
pub(crate) use create::run_create_mode;
pub(crate) use listing::run_list_mode;
pub(crate) use script::{
    run_estimate_gas_mode, run_functions_mode, run_query_mode, run_schema_mode,
};
pub(crate) use watch::run_watch_mode;
