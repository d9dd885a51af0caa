use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dys-scheduler")]
#[command(about = "Dyson scheduled runs: list, inspect scripts, estimate gas, create and watch.")]
pub(crate) struct Cli {
    /// Override config directory (`<dir>/dys-scheduler/settings.yaml`).
    #[arg(long, global = true)]
    pub(crate) conf: Option<PathBuf>,

    /// Chain REST endpoint (overrides `bridge.api_url`).
    #[arg(long, global = true)]
    pub(crate) api_url: Option<String>,

    /// Signer service endpoint (overrides `bridge.signer_url`).
    #[arg(long, global = true)]
    pub(crate) signer_url: Option<String>,

    /// Debug logging for dys crates (ignored when `RUST_LOG` is set).
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Listing filter shared by `list` and `watch`.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ListingArgs {
    /// Index prefix (default: connected account address).
    #[arg(long)]
    pub(crate) prefix: Option<String>,

    /// Descending order by index.
    #[arg(long)]
    pub(crate) reversed: bool,

    /// Restore state from a query string such as `?prefix=dys1..&reversed=true`.
    #[arg(long)]
    pub(crate) view: Option<String>,
}

/// Creation form fields. Unset fields keep the prefilled value.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct DraftArgs {
    /// Run creator (default: connected account).
    #[arg(long)]
    pub(crate) creator: Option<String>,

    /// Target block height (default: current head).
    #[arg(long)]
    pub(crate) height: Option<String>,

    /// Gas limit for the scheduled call (default: dry-run estimate).
    #[arg(long)]
    pub(crate) gas: Option<String>,

    /// Sender of the embedded call (default: connected account).
    #[arg(long)]
    pub(crate) msg_creator: Option<String>,

    /// Script address (default: connected account).
    #[arg(long)]
    pub(crate) address: Option<String>,

    /// Extra source lines executed before the call.
    #[arg(long)]
    pub(crate) extra_lines: Option<String>,

    /// Function to call.
    #[arg(long)]
    pub(crate) function: Option<String>,

    /// Positional arguments as JSON text.
    #[arg(long)]
    pub(crate) args: Option<String>,

    /// Keyword arguments as JSON text.
    #[arg(long)]
    pub(crate) kwargs: Option<String>,

    /// Coins attached to the call (e.g. `100dys`).
    #[arg(long)]
    pub(crate) coins: Option<String>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print scheduled runs for a prefix.
    List {
        #[command(flatten)]
        listing: ListingArgs,

        /// Number of pages to load.
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// List callable functions of a script.
    Functions {
        /// Script address.
        address: String,

        /// Emit selector options (`[None]` first) as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the kwargs schema of a script function.
    Schema {
        /// Script address.
        address: String,
        /// Function name.
        function: String,
    },
    /// Dry-run a script call without submitting.
    Query {
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Dry-run a script call and suggest a gas limit.
    EstimateGas {
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Create a scheduled run (signed by the connected wallet).
    Create {
        #[command(flatten)]
        draft: DraftArgs,

        /// Initial fee offered at the first prompt.
        #[arg(long)]
        fee: Option<u64>,

        /// Accept suggested fees without prompting.
        #[arg(long, short)]
        yes: bool,
    },
    /// Print the latest block header.
    Block,
    /// Follow the listing: refresh as runs mature; read filter input from stdin.
    Watch {
        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Print the JSON Schema of the scheduled run wire type.
    WireSchema,
}
