//! Workflow error taxonomy.

use dys_bridge::BridgeError;
use thiserror::Error;

use crate::gas::is_out_of_gas;

/// Result alias for workflow operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Failures surfaced at the action boundary (list, submit, schema lookup, ...).
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Network or RPC failure; surfaced, never retried automatically.
    #[error("fetch failed: {0}")]
    TransientFetch(String),

    /// Chain rejected a submission for running out of gas.
    #[error("{0}")]
    OutOfGas(String),

    /// Chain rejected the request for any other reason.
    #[error("{0}")]
    RemoteRejected(String),

    /// Function absent from the script's declared schema list.
    #[error("Function not found: {function} (script {address})")]
    SchemaNotFound {
        /// Script address that was queried.
        address: String,
        /// Function that was requested.
        function: String,
    },

    /// Missing or malformed script/account address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Wallet bridge unavailable.
    #[error("dys not available")]
    MissingWallet,

    /// Operator declined a fee prompt.
    #[error("submission aborted by operator")]
    UserAborted,

    /// Invalid local configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SchedulerError {
    /// Message shown to the operator; `None` for failures that stop silently.
    #[must_use]
    pub fn operator_message(&self) -> Option<String> {
        match self {
            Self::UserAborted => None,
            other => Some(other.to_string()),
        }
    }
}

impl From<BridgeError> for SchedulerError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Transport(message) | BridgeError::Decode(message) => {
                Self::TransientFetch(message)
            }
            BridgeError::MissingWallet => Self::MissingWallet,
            BridgeError::Status { message, .. } if is_out_of_gas(&message) => {
                Self::OutOfGas(message)
            }
            BridgeError::Status { message, .. } => Self::RemoteRejected(message),
            BridgeError::Unsupported(command) => {
                Self::RemoteRejected(format!("unsupported command: {command}"))
            }
        }
    }
}
