//! Creation form values for a new scheduled run.
//!
//! Fields prefixed `msg_` belong to the embedded script call; the rest describe the run.

use dys_types::{MaybeJson, Msg};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Flat form values, as collected from the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDraft {
    /// Account that owns the run.
    pub creator: String,
    /// Target block height.
    pub height: String,
    /// Gas limit reserved for the call.
    pub gas: String,
    /// Account the call is sent as.
    pub msg_creator: String,
    /// Script address.
    pub msg_address: String,
    /// Source lines prepended before the call.
    pub msg_extra_lines: String,
    /// Function to invoke; empty runs the script body.
    pub msg_function_name: String,
    /// Positional arguments as JSON text.
    pub msg_args: String,
    /// Keyword arguments as JSON text.
    pub msg_kwargs: String,
    /// Coins attached to the call, e.g. `100dys`.
    pub msg_coins: String,
}

impl RunDraft {
    /// Prefill: the account creates the run, sends the call and is the default script;
    /// the target height starts at the current head.
    #[must_use]
    pub fn initial(account_address: &str, current_height: Option<&str>) -> Self {
        Self {
            creator: account_address.to_string(),
            msg_creator: account_address.to_string(),
            msg_address: account_address.to_string(),
            height: current_height.unwrap_or_default().to_string(),
            ..Self::default()
        }
    }

    /// Embedded call descriptor.
    #[must_use]
    pub fn msg(&self) -> Msg {
        Msg {
            creator: self.msg_creator.clone(),
            address: self.msg_address.clone(),
            extra_lines: self.msg_extra_lines.clone(),
            function_name: self.msg_function_name.clone(),
            args: MaybeJson::new(self.msg_args.clone()),
            kwargs: MaybeJson::new(self.msg_kwargs.clone()),
            coins: self.msg_coins.clone(),
        }
    }

    /// Call descriptor as a JSON object, used for dry-run queries.
    #[must_use]
    pub fn msg_value(&self) -> Value {
        json!({
            "creator": self.msg_creator,
            "address": self.msg_address,
            "extra_lines": self.msg_extra_lines,
            "function_name": self.msg_function_name,
            "args": self.msg_args,
            "kwargs": self.msg_kwargs,
            "coins": self.msg_coins,
        })
    }

    /// Message value for `sendMsgCreateScheduledRun`.
    #[must_use]
    pub fn create_value(&self) -> Value {
        json!({
            "creator": self.creator,
            "height": self.height,
            "gas": self.gas,
            "msg": self.msg_value(),
        })
    }

    /// Select the function to call. Changing it clears previously entered kwargs.
    pub fn select_function(&mut self, function_name: &str) {
        if self.msg_function_name != function_name {
            self.msg_function_name = function_name.to_string();
            self.msg_kwargs.clear();
        }
    }

    /// Store keyword arguments as JSON text.
    pub fn set_kwargs(&mut self, kwargs: &Value) {
        self.msg_kwargs = kwargs.to_string();
    }

    /// Write a gas suggestion into the form.
    pub fn apply_gas_estimate(&mut self, suggested_gas: u64) {
        self.gas = suggested_gas.to_string();
    }
}
