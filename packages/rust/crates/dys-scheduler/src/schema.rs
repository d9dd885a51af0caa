//! Script function discovery via `QuerySchema`.
//!
//! The response's `schema` field is JSON text encoding `[{function, schema}, ...]`.
//! Every call goes to the chain; nothing is cached across address/function changes.

use std::sync::Arc;

use dys_bridge::{BridgeError, QUERY_SCHEMA, RemoteBridge};
use dys_types::{Decoded, FunctionSchema, decode_json_text};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{SchedulerError, SchedulerResult};

/// One entry of a function selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionOption {
    /// Text shown to the operator.
    pub label: String,
    /// Function name; empty for the "no function" entry.
    pub value: String,
}

/// Selector entries with a leading "no function" choice.
#[must_use]
pub fn function_options(functions: &[String]) -> Vec<FunctionOption> {
    std::iter::once(FunctionOption {
        label: "[None]".to_string(),
        value: String::new(),
    })
    .chain(functions.iter().map(|name| FunctionOption {
        label: name.clone(),
        value: name.clone(),
    }))
    .collect()
}

/// Decode the `schema` field of a `QuerySchema` response.
///
/// # Errors
/// [`SchedulerError::RemoteRejected`] when the field is missing or not a schema list.
pub fn parse_schema_list(response: &Value) -> SchedulerResult<Vec<FunctionSchema>> {
    let list = match response.get("schema") {
        Some(Value::String(text)) => match decode_json_text(text) {
            Decoded::Json(value) => value,
            Decoded::Raw(_) => {
                return Err(SchedulerError::RemoteRejected(
                    "schema field is not valid JSON".to_string(),
                ));
            }
        },
        Some(value @ Value::Array(_)) => value.clone(),
        _ => {
            return Err(SchedulerError::RemoteRejected(
                "schema field missing from response".to_string(),
            ));
        }
    };
    serde_json::from_value(list)
        .map_err(|e| SchedulerError::RemoteRejected(format!("malformed schema list: {e}")))
}

/// Resolves callable functions and their keyword-argument schemas.
#[derive(Clone)]
pub struct SchemaResolver {
    bridge: Arc<dyn RemoteBridge>,
}

impl SchemaResolver {
    pub fn new(bridge: Arc<dyn RemoteBridge>) -> Self {
        Self { bridge }
    }

    /// All declared `{function, schema}` records of the script at `address`.
    ///
    /// # Errors
    /// [`SchedulerError::InvalidAddress`] for an empty address or when the chain rejects it;
    /// other bridge failures are classified as usual.
    pub async fn fetch_schemas(&self, address: &str) -> SchedulerResult<Vec<FunctionSchema>> {
        let address = address.trim();
        if address.is_empty() {
            return Err(SchedulerError::InvalidAddress(
                "address field is required".to_string(),
            ));
        }
        let response = self
            .bridge
            .dispatch(QUERY_SCHEMA, json!({ "query": { "index": address } }))
            .await
            .map_err(|error| classify_schema_error(address, error))?;
        let schemas = parse_schema_list(&response)?;
        tracing::debug!(
            event = "dys.schema.fetched",
            address,
            functions = schemas.len(),
            "script schema fetched"
        );
        Ok(schemas)
    }

    /// Names of the script's callable functions, in declared order.
    ///
    /// # Errors
    /// As [`Self::fetch_schemas`]; additionally [`SchedulerError::RemoteRejected`] when the
    /// script declares no functions.
    pub async fn list_functions(&self, address: &str) -> SchedulerResult<Vec<String>> {
        let functions: Vec<String> = self
            .fetch_schemas(address)
            .await?
            .into_iter()
            .map(|entry| entry.function)
            .collect();
        if functions.is_empty() {
            return Err(SchedulerError::RemoteRejected(format!(
                "script {} declares no callable functions",
                address.trim()
            )));
        }
        Ok(functions)
    }

    /// Keyword-argument schema of `function_name`.
    ///
    /// # Errors
    /// [`SchedulerError::SchemaNotFound`] when the function is not declared; otherwise as
    /// [`Self::fetch_schemas`].
    pub async fn get_schema(&self, address: &str, function_name: &str) -> SchedulerResult<Value> {
        self.fetch_schemas(address)
            .await?
            .into_iter()
            .find(|entry| entry.function == function_name)
            .map(|entry| entry.schema)
            .ok_or_else(|| SchedulerError::SchemaNotFound {
                address: address.trim().to_string(),
                function: function_name.to_string(),
            })
    }
}

fn classify_schema_error(address: &str, error: BridgeError) -> SchedulerError {
    match error {
        BridgeError::Status { message, .. }
            if message.to_ascii_lowercase().contains("address")
                || message.to_ascii_lowercase().contains("bech32") =>
        {
            tracing::debug!(
                event = "dys.schema.invalid_address",
                address,
                error = %message,
                "chain rejected script address"
            );
            SchedulerError::InvalidAddress(message)
        }
        other => SchedulerError::from(other),
    }
}
