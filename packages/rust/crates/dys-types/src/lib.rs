//! dys-types - Wire types for the Dyson `scheduled_run` module.
//!
//! Shapes follow the chain REST/JSON encoding: integers travel as strings, optional
//! sub-objects may be missing or `null`, and several fields carry JSON that was
//! serialized into a string (`kwargs`, `args`, `resp.response`, `rawLog`).
//!
//! Types derive `schemars::JsonSchema` so downstream tooling can export the same
//! definitions the client decodes.

#![allow(clippy::doc_markdown)]

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Fee denomination used by every submission.
pub const FEE_DENOM: &str = "dys";

/// Token amount in a single denomination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Coin {
    /// Integer amount, string-encoded.
    #[serde(default)]
    pub amount: String,
    /// Denomination (e.g. `dys`).
    #[serde(default)]
    pub denom: String,
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Embedded script call descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Msg {
    #[serde(default)]
    pub creator: String,
    /// Address of the script to call.
    #[serde(default)]
    pub address: String,
    /// Extra source lines appended to the script before running.
    #[serde(default)]
    pub extra_lines: String,
    #[serde(default)]
    pub function_name: String,
    /// Positional arguments, usually a JSON array serialized into a string.
    #[serde(default)]
    pub args: MaybeJson,
    /// Keyword arguments, usually a JSON object serialized into a string.
    #[serde(default)]
    pub kwargs: MaybeJson,
    /// Comma separated coin list sent to the script (e.g. `123dys,456token`).
    #[serde(default)]
    pub coins: String,
}

/// Script response recorded once a run executes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunResponse {
    #[serde(default)]
    pub response: MaybeJson,
}

/// A chain-recorded request to execute a script call at a target block height.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScheduledRun {
    /// Unique, lexically ordered key.
    pub index: String,
    #[serde(default)]
    pub creator: String,
    /// Target block height, string-encoded.
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub gas: String,
    #[serde(default)]
    pub msg: Msg,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resp: Option<RunResponse>,
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<String>,
    #[serde(default)]
    pub gasprice: Coin,
    #[serde(default)]
    pub fee: Coin,
}

/// Lifecycle state derived from the response/error fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Target height not reached yet.
    Pending,
    /// Script executed and returned a response.
    Succeeded,
    /// Script execution recorded an error.
    Failed,
}

impl RunStatus {
    /// Short lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScheduledRun {
    /// Current lifecycle state. An error takes precedence over a response.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        if self.error.is_some() {
            RunStatus::Failed
        } else if self.resp.is_some() {
            RunStatus::Succeeded
        } else {
            RunStatus::Pending
        }
    }

    /// Target height as an integer; `None` when the field is not numeric.
    #[must_use]
    pub fn target_height(&self) -> Option<i64> {
        parse_height(&self.height)
    }
}

/// Pagination footer returned with every page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PageResponse {
    /// Opaque continuation token; missing, `null` or empty means no further pages.
    #[serde(default)]
    pub next_key: Option<String>,
    #[serde(default)]
    pub total: String,
}

/// One page of `QueryScheduledRunAll`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Page {
    #[serde(default)]
    pub scheduled_run: Vec<ScheduledRun>,
    #[serde(default)]
    pub pagination: PageResponse,
}

impl Page {
    /// Continuation token for the next fetch, if any.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.pagination
            .next_key
            .as_deref()
            .filter(|key| !key.is_empty())
    }
}

/// Chain head facts used for height comparisons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BlockInfo {
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub time: String,
}

impl BlockInfo {
    /// Height as an integer; `None` when the field is not numeric.
    #[must_use]
    pub fn height_value(&self) -> Option<i64> {
        parse_height(&self.height)
    }
}

/// `ServiceGetLatestBlock` response body: `{ "block": { "header": { ... } } }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestBlockResponse {
    #[serde(default)]
    pub block: Option<BlockEnvelope>,
}

/// Block wrapper carrying the header.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockEnvelope {
    #[serde(default)]
    pub header: BlockInfo,
}

impl LatestBlockResponse {
    /// Unwrap the header, if the block was present.
    #[must_use]
    pub fn into_block_info(self) -> Option<BlockInfo> {
        self.block.map(|block| block.header)
    }
}

/// One callable function declared by a script, with its keyword-argument schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FunctionSchema {
    pub function: String,
    /// JSON-schema-like tree, typically `{ "type": "object", "properties": { ... } }`.
    #[serde(default)]
    pub schema: Value,
}

impl FunctionSchema {
    /// Whether the schema declares at least one keyword argument.
    #[must_use]
    pub fn has_arguments(&self) -> bool {
        schema_has_arguments(&self.schema)
    }
}

/// Whether a schema tree declares at least one property.
#[must_use]
pub fn schema_has_arguments(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|properties| !properties.is_empty())
}

/// Account exposed by the wallet after connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AccountInfo {
    /// Human-readable account name in the wallet.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "bech32Address", alias = "bech32_address")]
    pub bech32_address: String,
}

/// A string that may carry serialized JSON.
///
/// Decoding is best-effort: text that does not parse is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct MaybeJson(#[serde(deserialize_with = "null_as_empty")] pub String);

/// Result of [`MaybeJson::decode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The text parsed as JSON.
    Json(Value),
    /// The text is not JSON; kept as-is.
    Raw(String),
}

impl MaybeJson {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the text as JSON. Double-encoded payloads (a JSON string whose content is
    /// itself a JSON object or array) are unwrapped one level.
    #[must_use]
    pub fn decode(&self) -> Decoded {
        decode_json_text(&self.0)
    }
}

impl From<&str> for MaybeJson {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MaybeJson {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for MaybeJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Best-effort decode of JSON carried in a string.
#[must_use]
pub fn decode_json_text(text: &str) -> Decoded {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(nested @ (Value::Object(_) | Value::Array(_))) => Decoded::Json(nested),
            _ => Decoded::Json(Value::String(inner)),
        },
        Ok(value) => Decoded::Json(value),
        Err(_) => Decoded::Raw(text.to_string()),
    }
}

/// Replace a string field holding JSON with its decoded value, in place.
///
/// Returns `true` when the field was decoded. Non-string or non-JSON fields are left alone.
pub fn decode_field_in_place(object: &mut Value, field: &str) -> bool {
    let Some(slot) = object.get_mut(field) else {
        return false;
    };
    let Some(text) = slot.as_str() else {
        return false;
    };
    match decode_json_text(text) {
        Decoded::Json(value) => {
            *slot = value;
            true
        }
        Decoded::Raw(_) => false,
    }
}

/// Parse an integer-as-string height.
#[must_use]
pub fn parse_height(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.is_empty()))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
