//! HTTP bridge: queries go to the chain REST API, submissions to the signer service.
//!
//! **Routing:**
//! 1. Query commands map to a fixed REST route; `{"query": {...}}` entries become URL query
//!    parameters, except those consumed as path segments (e.g. `index` for schemas).
//! 2. `send*` commands are POSTed to `{signer_url}/dispatch` as `{command, value}` where
//!    `value` is the full dispatch payload (message, fee, gas).
//! 3. Non-2xx answers become [`BridgeError::Status`] carrying the remote `message`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde_json::{Map, Value, json};

use crate::bridge::{
    API_ENDPOINT_KEY, BridgeError, QUERY_QUERY_SCRIPT, QUERY_SCHEDULED_RUN_ALL, QUERY_SCHEMA,
    RemoteBridge, SERVICE_GET_LATEST_BLOCK,
};
use crate::config::HttpBridgeConfig;

/// Path segment replaced by the `query` entry of the same name.
enum Segment {
    Literal(&'static str),
    Param(&'static str),
}

struct Route {
    segments: &'static [Segment],
}

const SCHEDULED_RUN_ALL_ROUTE: Route = Route {
    segments: &[Segment::Literal("dyson"), Segment::Literal("scheduled_run")],
};
const SCHEMA_ROUTE: Route = Route {
    segments: &[
        Segment::Literal("dyson"),
        Segment::Literal("schema"),
        Segment::Param("index"),
    ],
};
const QUERY_SCRIPT_ROUTE: Route = Route {
    segments: &[Segment::Literal("dyson"), Segment::Literal("query_script")],
};
const LATEST_BLOCK_ROUTE: Route = Route {
    segments: &[
        Segment::Literal("cosmos"),
        Segment::Literal("base"),
        Segment::Literal("tendermint"),
        Segment::Literal("v1beta1"),
        Segment::Literal("blocks"),
        Segment::Literal("latest"),
    ],
};

fn query_route(command: &str) -> Option<&'static Route> {
    match command {
        QUERY_SCHEDULED_RUN_ALL => Some(&SCHEDULED_RUN_ALL_ROUTE),
        QUERY_SCHEMA => Some(&SCHEMA_ROUTE),
        QUERY_QUERY_SCRIPT => Some(&QUERY_SCRIPT_ROUTE),
        SERVICE_GET_LATEST_BLOCK => Some(&LATEST_BLOCK_ROUTE),
        _ => None,
    }
}

fn is_send_command(command: &str) -> bool {
    command
        .rsplit('/')
        .next()
        .is_some_and(|name| name.starts_with("send"))
}

/// `reqwest`-backed [`RemoteBridge`].
pub struct HttpBridge {
    client: Client,
    api_url: String,
    signer_url: Option<String>,
    getters: HashMap<String, Value>,
}

impl HttpBridge {
    /// Build a bridge from config.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &HttpBridgeConfig) -> Result<Self, BridgeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| BridgeError::Transport(format!("reqwest client: {e}")))?;
        let api_url = config.api_url.trim().trim_end_matches('/').to_string();
        let signer_url = config
            .signer_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        let mut getters = HashMap::new();
        if !api_url.is_empty() {
            getters.insert(API_ENDPOINT_KEY.to_string(), Value::String(api_url.clone()));
        }
        Ok(Self {
            client,
            api_url,
            signer_url,
            getters,
        })
    }

    fn route_url(
        &self,
        route: &Route,
        params: &mut Map<String, Value>,
    ) -> Result<Url, BridgeError> {
        if self.api_url.is_empty() {
            return Err(BridgeError::Transport("chain API endpoint not configured".into()));
        }
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| BridgeError::Transport(format!("invalid api url {}: {e}", self.api_url)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| BridgeError::Transport("api url cannot be a base".into()))?;
            path.pop_if_empty();
            for segment in route.segments {
                match segment {
                    Segment::Literal(text) => {
                        path.push(text);
                    }
                    Segment::Param(name) => {
                        let value = params
                            .remove(*name)
                            .map(|value| scalar_to_string(&value))
                            .unwrap_or_default();
                        if value.is_empty() {
                            return Err(BridgeError::rejected(format!("missing {name}")));
                        }
                        path.push(&value);
                    }
                }
            }
        }
        Ok(url)
    }

    async fn query(
        &self,
        command: &str,
        route: &Route,
        payload: Value,
    ) -> Result<Value, BridgeError> {
        let mut params = match payload.get("query") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        let url = self.route_url(route, &mut params)?;
        let pairs: Vec<(String, String)> = params
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), scalar_to_string(value)))
            .collect();
        let started = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .query(&pairs)
            .send()
            .await
            .map_err(|e| BridgeError::Transport(format!("{command}: {e}")))?;
        tracing::debug!(
            event = "dys.bridge.http.query",
            command,
            url = %url,
            status = %response.status(),
            elapsed_ms = started.elapsed().as_millis(),
            "bridge query completed"
        );
        decode_response(command, response).await
    }

    async fn send(&self, command: &str, payload: Value) -> Result<Value, BridgeError> {
        let Some(signer_url) = self.signer_url.as_deref() else {
            return Err(BridgeError::MissingWallet);
        };
        let url = format!("{signer_url}/dispatch");
        let body = json!({ "command": command, "value": payload });
        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BridgeError::Transport(format!("{command}: {e}")))?;
        tracing::debug!(
            event = "dys.bridge.http.send",
            command,
            status = %response.status(),
            elapsed_ms = started.elapsed().as_millis(),
            "bridge submission completed"
        );
        decode_response(command, response).await
    }
}

#[async_trait]
impl RemoteBridge for HttpBridge {
    async fn dispatch(&self, command: &str, payload: Value) -> Result<Value, BridgeError> {
        if let Some(route) = query_route(command) {
            return self.query(command, route, payload).await;
        }
        if is_send_command(command) {
            return self.send(command, payload).await;
        }
        Err(BridgeError::Unsupported(command.to_string()))
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.getters.get(key).cloned()
    }
}

async fn decode_response(command: &str, response: Response) -> Result<Value, BridgeError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| BridgeError::Transport(format!("{command}: read body: {e}")))?;
    if !status.is_success() {
        return Err(BridgeError::Status {
            status: Some(status.as_u16()),
            message: remote_message(&text).unwrap_or_else(|| format!("{command}: HTTP {status}")),
        });
    }
    serde_json::from_str(&text).map_err(|e| BridgeError::Decode(format!("{command}: {e}")))
}

/// Pull a human-readable message out of an error body (`message`, then `error`).
fn remote_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "raw_log"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .filter(|message| !message.is_empty())
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
