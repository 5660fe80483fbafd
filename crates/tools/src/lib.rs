//! Map file tooling behind the `lore` CLI.

use std::path::Path;

use formats::map_file::{MapDocument, MapFileError};
use formats::rows::{ConfigRow, regions_from_map};
use formats::save_request::SaveRequest;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

/// Header carrying the admin wallet on write requests.
pub const WALLET_HEADER: &str = "x-wallet-address";

#[derive(Debug)]
pub enum ToolError {
    Map(MapFileError),
    Http(reqwest::Error),
    Server { status: u16, message: String },
    Io(std::io::Error),
    /// The file has problems that would drop universes or locations.
    Rejected(usize),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Map(e) => write!(f, "{e}"),
            ToolError::Http(e) => write!(f, "request failed: {e}"),
            ToolError::Server { status, message } => write!(f, "server answered {status}: {message}"),
            ToolError::Io(e) => write!(f, "{e}"),
            ToolError::Rejected(n) => write!(f, "{n} problem(s) would drop data"),
        }
    }
}

impl std::error::Error for ToolError {}

impl From<MapFileError> for ToolError {
    fn from(e: MapFileError) -> Self {
        ToolError::Map(e)
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        ToolError::Http(e)
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Io(e)
    }
}

/// One line per issue, rejecting ones marked `error`, the rest `warning`.
pub fn describe_issues(doc: &MapDocument) -> Vec<String> {
    doc.issues
        .iter()
        .map(|issue| {
            let level = if issue.is_rejecting() { "error" } else { "warning" };
            format!("{level}: {issue}")
        })
        .collect()
}

/// Fails when loading the document dropped anything.
pub fn check(doc: &MapDocument) -> Result<(), ToolError> {
    match doc.issues.iter().filter(|i| i.is_rejecting()).count() {
        0 => Ok(()),
        n => Err(ToolError::Rejected(n)),
    }
}

/// The backend calls a save of `doc` performs, in order.
pub fn storage_calls(doc: &MapDocument) -> Vec<Value> {
    let mut calls = Vec::new();
    for region in regions_from_map(&doc.map) {
        calls.push(json!({ "function": "upsert_lore_region", "params": region.rpc_params() }));
        for location in &region.locations {
            calls.push(json!({
                "function": "upsert_lore_location",
                "params": location.rpc_params(&region.region_id),
            }));
        }
    }
    if let Some(config) = &doc.config {
        calls.push(json!({ "function": "update_lore_config", "params": ConfigRow::rpc_params(config) }));
    }
    calls
}

fn endpoint(server: &str, path: &str) -> String {
    format!("{}{path}", server.trim_end_matches('/'))
}

async fn json_or_error(resp: reqwest::Response) -> Result<Value, ToolError> {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(Value::Null);
    if status.is_success() {
        return Ok(body);
    }
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("no error message")
        .to_string();
    Err(ToolError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Posts `doc` to the server's save endpoint and returns its answer.
pub async fn import(
    client: &Client,
    server: &str,
    doc: &MapDocument,
    wallet: Option<&str>,
) -> Result<Value, ToolError> {
    let body = SaveRequest::client_body(&doc.map, doc.config.as_ref());
    let mut req = client.post(endpoint(server, "/api/save-data")).json(&body);
    if let Some(wallet) = wallet {
        req = req.header(WALLET_HEADER, wallet);
    }
    info!(universes = doc.map.universes.len(), "importing map");
    json_or_error(req.send().await?).await
}

/// Fetches the live map and config as a save body, ready for `import`.
pub async fn export(client: &Client, server: &str) -> Result<Value, ToolError> {
    let regions = json_or_error(client.get(endpoint(server, "/api/regions")).send().await?).await?;
    let config = json_or_error(client.get(endpoint(server, "/api/config")).send().await?).await?;
    Ok(json!({ "config": config, "regions": regions }))
}

pub fn write_json(path: &Path, value: &Value) -> Result<(), ToolError> {
    let raw = serde_json::to_string_pretty(value).map_err(|e| ToolError::Io(e.into()))?;
    std::fs::write(path, raw)?;
    Ok(())
}
