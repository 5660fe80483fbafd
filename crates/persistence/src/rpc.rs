//! Hosted backend reached over its REST interface.
//!
//! Reads select from the `lore_*` tables; writes go through the stored
//! procedures (`upsert_lore_region`, `delete_codex_entry`, ...) under
//! `{base}/rest/v1/rpc/`. Procedures enforce admin rights themselves and
//! answer with an "Unauthorized" error when the caller lacks them.

use codex::{CodexRecord, CodexRelationship, EntryId};
use formats::rows::{
    ConfigRow, LocationRow, LocationUpsert, MULTIVERSE_BACKGROUND_KEY, RegionRow, RegionUpsert,
    map_from_rows,
};
use reqwest::{Client, StatusCode};
use scene::model::{GlobalConfig, MapData};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::backend::{BoxFuture, LoreBackend, Result};
use crate::error::{ErrorKind, PersistenceError};

pub const RELATIONSHIPS_TABLE: &str = "lore_codex_relationships";

pub struct RpcBackend {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RpcBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
        }
    }

    /// Sends `token` as the bearer instead of the API key, so procedures
    /// see the signed-in user.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{function}", self.base_url)
    }

    fn table_url(&self, table: &str, query: &str) -> String {
        format!("{}/rest/v1/{table}?{query}", self.base_url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        req.header("apikey", &self.api_key).bearer_auth(bearer)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<String> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| PersistenceError::with_source(ErrorKind::Network, "Backend request failed", e))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PersistenceError::with_source(ErrorKind::Network, "Failed to read backend response", e))?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(body)
    }

    async fn rpc(&self, function: &str, params: Value) -> Result<Value> {
        debug!(function, "backend rpc");
        let body = self.send(self.client.post(self.rpc_url(function)).json(&params)).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            PersistenceError::with_source(ErrorKind::Backend, format!("Invalid response from {function}"), e)
        })
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &str) -> Result<Vec<T>> {
        let body = self.send(self.client.get(self.table_url(table, query))).await?;
        serde_json::from_str(&body).map_err(|e| {
            PersistenceError::with_source(ErrorKind::Backend, format!("Invalid rows from {table}"), e)
        })
    }
}

/// Maps a failed response to an error, keeping the backend's message.
fn status_error(status: StatusCode, body: &str) -> PersistenceError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("Backend responded with {status}"));
    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Unauthorized,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        s if s.is_client_error() => ErrorKind::Invalid,
        _ => ErrorKind::Backend,
    };
    PersistenceError::new(kind, message)
}

/// Procedures answer deletes with a boolean; anything else means the call
/// went through.
fn deleted(v: Value) -> bool {
    v.as_bool().unwrap_or(true)
}

/// Parameters of the `upsert_codex_entry` procedure.
pub fn codex_params(r: &CodexRecord) -> Value {
    json!({
        "p_entry_id": r.entry_id,
        "p_entry_type": r.entry_type.as_str(),
        "p_name": r.name,
        "p_subtitle": r.subtitle,
        "p_summary": r.summary,
        "p_known_info": r.known_info,
        "p_locked_sections": r.locked_sections,
        "p_icon_url": r.icon_url,
        "p_image_url": r.image_url,
        "p_color": r.color,
        "p_primary_location_id": r.primary_location_id,
        "p_appears_in_locations": r.appears_in_locations,
        "p_is_unlocked": r.is_unlocked,
        "p_unlock_condition": r.unlock_condition,
        "p_sort_order": r.sort_order,
    })
}

impl LoreBackend for RpcBackend {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn fetch_regions(&self) -> BoxFuture<'_, Result<MapData>> {
        Box::pin(async move {
            let query = "select=*&is_active=eq.true&order=sort_order.asc";
            let (regions, locations) = futures_util::future::try_join(
                self.select::<RegionRow>("lore_regions", query),
                self.select::<LocationRow>("lore_locations", query),
            )
            .await?;
            Ok(map_from_rows(regions, locations))
        })
    }

    fn fetch_config(&self) -> BoxFuture<'_, Result<Option<GlobalConfig>>> {
        Box::pin(async move {
            let query = format!("select=*&config_key=eq.{MULTIVERSE_BACKGROUND_KEY}");
            let rows: Vec<ConfigRow> = self.select("lore_config", &query).await?;
            Ok(rows.iter().find_map(ConfigRow::global_config))
        })
    }

    fn upsert_region<'a>(&'a self, region: &'a RegionUpsert) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.rpc("upsert_lore_region", region.rpc_params()).await?;
            Ok(())
        })
    }

    fn upsert_location<'a>(
        &'a self,
        region_id: &'a str,
        location: &'a LocationUpsert,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.rpc("upsert_lore_location", location.rpc_params(region_id)).await?;
            Ok(())
        })
    }

    fn update_config<'a>(&'a self, config: &'a GlobalConfig) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.rpc("update_lore_config", ConfigRow::rpc_params(config)).await?;
            Ok(())
        })
    }

    fn delete_region<'a>(&'a self, region_id: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let v = self.rpc("delete_lore_region", json!({ "p_region_id": region_id })).await?;
            Ok(deleted(v))
        })
    }

    fn delete_location<'a>(&'a self, location_id: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let v = self
                .rpc("delete_lore_location", json!({ "p_location_id": location_id }))
                .await?;
            Ok(deleted(v))
        })
    }

    fn fetch_codex(&self) -> BoxFuture<'_, Result<Vec<CodexRecord>>> {
        Box::pin(async move {
            self.select("lore_codex_entries", "select=*&order=sort_order.asc").await
        })
    }

    fn upsert_codex<'a>(&'a self, record: &'a CodexRecord) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.rpc("upsert_codex_entry", codex_params(record)).await?;
            Ok(())
        })
    }

    fn delete_codex<'a>(&'a self, entry_id: &'a EntryId) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let v = self
                .rpc("delete_codex_entry", json!({ "p_entry_id": entry_id }))
                .await?;
            Ok(deleted(v))
        })
    }

    fn fetch_relationships(&self) -> BoxFuture<'_, Result<Vec<CodexRelationship>>> {
        Box::pin(async move { self.select(RELATIONSHIPS_TABLE, "select=*").await })
    }

    fn is_admin<'a>(&'a self, wallet: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let v = self
                .rpc("is_admin", json!({ "p_wallet_address": wallet.to_lowercase() }))
                .await?;
            Ok(v.as_bool().unwrap_or(false))
        })
    }
}
