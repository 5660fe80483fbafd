//! Admin CRUD over single entities.
//!
//! Every route passes [`AppState::require_admin`] first. Deletes are soft and
//! answer 404 when nothing active had the id.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use codex::{CodexEntry, CodexRecord, EntryId};
use formats::save_request::{parse_location, parse_region};
use persistence::bulk_upsert;
use scene::model::GlobalConfig;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::{json_body, ApiError};
use crate::save::report_response;
use crate::state::{AppState, WALLET_HEADER};

fn ok() -> Response {
    (StatusCode::OK, Json(json!({ "success": true }))).into_response()
}

/// Parses `raw` as a JSON object and stamps `key` with the id from the path.
fn object_with_id(raw: &[u8], key: &str, id: &str) -> Result<Value, ApiError> {
    let mut value = json_body(raw)?;
    let Some(obj) = value.as_object_mut() else {
        return Err(ApiError::bad_request("Request body must be an object"));
    };
    obj.insert(key.to_string(), Value::String(id.to_string()));
    Ok(value)
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub wallet: Option<String>,
}

pub async fn check_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CheckQuery>,
) -> Response {
    let wallet = query
        .wallet
        .or_else(|| {
            headers
                .get(WALLET_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_default();
    let is_admin = state.is_admin(&wallet).await;
    (
        StatusCode::OK,
        Json(json!({ "wallet": wallet, "isAdmin": is_admin })),
    )
        .into_response()
}

/// Upserts one universe and any locations nested in the body.
pub async fn put_region(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    state.require_admin(&headers).await?;
    let value = object_with_id(&body, "id", &id)?;
    let region = parse_region(&value, 0).map_err(|e| ApiError::bad_request(e.to_string()))?;
    info!(region = %id, locations = region.locations.len(), "admin region upsert");
    let report = bulk_upsert(state.backend.as_ref(), std::slice::from_ref(&region)).await;
    Ok(report_response(report))
}

pub async fn delete_region(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    state.require_admin(&headers).await?;
    if state.backend.delete_region(&id).await? {
        info!(region = %id, "admin region delete");
        Ok(ok())
    } else {
        Err(ApiError::not_found("Region not found"))
    }
}

/// Body is a client-shape location plus `regionId`, the owning universe.
pub async fn put_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    state.require_admin(&headers).await?;
    let value = object_with_id(&body, "id", &id)?;
    let region_id = ["regionId", "region_id"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .filter(|r| !r.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("regionId is required"))?;
    let location = parse_location(&value, 0).map_err(ApiError::bad_request)?;
    state.backend.upsert_location(&region_id, &location).await?;
    info!(region = %region_id, location = %id, "admin location upsert");
    Ok(ok())
}

pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    state.require_admin(&headers).await?;
    if state.backend.delete_location(&id).await? {
        info!(location = %id, "admin location delete");
        Ok(ok())
    } else {
        Err(ApiError::not_found("Location not found"))
    }
}

pub async fn put_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    state.require_admin(&headers).await?;
    let config: GlobalConfig = serde_json::from_value(json_body(&body)?)
        .map_err(|e| ApiError::bad_request(format!("Invalid config: {e}")))?;
    if config.multiverse_background_url.trim().is_empty() {
        return Err(ApiError::bad_request("multiverseBackgroundUrl is required"));
    }
    state.backend.update_config(&config).await?;
    Ok(ok())
}

/// Body is a storage-shape codex row; columns that do not belong to the
/// entry's type are dropped before writing.
pub async fn put_codex(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    state.require_admin(&headers).await?;
    let value = object_with_id(&body, "entry_id", &entry_id)?;
    let record: CodexRecord = serde_json::from_value(value)
        .map_err(|e| ApiError::bad_request(format!("Invalid codex entry: {e}")))?;
    if record.name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    let record = CodexRecord::from(CodexEntry::from(record));
    state.backend.upsert_codex(&record).await?;
    info!(entry = %entry_id, kind = record.entry_type.as_str(), "admin codex upsert");
    Ok(ok())
}

pub async fn delete_codex(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    state.require_admin(&headers).await?;
    if state.backend.delete_codex(&EntryId::new(entry_id)).await? {
        Ok(ok())
    } else {
        Err(ApiError::not_found("Codex entry not found"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use persistence::{LoreBackend, MemoryBackend};
    use scene::ids::{LocationId, UniverseId};
    use tower::ServiceExt;

    use super::*;
    use crate::router;
    use crate::state::test_state;

    async fn call(
        backend: &Arc<MemoryBackend>,
        method: Method,
        uri: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = router(test_state(backend.clone(), false))
            .oneshot(req)
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn region_and_location_lifecycle() {
        let backend = Arc::new(MemoryBackend::new());
        let (status, _) = call(
            &backend,
            Method::PUT,
            "/api/admin/regions/u1",
            json!({ "name": "Alpha", "color": "#fff", "cx": 10, "cy": 20 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &backend,
            Method::PUT,
            "/api/admin/locations/l1",
            json!({ "regionId": "u1", "name": "Outpost", "cx": 11, "cy": 21, "type": "planet" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let map = backend.fetch_regions().await.unwrap();
        assert!(map.find_location(&LocationId::from("l1")).is_some());

        let (status, _) = call(&backend, Method::DELETE, "/api/admin/locations/l1", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&backend, Method::DELETE, "/api/admin/locations/l1", Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&backend, Method::DELETE, "/api/admin/regions/u1", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        let map = backend.fetch_regions().await.unwrap();
        assert!(map.universe(&UniverseId::from("u1")).is_none());
    }

    #[tokio::test]
    async fn location_needs_an_existing_region() {
        let backend = Arc::new(MemoryBackend::new());
        let (status, body) = call(
            &backend,
            Method::PUT,
            "/api/admin/locations/l1",
            json!({ "name": "Outpost", "cx": 11, "cy": 21 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "regionId is required");

        let (status, _) = call(
            &backend,
            Method::PUT,
            "/api/admin/locations/l1",
            json!({ "regionId": "ghost", "name": "Outpost", "cx": 11, "cy": 21 }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_region_body_is_rejected() {
        let backend = Arc::new(MemoryBackend::new());
        let (status, _) = call(
            &backend,
            Method::PUT,
            "/api/admin/regions/u1",
            json!({ "name": "Alpha", "cx": "left", "cy": 20 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn config_and_codex_writes() {
        let backend = Arc::new(MemoryBackend::new());
        let (status, _) = call(
            &backend,
            Method::PUT,
            "/api/admin/config",
            json!({ "multiverseBackgroundUrl": "/bg.webm" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            backend.fetch_config().await.unwrap().unwrap().multiverse_background_url,
            "/bg.webm"
        );

        let (status, _) = call(
            &backend,
            Method::PUT,
            "/api/admin/codex/fall",
            json!({ "entry_type": "event", "name": "The Fall", "character_role": "ignored" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let rows = backend.fetch_codex().await.unwrap();
        assert_eq!(rows[0].entry_id, EntryId::from("fall"));
        assert_eq!(rows[0].character_role, None);

        let (status, _) = call(&backend, Method::DELETE, "/api/admin/codex/fall", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!backend.fetch_codex().await.unwrap()[0].is_active);
    }

    #[tokio::test]
    async fn wallet_check_reports_admin_status() {
        let backend = Arc::new(MemoryBackend::new().with_admin("0xabc"));
        let (_, body) = call(&backend, Method::GET, "/api/admin/check?wallet=0xABC", Value::Null).await;
        assert_eq!(body["isAdmin"], true);
        let (_, body) = call(&backend, Method::GET, "/api/admin/check?wallet=0xdef", Value::Null).await;
        assert_eq!(body["isAdmin"], false);
    }
}
