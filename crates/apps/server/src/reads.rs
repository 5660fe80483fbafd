//! Public read API: map data, config and the codex.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use codex::{
    entries_at_location, filter_entries, find_entry, public_entries, related_entries,
    resolve_locations, timeline, CharacterStatus, CodexEntry, CodexFilter, CodexKind,
    CodexRecord, EntryId,
};
use scene::ids::{LocationId, UniverseId};
use scene::model::MapData;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

/// Response header naming where the map came from (`backend`, `cache`,
/// `defaults`).
pub const SOURCE_HEADER: &str = "x-lore-source";

pub async fn list_regions(State(state): State<AppState>) -> Response {
    let loaded = state.load().await;
    (
        StatusCode::OK,
        [(SOURCE_HEADER, loaded.source.as_str())],
        Json(loaded.map),
    )
        .into_response()
}

pub async fn get_region(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let loaded = state.load().await;
    match loaded.map.universe(&UniverseId::new(id)) {
        Some(universe) => (StatusCode::OK, Json(universe)).into_response(),
        None => ApiError::not_found("Region not found").into_response(),
    }
}

pub async fn get_config(State(state): State<AppState>) -> Response {
    let loaded = state.load().await;
    (StatusCode::OK, Json(loaded.config)).into_response()
}

/// Query string of `GET /api/codex`. List parameters are comma separated.
#[derive(Debug, Default, Deserialize)]
pub struct CodexQuery {
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub simulation: Option<String>,
    pub location: Option<String>,
    pub faction: Option<String>,
    pub status: Option<String>,
    pub tier: Option<String>,
    pub era: Option<String>,
    pub tags: Option<String>,
    pub search: Option<String>,
}

fn items(raw: &Option<String>) -> impl Iterator<Item = &str> {
    raw.as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn single(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl CodexQuery {
    pub fn into_filter(self) -> Result<CodexFilter, ApiError> {
        let entry_type = single(self.entry_type.clone())
            .map(|t| t.parse::<CodexKind>())
            .transpose()
            .map_err(ApiError::bad_request)?;
        let character_status = items(&self.status)
            .map(str::parse::<CharacterStatus>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ApiError::bad_request)?;
        let importance_tier = items(&self.tier)
            .map(|t| {
                t.parse::<u8>()
                    .map_err(|_| ApiError::bad_request(format!("invalid importance tier: {t}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let character_tags = items(&self.tags).map(str::to_string).collect();

        Ok(CodexFilter {
            entry_type,
            simulation_id: single(self.simulation).map(UniverseId::new),
            location_id: single(self.location).map(LocationId::new),
            faction_id: single(self.faction).map(EntryId::new),
            character_status,
            importance_tier,
            timeline_era: single(self.era),
            character_tags,
            search: single(self.search),
        })
    }
}

fn records<'a>(entries: impl IntoIterator<Item = &'a CodexEntry>) -> Vec<CodexRecord> {
    entries.into_iter().cloned().map(CodexRecord::from).collect()
}

pub async fn list_codex(
    State(state): State<AppState>,
    Query(query): Query<CodexQuery>,
) -> Result<Response, ApiError> {
    let filter = query.into_filter()?;
    let entries = state.codex_entries().await?;
    // Only the simulation filter needs the map.
    let map = if filter.simulation_id.is_some() {
        state.load().await.map
    } else {
        MapData::default()
    };
    let matched = filter_entries(&entries, &filter, &map);
    Ok((StatusCode::OK, Json(records(matched))).into_response())
}

pub async fn codex_timeline(State(state): State<AppState>) -> Result<Response, ApiError> {
    let entries = state.codex_entries().await?;
    let eras: Vec<_> = timeline(public_entries(&entries))
        .into_iter()
        .map(|group| json!({ "era": group.era, "events": records(group.events) }))
        .collect();
    Ok((StatusCode::OK, Json(eras)).into_response())
}

pub async fn get_codex_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Response, ApiError> {
    let (records_result, relationships) = futures_util::future::join(
        state.codex_entries(),
        state.backend.fetch_relationships(),
    )
    .await;
    let entries = records_result?;
    let id = EntryId::new(entry_id);
    let Some(entry) = find_entry(&entries, &id) else {
        return Err(ApiError::not_found("Codex entry not found"));
    };
    let related = related_entries(&id, &relationships?, &entries);
    let map = state.load().await.map;
    let locations = resolve_locations(entry, &map);

    Ok((
        StatusCode::OK,
        Json(json!({
            "entry": CodexRecord::from(entry.clone()),
            "related": related,
            "locations": locations,
        })),
    )
        .into_response())
}

pub async fn location_codex(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> Result<Response, ApiError> {
    let entries = state.codex_entries().await?;
    let at = entries_at_location(&entries, &LocationId::new(location_id));
    Ok((StatusCode::OK, Json(records(at))).into_response())
}
