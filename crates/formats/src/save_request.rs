//! Body of the admin save endpoint: `{ config?, regions: Region[] }` in
//! client shape, mapped to storage-shape upserts.

use scene::model::{GlobalConfig, LocationKind, MapData, ModelError, ModelIssue};
use serde_json::{Map, Value, json};

use crate::rows::{LocationUpsert, RegionUpsert};

pub const INVALID_REGIONS: &str = "Invalid regions data";

#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequestError {
    /// `regions` missing or not a list.
    InvalidRegions,
    InvalidRegion { index: usize, reason: String },
    InvalidLocation {
        region: usize,
        index: usize,
        reason: String,
    },
    /// Entities parse one by one but clash as a whole, e.g. a location id
    /// claimed by two universes.
    Conflict(ModelIssue),
}

impl std::fmt::Display for SaveRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveRequestError::InvalidRegions => f.write_str(INVALID_REGIONS),
            SaveRequestError::InvalidRegion { index, reason } => {
                write!(f, "Invalid region at index {index}: {reason}")
            }
            SaveRequestError::InvalidLocation {
                region,
                index,
                reason,
            } => write!(f, "Invalid location {index} of region {region}: {reason}"),
            SaveRequestError::Conflict(issue) => write!(f, "{INVALID_REGIONS}: {issue}"),
        }
    }
}

impl std::error::Error for SaveRequestError {}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// Present only when the body carried a non-empty background URL.
    pub config: Option<GlobalConfig>,
    pub regions: Vec<RegionUpsert>,
}

/// First non-empty string among `keys`, else `""`.
fn text(obj: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn required_text(obj: &Map<String, Value>, key: &str) -> Result<String, String> {
    match obj.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(format!("missing {key}")),
    }
}

fn coordinate(obj: &Map<String, Value>, key: &str) -> Result<f64, String> {
    obj.get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{key} must be a finite number"))
}

fn sort_order(obj: &Map<String, Value>, fallback: usize) -> i32 {
    ["sortOrder", "sort_order"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_i64))
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(fallback as i32)
}

/// One client-shape location. `fallback_order` stands in for a missing sort order.
pub fn parse_location(value: &Value, fallback_order: usize) -> Result<LocationUpsert, String> {
    let obj = value.as_object().ok_or("not an object")?;
    let kind = text(obj, &["type", "location_type"]);
    let location_type = if kind.is_empty() {
        LocationKind::default()
    } else {
        kind.parse().map_err(|e: scene::model::ModelError| e.to_string())?
    };
    Ok(LocationUpsert {
        location_id: required_text(obj, "id")?,
        name: text(obj, &["name"]),
        description: text(obj, &["description"]),
        cx: coordinate(obj, "cx")?,
        cy: coordinate(obj, "cy")?,
        location_type,
        thumb_url: text(obj, &["thumbUrl", "thumb_url"]),
        sort_order: sort_order(obj, fallback_order),
    })
}

/// One client-shape universe with its nested locations.
pub fn parse_region(value: &Value, index: usize) -> Result<RegionUpsert, SaveRequestError> {
    let invalid = |reason: String| SaveRequestError::InvalidRegion { index, reason };
    let obj = value
        .as_object()
        .ok_or_else(|| invalid("not an object".to_string()))?;

    let locations = match obj.get("locations") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, l)| {
                parse_location(l, i).map_err(|reason| SaveRequestError::InvalidLocation {
                    region: index,
                    index: i,
                    reason,
                })
            })
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(invalid("locations must be a list".to_string())),
    };

    Ok(RegionUpsert {
        region_id: required_text(obj, "id").map_err(invalid)?,
        name: text(obj, &["name"]),
        description: text(obj, &["description"]),
        color: text(obj, &["color"]),
        cx: coordinate(obj, "cx").map_err(invalid)?,
        cy: coordinate(obj, "cy").map_err(invalid)?,
        thumb_url: text(obj, &["thumbUrl", "thumb_url"]),
        background_url: text(obj, &["backgroundUrl", "background_url"]),
        image_url: text(obj, &["imageUrl", "image_url"]),
        sort_order: sort_order(obj, index),
        locations,
    })
}

impl SaveRequest {
    /// Validates and maps a request body. Nothing here touches storage, so a
    /// rejected body is never partially persisted.
    pub fn parse(body: &Value) -> Result<Self, SaveRequestError> {
        let req = Self::parse_entities(body)?;
        if let Err(ModelError::Invalid(issue)) = req.to_map().validate() {
            return Err(SaveRequestError::Conflict(issue));
        }
        Ok(req)
    }

    /// Per-entity checks only; ids may still clash across the request.
    pub(crate) fn parse_entities(body: &Value) -> Result<Self, SaveRequestError> {
        let Some(items) = body.get("regions").and_then(Value::as_array) else {
            return Err(SaveRequestError::InvalidRegions);
        };
        let regions = items
            .iter()
            .enumerate()
            .map(|(i, r)| parse_region(r, i))
            .collect::<Result<Vec<_>, _>>()?;

        let config = body
            .get("config")
            .and_then(|c| c.get("multiverseBackgroundUrl"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(|url| GlobalConfig {
                multiverse_background_url: url.to_string(),
            });

        Ok(Self { config, regions })
    }

    /// The client-shape body for `map` and `config`, as the admin console posts it.
    pub fn client_body(map: &MapData, config: Option<&GlobalConfig>) -> Value {
        let mut body = json!({ "regions": map });
        if let Some(config) = config {
            body["config"] = json!(config);
        }
        body
    }

    pub fn to_map(&self) -> MapData {
        MapData::new(self.regions.iter().map(RegionUpsert::to_universe).collect())
    }
}
