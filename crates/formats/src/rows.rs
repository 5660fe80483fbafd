//! Storage-shape rows of the hosted backend and their client-shape mapping.

use std::collections::HashMap;

use scene::ids::{LocationId, UniverseId};
use scene::model::{GlobalConfig, Location, LocationKind, MapData, Universe};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// `lore_config.config_key` of the multiverse background setting.
pub const MULTIVERSE_BACKGROUND_KEY: &str = "multiverse_background";

/// Write-side universe, ready for `upsert_lore_region`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionUpsert {
    pub region_id: String,
    pub name: String,
    pub description: String,
    pub color: String,
    pub cx: f64,
    pub cy: f64,
    pub thumb_url: String,
    pub background_url: String,
    pub image_url: String,
    pub sort_order: i32,
    #[serde(default)]
    pub locations: Vec<LocationUpsert>,
}

/// Write-side location, ready for `upsert_lore_location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpsert {
    pub location_id: String,
    pub name: String,
    pub description: String,
    pub cx: f64,
    pub cy: f64,
    pub location_type: LocationKind,
    pub thumb_url: String,
    pub sort_order: i32,
}

impl RegionUpsert {
    pub fn from_universe(u: &Universe) -> Self {
        Self {
            region_id: u.id.to_string(),
            name: u.name.clone(),
            description: u.description.clone(),
            color: u.color.clone(),
            cx: u.cx,
            cy: u.cy,
            thumb_url: u.thumb_url.clone(),
            background_url: u.background_url.clone(),
            image_url: u.image_url.clone(),
            sort_order: u.sort_order,
            locations: u
                .locations
                .iter()
                .enumerate()
                .map(|(i, l)| LocationUpsert::from_location(l, i as i32))
                .collect(),
        }
    }

    /// Parameters of the `upsert_lore_region` procedure.
    pub fn rpc_params(&self) -> Value {
        json!({
            "p_region_id": self.region_id,
            "p_name": self.name,
            "p_description": self.description,
            "p_color": self.color,
            "p_cx": self.cx,
            "p_cy": self.cy,
            "p_thumb_url": self.thumb_url,
            "p_background_url": self.background_url,
            "p_image_url": self.image_url,
            "p_sort_order": self.sort_order,
        })
    }

    pub fn to_universe(&self) -> Universe {
        Universe {
            id: UniverseId::new(self.region_id.clone()),
            name: self.name.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            cx: self.cx,
            cy: self.cy,
            thumb_url: self.thumb_url.clone(),
            background_url: self.background_url.clone(),
            image_url: self.image_url.clone(),
            locations: self.locations.iter().map(LocationUpsert::to_location).collect(),
            sort_order: self.sort_order,
        }
    }
}

impl LocationUpsert {
    pub fn from_location(l: &Location, sort_order: i32) -> Self {
        Self {
            location_id: l.id.to_string(),
            name: l.name.clone(),
            description: l.description.clone(),
            cx: l.cx,
            cy: l.cy,
            location_type: l.kind,
            thumb_url: l.thumb_url.clone(),
            sort_order,
        }
    }

    /// Parameters of the `upsert_lore_location` procedure. `region_id` is the
    /// owning region's logical id.
    pub fn rpc_params(&self, region_id: &str) -> Value {
        json!({
            "p_location_id": self.location_id,
            "p_region_id": region_id,
            "p_name": self.name,
            "p_description": self.description,
            "p_cx": self.cx,
            "p_cy": self.cy,
            "p_location_type": self.location_type.as_str(),
            "p_thumb_url": self.thumb_url,
            "p_sort_order": self.sort_order,
        })
    }

    pub fn to_location(&self) -> Location {
        Location {
            id: LocationId::new(self.location_id.clone()),
            name: self.name.clone(),
            description: self.description.clone(),
            cx: self.cx,
            cy: self.cy,
            kind: self.location_type,
            thumb_url: self.thumb_url.clone(),
        }
    }
}

pub fn regions_from_map(map: &MapData) -> Vec<RegionUpsert> {
    map.universes.iter().map(RegionUpsert::from_universe).collect()
}

/// One `lore_regions` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRow {
    /// Storage id (uuid).
    pub id: String,
    pub region_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub color: String,
    pub cx: f64,
    pub cy: f64,
    #[serde(default)]
    pub thumb_url: String,
    #[serde(default)]
    pub background_url: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// One `lore_locations` row. `region_id` holds the owning region's storage id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    pub id: String,
    pub location_id: String,
    pub region_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cx: f64,
    pub cy: f64,
    #[serde(default)]
    pub location_type: LocationKind,
    #[serde(default)]
    pub thumb_url: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// One `lore_config` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRow {
    #[serde(default)]
    pub id: Option<String>,
    pub config_key: String,
    pub config_value: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn active() -> bool {
    true
}

impl ConfigRow {
    /// Reads the background URL out of a `multiverse_background` row.
    pub fn global_config(&self) -> Option<GlobalConfig> {
        if self.config_key != MULTIVERSE_BACKGROUND_KEY {
            return None;
        }
        self.config_value
            .get("multiverseBackgroundUrl")
            .and_then(Value::as_str)
            .map(|url| GlobalConfig {
                multiverse_background_url: url.to_string(),
            })
    }

    pub fn config_value(config: &GlobalConfig) -> Value {
        json!({ "multiverseBackgroundUrl": config.multiverse_background_url })
    }

    /// Parameters of the `update_lore_config` procedure.
    pub fn rpc_params(config: &GlobalConfig) -> Value {
        json!({
            "p_config_key": MULTIVERSE_BACKGROUND_KEY,
            "p_config_value": Self::config_value(config),
        })
    }
}

/// Joins region and location rows into the client map.
///
/// Inactive rows are skipped; universes and their locations are ordered by
/// `sort_order`. Locations whose region is missing or inactive are dropped.
pub fn map_from_rows(regions: Vec<RegionRow>, locations: Vec<LocationRow>) -> MapData {
    let mut by_region: HashMap<String, Vec<LocationRow>> = HashMap::new();
    for l in locations.into_iter().filter(|l| l.is_active) {
        by_region.entry(l.region_id.clone()).or_default().push(l);
    }

    let mut universes: Vec<Universe> = regions
        .into_iter()
        .filter(|r| r.is_active)
        .map(|r| {
            let mut rows = by_region.remove(&r.id).unwrap_or_default();
            rows.sort_by_key(|l| l.sort_order);
            Universe {
                id: UniverseId::new(r.region_id),
                name: r.name,
                description: r.description,
                color: r.color,
                cx: r.cx,
                cy: r.cy,
                thumb_url: r.thumb_url,
                background_url: r.background_url,
                image_url: r.image_url,
                locations: rows
                    .into_iter()
                    .map(|l| Location {
                        id: LocationId::new(l.location_id),
                        name: l.name,
                        description: l.description,
                        cx: l.cx,
                        cy: l.cy,
                        kind: l.location_type,
                        thumb_url: l.thumb_url,
                    })
                    .collect(),
                sort_order: r.sort_order,
            }
        })
        .collect();
    universes.sort_by_key(|u| u.sort_order);
    MapData::new(universes)
}
