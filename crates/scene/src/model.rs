//! Map entities in the logical coordinate space.
//!
//! The serde shape of these types is the client shape: camelCase field names,
//! with the storage-style snake_case names accepted as aliases so payloads
//! produced by either side deserialize.

use std::collections::HashSet;

use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::ids::{LocationId, UniverseId};

/// Positions further than this outside the canvas are reported as suspicious.
pub const CANVAS_MARGIN: f64 = 500.0;

/// Background shown when no universe is entered and no config was loaded.
pub const DEFAULT_BACKGROUND_URL: &str = "/videos/Lore%20Background.mp4";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Planet,
    #[default]
    Station,
    Anomaly,
}

impl LocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Planet => "planet",
            LocationKind::Station => "station",
            LocationKind::Anomaly => "anomaly",
        }
    }
}

impl std::str::FromStr for LocationKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planet" => Ok(LocationKind::Planet),
            "station" => Ok(LocationKind::Station),
            "anomaly" => Ok(LocationKind::Anomaly),
            other => Err(ModelError::UnknownLocationKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cx: f64,
    pub cy: f64,
    #[serde(rename = "type", alias = "location_type", default)]
    pub kind: LocationKind,
    #[serde(alias = "thumb_url", default)]
    pub thumb_url: String,
}

impl Location {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.cx, self.cy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Universe {
    pub id: UniverseId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub color: String,
    pub cx: f64,
    pub cy: f64,
    #[serde(alias = "thumb_url", default)]
    pub thumb_url: String,
    #[serde(alias = "background_url", default)]
    pub background_url: String,
    /// Detail image shown in the universe overlay.
    #[serde(alias = "image_url", default)]
    pub image_url: String,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(alias = "sort_order", default)]
    pub sort_order: i32,
}

impl Universe {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.cx, self.cy)
    }

    pub fn location(&self, id: &LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| &l.id == id)
    }

    pub fn location_mut(&mut self, id: &LocationId) -> Option<&mut Location> {
        self.locations.iter_mut().find(|l| &l.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    #[serde(alias = "multiverse_background_url")]
    pub multiverse_background_url: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            multiverse_background_url: DEFAULT_BACKGROUND_URL.to_string(),
        }
    }
}

/// The in-memory universe collection.
///
/// Treated as a snapshot: edits produce a new value that replaces the old one
/// wholesale. Serializes as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapData {
    pub universes: Vec<Universe>,
}

impl MapData {
    pub fn new(universes: Vec<Universe>) -> Self {
        Self { universes }
    }

    pub fn is_empty(&self) -> bool {
        self.universes.is_empty()
    }

    pub fn universe(&self, id: &UniverseId) -> Option<&Universe> {
        self.universes.iter().find(|u| &u.id == id)
    }

    pub fn universe_mut(&mut self, id: &UniverseId) -> Option<&mut Universe> {
        self.universes.iter_mut().find(|u| &u.id == id)
    }

    /// Finds a location anywhere in the map, with its owning universe.
    pub fn find_location(&self, id: &LocationId) -> Option<(&Universe, &Location)> {
        self.universes
            .iter()
            .find_map(|u| u.location(id).map(|l| (u, l)))
    }

    pub fn location_count(&self) -> usize {
        self.universes.iter().map(|u| u.locations.len()).sum()
    }

    /// Orders universes by `sort_order`, keeping list order for ties.
    pub fn sort_by_order(&mut self) {
        self.universes.sort_by_key(|u| u.sort_order);
    }

    /// Reports every data problem without changing anything.
    pub fn issues(&self) -> Vec<ModelIssue> {
        let mut out = Vec::new();
        let near = Aabb2::canvas().expand(CANVAS_MARGIN);
        let mut universe_ids = HashSet::new();
        let mut location_ids = HashSet::new();

        for u in &self.universes {
            if u.id.is_empty() {
                out.push(ModelIssue::EmptyUniverseId);
                continue;
            }
            if !universe_ids.insert(u.id.clone()) {
                out.push(ModelIssue::DuplicateUniverse(u.id.clone()));
                continue;
            }
            if !u.position().is_finite() {
                out.push(ModelIssue::NonFiniteUniverse(u.id.clone()));
                continue;
            }
            if !near.contains(u.position()) {
                out.push(ModelIssue::OffCanvasUniverse(u.id.clone()));
            }

            for l in &u.locations {
                if l.id.is_empty() {
                    out.push(ModelIssue::EmptyLocationId(u.id.clone()));
                    continue;
                }
                if !location_ids.insert(l.id.clone()) {
                    out.push(ModelIssue::DuplicateLocation {
                        universe: u.id.clone(),
                        location: l.id.clone(),
                    });
                    continue;
                }
                if !l.position().is_finite() {
                    out.push(ModelIssue::NonFiniteLocation {
                        universe: u.id.clone(),
                        location: l.id.clone(),
                    });
                    continue;
                }
                if !near.contains(l.position()) {
                    out.push(ModelIssue::OffCanvasLocation {
                        universe: u.id.clone(),
                        location: l.id.clone(),
                    });
                }
            }
        }
        out
    }

    /// Strict check used before writes: any rejecting issue is an error.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self.issues().into_iter().find(ModelIssue::is_rejecting) {
            Some(issue) => Err(ModelError::Invalid(issue)),
            None => Ok(()),
        }
    }

    /// Load-boundary cleanup: drops entities with rejecting issues (empty or
    /// duplicate ids, non-finite coordinates) and returns what was found.
    ///
    /// Off-canvas positions are reported but kept.
    pub fn sanitize(self) -> (MapData, Vec<ModelIssue>) {
        let issues = self.issues();
        let mut universe_ids = HashSet::new();
        let mut location_ids = HashSet::new();

        let universes = self
            .universes
            .into_iter()
            .filter(|u| !u.id.is_empty() && u.position().is_finite())
            .filter(|u| universe_ids.insert(u.id.clone()))
            .map(|mut u| {
                u.locations.retain(|l| {
                    !l.id.is_empty()
                        && l.position().is_finite()
                        && location_ids.insert(l.id.clone())
                });
                u
            })
            .collect();

        (MapData { universes }, issues)
    }
}

/// A problem found while checking map data.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelIssue {
    EmptyUniverseId,
    EmptyLocationId(UniverseId),
    DuplicateUniverse(UniverseId),
    DuplicateLocation {
        universe: UniverseId,
        location: LocationId,
    },
    NonFiniteUniverse(UniverseId),
    NonFiniteLocation {
        universe: UniverseId,
        location: LocationId,
    },
    OffCanvasUniverse(UniverseId),
    OffCanvasLocation {
        universe: UniverseId,
        location: LocationId,
    },
}

impl ModelIssue {
    /// Whether the entity must be dropped (as opposed to merely logged).
    pub fn is_rejecting(&self) -> bool {
        !matches!(
            self,
            ModelIssue::OffCanvasUniverse(_) | ModelIssue::OffCanvasLocation { .. }
        )
    }
}

impl std::fmt::Display for ModelIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelIssue::EmptyUniverseId => write!(f, "universe with empty id"),
            ModelIssue::EmptyLocationId(u) => write!(f, "location with empty id in universe {u}"),
            ModelIssue::DuplicateUniverse(u) => write!(f, "duplicate universe id {u}"),
            ModelIssue::DuplicateLocation { universe, location } => {
                write!(f, "duplicate location id {location} in universe {universe}")
            }
            ModelIssue::NonFiniteUniverse(u) => write!(f, "universe {u} has non-finite coordinates"),
            ModelIssue::NonFiniteLocation { universe, location } => write!(
                f,
                "location {location} in universe {universe} has non-finite coordinates"
            ),
            ModelIssue::OffCanvasUniverse(u) => write!(f, "universe {u} lies far outside the canvas"),
            ModelIssue::OffCanvasLocation { universe, location } => write!(
                f,
                "location {location} in universe {universe} lies far outside the canvas"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    Invalid(ModelIssue),
    UnknownLocationKind(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Invalid(issue) => write!(f, "invalid map data: {issue}"),
            ModelError::UnknownLocationKind(kind) => write!(f, "unknown location type: {kind}"),
        }
    }
}

impl std::error::Error for ModelError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: &str, cx: f64, cy: f64) -> Location {
        Location {
            id: LocationId::new(id),
            name: id.to_string(),
            description: String::new(),
            cx,
            cy,
            kind: LocationKind::Station,
            thumb_url: String::new(),
        }
    }

    fn universe(id: &str, cx: f64, cy: f64, locations: Vec<Location>) -> Universe {
        Universe {
            id: UniverseId::new(id),
            name: id.to_string(),
            description: String::new(),
            color: "#fff".to_string(),
            cx,
            cy,
            thumb_url: String::new(),
            background_url: String::new(),
            image_url: String::new(),
            locations,
            sort_order: 0,
        }
    }

    #[test]
    fn parses_client_shape_with_snake_aliases() {
        let json = r##"[{
            "id": "u1", "name": "Alpha", "color": "#fff", "cx": 10, "cy": 20,
            "thumb_url": "/t.png", "backgroundUrl": "/bg.png",
            "locations": [{ "id": "l1", "name": "Outpost", "cx": 11, "cy": 21, "location_type": "anomaly" }]
        }]"##;
        let data: MapData = serde_json::from_str(json).unwrap();
        let u = &data.universes[0];
        assert_eq!(u.thumb_url, "/t.png");
        assert_eq!(u.background_url, "/bg.png");
        assert_eq!(u.description, "");
        assert_eq!(u.locations[0].kind, LocationKind::Anomaly);
    }

    #[test]
    fn location_kind_defaults_to_station() {
        let l: Location =
            serde_json::from_str(r#"{ "id": "l1", "name": "x", "cx": 1, "cy": 2 }"#).unwrap();
        assert_eq!(l.kind, LocationKind::Station);
        let json = serde_json::to_value(&l).unwrap();
        assert_eq!(json["type"], "station");
        assert_eq!(json["thumbUrl"], "");
    }

    #[test]
    fn finds_locations_across_universes() {
        let data = MapData::new(vec![
            universe("a", 0.0, 0.0, vec![location("a1", 1.0, 1.0)]),
            universe("b", 5.0, 5.0, vec![location("b1", 6.0, 6.0)]),
        ]);
        let (u, l) = data.find_location(&LocationId::new("b1")).unwrap();
        assert_eq!(u.id.as_str(), "b");
        assert_eq!(l.cx, 6.0);
        assert_eq!(data.location_count(), 2);
    }

    #[test]
    fn sanitize_drops_rejected_entities_and_keeps_off_canvas() {
        let data = MapData::new(vec![
            universe("a", 100.0, 100.0, vec![location("x", f64::NAN, 1.0), location("y", 5.0, 5.0)]),
            universe("a", 200.0, 200.0, vec![]),
            universe("far", 9000.0, 100.0, vec![location("y", 1.0, 1.0)]),
            universe("nan", f64::INFINITY, 0.0, vec![]),
        ]);
        let (clean, issues) = data.sanitize();

        let ids: Vec<_> = clean.universes.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "far"]);
        assert_eq!(clean.universes[0].locations.len(), 1);
        assert!(clean.universes[1].locations.is_empty());

        assert!(issues.contains(&ModelIssue::DuplicateUniverse(UniverseId::new("a"))));
        assert!(issues.contains(&ModelIssue::OffCanvasUniverse(UniverseId::new("far"))));
        assert!(issues.contains(&ModelIssue::NonFiniteUniverse(UniverseId::new("nan"))));
    }

    #[test]
    fn validate_ignores_off_canvas_only() {
        let ok = MapData::new(vec![universe("far", -1000.0, 0.0, vec![])]);
        assert!(ok.validate().is_ok());

        let bad = MapData::new(vec![universe("", 0.0, 0.0, vec![])]);
        assert_eq!(
            bad.validate(),
            Err(ModelError::Invalid(ModelIssue::EmptyUniverseId))
        );
    }

    #[test]
    fn sort_by_order_is_stable() {
        let mut a = universe("a", 0.0, 0.0, vec![]);
        a.sort_order = 2;
        let mut b = universe("b", 0.0, 0.0, vec![]);
        b.sort_order = 1;
        let mut c = universe("c", 0.0, 0.0, vec![]);
        c.sort_order = 1;
        let mut data = MapData::new(vec![a, b, c]);
        data.sort_by_order();
        let ids: Vec<_> = data.universes.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }
}
