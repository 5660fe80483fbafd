//! Admin edits over the map snapshot.
//!
//! Edits work on an owned [`MapData`]; the admin console clones the live
//! snapshot, edits, and hands the result back (to the view and to the save
//! endpoint) in one piece.

use foundation::math::Vec2;

use crate::ids::{LocationId, UniverseId};
use crate::model::{Location, LocationKind, MapData, Universe};

pub const NEW_UNIVERSE_NAME: &str = "New Universe";
pub const NEW_UNIVERSE_DESCRIPTION: &str = "A newly discovered realm.";
pub const NEW_UNIVERSE_COLOR: &str = "#6366f1";
pub const NEW_UNIVERSE_IMAGE: &str = "/images/multiversal-bg.png";
pub const NEW_UNIVERSE_POSITION: Vec2 = Vec2 { x: 500.0, y: 400.0 };
pub const NEW_LOCATION_NAME: &str = "New Location";
pub const NEW_LOCATION_DESCRIPTION: &str = "Description";

#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    UnknownUniverse(UniverseId),
    UnknownLocation(LocationId),
    NonFiniteCoordinate,
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::UnknownUniverse(id) => write!(f, "unknown universe: {id}"),
            EditError::UnknownLocation(id) => write!(f, "unknown location: {id}"),
            EditError::NonFiniteCoordinate => write!(f, "picked coordinate is not finite"),
        }
    }
}

impl std::error::Error for EditError {}

/// Field updates for a universe; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniversePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub thumb_url: Option<String>,
    pub background_url: Option<String>,
    pub image_url: Option<String>,
}

/// Field updates for a location; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<LocationKind>,
    pub thumb_url: Option<String>,
}

/// Form input for a new location. Blank fields get defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationDraft {
    pub name: String,
    pub description: String,
    pub kind: Option<LocationKind>,
    pub thumb_url: String,
}

fn or_default(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn apply<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn rounded(picked: Vec2) -> Result<Vec2, EditError> {
    if !picked.is_finite() {
        return Err(EditError::NonFiniteCoordinate);
    }
    Ok(picked.round())
}

impl MapData {
    fn unique_id(&self, prefix: &str, now_ms: u64, taken: impl Fn(&str) -> bool) -> String {
        let base = format!("{prefix}-{now_ms}");
        if !taken(&base) {
            return base;
        }
        (2u32..)
            .map(|n| format!("{base}-{n}"))
            .find(|id| !taken(id))
            .unwrap_or(base)
    }

    /// Appends a placeholder universe with id `univ-<now_ms>`.
    pub fn add_universe(&mut self, now_ms: u64) -> UniverseId {
        let id = UniverseId::new(self.unique_id("univ", now_ms, |id| {
            self.universe(&UniverseId::new(id)).is_some()
        }));
        self.universes.push(Universe {
            id: id.clone(),
            name: NEW_UNIVERSE_NAME.to_string(),
            description: NEW_UNIVERSE_DESCRIPTION.to_string(),
            color: NEW_UNIVERSE_COLOR.to_string(),
            cx: NEW_UNIVERSE_POSITION.x,
            cy: NEW_UNIVERSE_POSITION.y,
            thumb_url: NEW_UNIVERSE_IMAGE.to_string(),
            background_url: NEW_UNIVERSE_IMAGE.to_string(),
            image_url: NEW_UNIVERSE_IMAGE.to_string(),
            locations: Vec::new(),
            sort_order: self.universes.len() as i32,
        });
        id
    }

    pub fn update_universe(&mut self, id: &UniverseId, patch: UniversePatch) -> Result<(), EditError> {
        let u = self
            .universe_mut(id)
            .ok_or_else(|| EditError::UnknownUniverse(id.clone()))?;
        apply(&mut u.name, patch.name);
        apply(&mut u.description, patch.description);
        apply(&mut u.color, patch.color);
        apply(&mut u.thumb_url, patch.thumb_url);
        apply(&mut u.background_url, patch.background_url);
        apply(&mut u.image_url, patch.image_url);
        Ok(())
    }

    /// Moves a universe to a picked coordinate, rounded to whole units.
    /// Its locations keep their absolute positions.
    pub fn relocate_universe(&mut self, id: &UniverseId, picked: Vec2) -> Result<(), EditError> {
        let p = rounded(picked)?;
        let u = self
            .universe_mut(id)
            .ok_or_else(|| EditError::UnknownUniverse(id.clone()))?;
        u.cx = p.x;
        u.cy = p.y;
        Ok(())
    }

    /// Removes a universe together with its locations.
    pub fn remove_universe(&mut self, id: &UniverseId) -> Result<Universe, EditError> {
        let pos = self
            .universes
            .iter()
            .position(|u| &u.id == id)
            .ok_or_else(|| EditError::UnknownUniverse(id.clone()))?;
        Ok(self.universes.remove(pos))
    }

    /// Adds a location at a picked coordinate with id `loc-<now_ms>`.
    ///
    /// Without its own thumbnail a location borrows the universe's.
    pub fn add_location(
        &mut self,
        universe: &UniverseId,
        draft: LocationDraft,
        picked: Vec2,
        now_ms: u64,
    ) -> Result<LocationId, EditError> {
        let p = rounded(picked)?;
        if self.universe(universe).is_none() {
            return Err(EditError::UnknownUniverse(universe.clone()));
        }
        let id = LocationId::new(self.unique_id("loc", now_ms, |id| {
            self.find_location(&LocationId::new(id)).is_some()
        }));
        let u = self
            .universe_mut(universe)
            .ok_or_else(|| EditError::UnknownUniverse(universe.clone()))?;
        let thumb_url = if draft.thumb_url.trim().is_empty() {
            u.thumb_url.clone()
        } else {
            draft.thumb_url
        };
        u.locations.push(Location {
            id: id.clone(),
            name: or_default(draft.name, NEW_LOCATION_NAME),
            description: or_default(draft.description, NEW_LOCATION_DESCRIPTION),
            cx: p.x,
            cy: p.y,
            kind: draft.kind.unwrap_or_default(),
            thumb_url,
        });
        Ok(id)
    }

    pub fn update_location(&mut self, id: &LocationId, patch: LocationPatch) -> Result<(), EditError> {
        let l = self.location_mut(id)?;
        apply(&mut l.name, patch.name);
        apply(&mut l.description, patch.description);
        apply(&mut l.kind, patch.kind);
        apply(&mut l.thumb_url, patch.thumb_url);
        Ok(())
    }

    pub fn relocate_location(&mut self, id: &LocationId, picked: Vec2) -> Result<(), EditError> {
        let p = rounded(picked)?;
        let l = self.location_mut(id)?;
        l.cx = p.x;
        l.cy = p.y;
        Ok(())
    }

    pub fn remove_location(&mut self, id: &LocationId) -> Result<Location, EditError> {
        for u in &mut self.universes {
            if let Some(pos) = u.locations.iter().position(|l| &l.id == id) {
                return Ok(u.locations.remove(pos));
            }
        }
        Err(EditError::UnknownLocation(id.clone()))
    }

    /// Sets every universe's `sort_order` to its list position.
    pub fn renumber(&mut self) {
        for (i, u) in self.universes.iter_mut().enumerate() {
            u.sort_order = i as i32;
        }
    }

    fn location_mut(&mut self, id: &LocationId) -> Result<&mut Location, EditError> {
        self.universes
            .iter_mut()
            .find_map(|u| u.location_mut(id))
            .ok_or_else(|| EditError::UnknownLocation(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_map;

    #[test]
    fn adds_placeholder_universe() {
        let mut map = default_map();
        let id = map.add_universe(1_700_000_000_000);
        assert_eq!(id.as_str(), "univ-1700000000000");
        let u = map.universe(&id).unwrap();
        assert_eq!(u.name, NEW_UNIVERSE_NAME);
        assert_eq!(u.color, NEW_UNIVERSE_COLOR);
        assert_eq!(u.position(), NEW_UNIVERSE_POSITION);
        assert_eq!(u.sort_order, 4);

        let again = map.add_universe(1_700_000_000_000);
        assert_eq!(again.as_str(), "univ-1700000000000-2");
    }

    #[test]
    fn relocation_rounds_picked_point() {
        let mut map = default_map();
        let id = UniverseId::new("cryo-wastes");
        map.relocate_universe(&id, Vec2::new(321.4, 99.6)).unwrap();
        assert_eq!(map.universe(&id).unwrap().position(), Vec2::new(321.0, 100.0));

        let loc = LocationId::new("ice-citadel");
        map.relocate_location(&loc, Vec2::new(10.5, -3.2)).unwrap();
        assert_eq!(map.find_location(&loc).unwrap().1.position(), Vec2::new(11.0, -3.0));

        assert_eq!(
            map.relocate_location(&loc, Vec2::new(f64::NAN, 0.0)),
            Err(EditError::NonFiniteCoordinate)
        );
    }

    #[test]
    fn new_location_fills_defaults_and_inherits_thumb() {
        let mut map = default_map();
        let u = UniverseId::new("magma-forge");
        let id = map
            .add_location(&u, LocationDraft::default(), Vec2::new(700.2, 640.7), 42)
            .unwrap();
        let (owner, l) = map.find_location(&id).unwrap();
        assert_eq!(owner.id, u);
        assert_eq!(l.id.as_str(), "loc-42");
        assert_eq!(l.name, NEW_LOCATION_NAME);
        assert_eq!(l.description, NEW_LOCATION_DESCRIPTION);
        assert_eq!(l.kind, LocationKind::Station);
        assert_eq!(l.thumb_url, "/images/magma-forge-thumb.png");
        assert_eq!(l.position(), Vec2::new(700.0, 641.0));
    }

    #[test]
    fn add_location_to_unknown_universe_fails() {
        let mut map = default_map();
        let err = map
            .add_location(&UniverseId::new("gone"), LocationDraft::default(), Vec2::ZERO, 1)
            .unwrap_err();
        assert_eq!(err, EditError::UnknownUniverse(UniverseId::new("gone")));
    }

    #[test]
    fn patches_only_touch_given_fields() {
        let mut map = default_map();
        let id = UniverseId::new("void-expanse");
        map.update_universe(
            &id,
            UniversePatch {
                name: Some("The Void".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let u = map.universe(&id).unwrap();
        assert_eq!(u.name, "The Void");
        assert_eq!(u.color, "#8b5cf6");

        let loc = LocationId::new("void-eye");
        map.update_location(
            &loc,
            LocationPatch {
                kind: Some(LocationKind::Planet),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(map.find_location(&loc).unwrap().1.kind, LocationKind::Planet);
    }

    #[test]
    fn removing_universe_cascades() {
        let mut map = default_map();
        let removed = map.remove_universe(&UniverseId::new("nebula-prime")).unwrap();
        assert_eq!(removed.locations.len(), 3);
        assert!(map.find_location(&LocationId::new("prime-core")).is_none());
        map.renumber();
        let orders: Vec<_> = map.universes.iter().map(|u| u.sort_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn removing_location() {
        let mut map = default_map();
        let l = map.remove_location(&LocationId::new("frozen-wreck")).unwrap();
        assert_eq!(l.name, "Frozen Wreck");
        assert_eq!(
            map.remove_location(&LocationId::new("frozen-wreck")),
            Err(EditError::UnknownLocation(LocationId::new("frozen-wreck")))
        );
    }
}
