use crate::ids::{LocationId, UniverseId};
use crate::model::{DEFAULT_BACKGROUND_URL, GlobalConfig, Location, MapData, Universe};
use crate::picking::Marker;

/// Which part of the map has focus.
///
/// Holds ids only; entities are looked up in the current snapshot on every
/// [`Navigation::resolve`], so a focus that outlived its data degrades instead
/// of dangling.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Overview,
    Universe(UniverseId),
    Location {
        universe: UniverseId,
        location: LocationId,
    },
}

impl Focus {
    pub fn universe(&self) -> Option<&UniverseId> {
        match self {
            Focus::Overview => None,
            Focus::Universe(u) | Focus::Location { universe: u, .. } => Some(u),
        }
    }

    pub fn location(&self) -> Option<&LocationId> {
        match self {
            Focus::Location { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// Where the back control leads from the current focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackTarget {
    /// Close the open location, returning to its universe.
    Universe(UniverseId),
    Overview,
}

/// Selection state machine: Overview → Universe → Location → Universe → Overview.
///
/// Every accepted transition bumps [`Navigation::generation`]; work scheduled
/// against an older generation is stale.
#[derive(Debug, Clone, Default)]
pub struct Navigation {
    focus: Focus,
    generation: u64,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Overview → Universe. Returns `false` if not in overview or `id` is unknown.
    pub fn enter_universe(&mut self, data: &MapData, id: &UniverseId) -> bool {
        if self.focus != Focus::Overview || data.universe(id).is_none() {
            return false;
        }
        self.set(Focus::Universe(id.clone()));
        true
    }

    /// Universe → Location, or switches between locations of the focused
    /// universe. Locations of other universes are refused.
    pub fn open_location(&mut self, data: &MapData, id: &LocationId) -> bool {
        let Some(universe) = self.focus.universe().cloned() else {
            return false;
        };
        let owned = data
            .universe(&universe)
            .is_some_and(|u| u.location(id).is_some());
        if !owned {
            return false;
        }
        self.set(Focus::Location {
            universe,
            location: id.clone(),
        });
        true
    }

    /// Location → Universe. Returns the universe to re-centre on.
    pub fn close_location(&mut self) -> Option<UniverseId> {
        let Focus::Location { universe, .. } = &self.focus else {
            return None;
        };
        let universe = universe.clone();
        self.set(Focus::Universe(universe.clone()));
        Some(universe)
    }

    /// Any focus → Overview. Returns `false` if already there.
    pub fn back_to_overview(&mut self) -> bool {
        if self.focus == Focus::Overview {
            return false;
        }
        self.set(Focus::Overview);
        true
    }

    /// Drops focus on entities missing from `data`: a stale universe falls back
    /// to the overview, a stale location to its universe.
    ///
    /// Returns `true` if the focus changed.
    pub fn reconcile(&mut self, data: &MapData) -> bool {
        let next = match &self.focus {
            Focus::Overview => return false,
            Focus::Universe(u) => match data.universe(u) {
                Some(_) => return false,
                None => Focus::Overview,
            },
            Focus::Location { universe, location } => match data.universe(universe) {
                None => Focus::Overview,
                Some(u) if u.location(location).is_none() => Focus::Universe(universe.clone()),
                Some(_) => return false,
            },
        };
        self.set(next);
        true
    }

    /// Looks the focus up in `data`. Never fails; stale ids resolve as if the
    /// missing entity were not selected.
    pub fn resolve<'a>(&self, data: &'a MapData) -> Resolved<'a> {
        let universe = self.focus.universe().and_then(|id| data.universe(id));
        let location = match (universe, self.focus.location()) {
            (Some(u), Some(id)) => u.location(id),
            _ => None,
        };
        Resolved {
            data,
            universe,
            location,
        }
    }

    fn set(&mut self, focus: Focus) {
        self.focus = focus;
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Background media for the current focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Background {
    pub url: String,
    pub is_video: bool,
}

impl Background {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let is_video = is_video_url(&url);
        Self { url, is_video }
    }
}

pub fn is_video_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    [".mp4", ".webm", ".mov"].iter().any(|ext| path.ends_with(ext))
}

/// The focus resolved against one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    data: &'a MapData,
    pub universe: Option<&'a Universe>,
    pub location: Option<&'a Location>,
}

impl<'a> Resolved<'a> {
    pub fn focus(&self) -> Focus {
        match (self.universe, self.location) {
            (None, _) => Focus::Overview,
            (Some(u), None) => Focus::Universe(u.id.clone()),
            (Some(u), Some(l)) => Focus::Location {
                universe: u.id.clone(),
                location: l.id.clone(),
            },
        }
    }

    /// Universe markers render in the overview only.
    pub fn visible_universes(&self) -> &'a [Universe] {
        match self.universe {
            None => &self.data.universes,
            Some(_) => &[],
        }
    }

    /// Only the focused universe's locations render.
    pub fn visible_locations(&self) -> &'a [Location] {
        match self.universe {
            Some(u) => &u.locations,
            None => &[],
        }
    }

    /// Clickable markers in paint order.
    pub fn markers(&self) -> Vec<Marker> {
        match self.universe {
            None => self.data.universes.iter().map(Marker::universe).collect(),
            Some(u) => u
                .locations
                .iter()
                .map(|l| Marker::location(&u.id, l))
                .collect(),
        }
    }

    pub fn background(&self, config: &GlobalConfig) -> Background {
        let url = self
            .universe
            .map(|u| u.background_url.as_str())
            .filter(|url| !url.is_empty())
            .or(Some(config.multiverse_background_url.as_str()).filter(|url| !url.is_empty()))
            .unwrap_or(DEFAULT_BACKGROUND_URL);
        Background::new(url)
    }

    pub fn back_target(&self) -> Option<BackTarget> {
        match (self.universe, self.location) {
            (None, _) => None,
            (Some(u), Some(_)) => Some(BackTarget::Universe(u.id.clone())),
            (Some(_), None) => Some(BackTarget::Overview),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_map;
    use crate::picking::MarkerHit;

    fn uid(s: &str) -> UniverseId {
        UniverseId::new(s)
    }

    fn lid(s: &str) -> LocationId {
        LocationId::new(s)
    }

    #[test]
    fn walks_the_state_machine() {
        let data = default_map();
        let mut nav = Navigation::new();
        assert_eq!(nav.focus(), &Focus::Overview);

        assert!(nav.enter_universe(&data, &uid("cryo-wastes")));
        assert!(!nav.enter_universe(&data, &uid("magma-forge")));
        assert!(nav.open_location(&data, &lid("ice-citadel")));
        assert!(nav.open_location(&data, &lid("frozen-wreck")));
        assert_eq!(
            nav.focus(),
            &Focus::Location {
                universe: uid("cryo-wastes"),
                location: lid("frozen-wreck")
            }
        );
        assert_eq!(nav.close_location(), Some(uid("cryo-wastes")));
        assert_eq!(nav.close_location(), None);
        assert!(nav.back_to_overview());
        assert!(!nav.back_to_overview());
        assert_eq!(nav.generation(), 5);
    }

    #[test]
    fn refuses_foreign_or_unknown_targets() {
        let data = default_map();
        let mut nav = Navigation::new();
        assert!(!nav.open_location(&data, &lid("ice-citadel")));
        assert!(!nav.enter_universe(&data, &uid("nope")));
        nav.enter_universe(&data, &uid("cryo-wastes"));
        assert!(!nav.open_location(&data, &lid("void-eye")));
        assert_eq!(nav.generation(), 1);
    }

    #[test]
    fn stale_universe_resolves_to_overview() {
        let data = default_map();
        let mut nav = Navigation::new();
        nav.enter_universe(&data, &uid("void-expanse"));
        nav.open_location(&data, &lid("void-eye"));

        let mut next = data.clone();
        next.universes.retain(|u| u.id.as_str() != "void-expanse");

        let resolved = nav.resolve(&next);
        assert!(resolved.universe.is_none());
        assert!(resolved.location.is_none());
        assert_eq!(resolved.focus(), Focus::Overview);
        assert_eq!(resolved.visible_locations().len(), 0);
        assert_eq!(resolved.visible_universes().len(), 3);

        assert!(nav.reconcile(&next));
        assert_eq!(nav.focus(), &Focus::Overview);
        assert!(!nav.reconcile(&next));
    }

    #[test]
    fn stale_location_resolves_to_universe() {
        let data = default_map();
        let mut nav = Navigation::new();
        nav.enter_universe(&data, &uid("magma-forge"));
        nav.open_location(&data, &lid("smelter-complex"));

        let mut next = data.clone();
        next.universe_mut(&uid("magma-forge"))
            .unwrap()
            .locations
            .retain(|l| l.id.as_str() != "smelter-complex");

        assert_eq!(nav.resolve(&next).focus(), Focus::Universe(uid("magma-forge")));
        assert!(nav.reconcile(&next));
        assert_eq!(nav.focus(), &Focus::Universe(uid("magma-forge")));
    }

    #[test]
    fn markers_follow_focus() {
        let data = default_map();
        let mut nav = Navigation::new();
        let overview = nav.resolve(&data).markers();
        assert_eq!(overview.len(), 4);
        assert!(matches!(overview[0].hit, MarkerHit::Universe(_)));

        nav.enter_universe(&data, &uid("nebula-prime"));
        let inside = nav.resolve(&data).markers();
        assert_eq!(inside.len(), 3);
        assert_eq!(
            inside[2].hit,
            MarkerHit::Location {
                universe: uid("nebula-prime"),
                location: lid("ancient-shard")
            }
        );
    }

    #[test]
    fn background_prefers_focused_universe() {
        let mut data = default_map();
        let config = GlobalConfig {
            multiverse_background_url: "/videos/space.webm".to_string(),
        };
        let mut nav = Navigation::new();

        let bg = nav.resolve(&data).background(&config);
        assert_eq!(bg, Background::new("/videos/space.webm"));
        assert!(bg.is_video);

        nav.enter_universe(&data, &uid("cryo-wastes"));
        let bg = nav.resolve(&data).background(&config);
        assert_eq!(bg.url, "/images/cryo-wastes.png");
        assert!(!bg.is_video);

        data.universe_mut(&uid("cryo-wastes")).unwrap().background_url.clear();
        let empty = GlobalConfig {
            multiverse_background_url: String::new(),
        };
        assert_eq!(nav.resolve(&data).background(&empty).url, DEFAULT_BACKGROUND_URL);
    }

    #[test]
    fn video_detection_ignores_case_and_query() {
        assert!(is_video_url("/a/B.MOV"));
        assert!(is_video_url("/a/b.mp4?v=2"));
        assert!(!is_video_url("/a/b.png"));
    }

    #[test]
    fn back_target_per_focus() {
        let data = default_map();
        let mut nav = Navigation::new();
        assert_eq!(nav.resolve(&data).back_target(), None);
        nav.enter_universe(&data, &uid("cryo-wastes"));
        assert_eq!(nav.resolve(&data).back_target(), Some(BackTarget::Overview));
        nav.open_location(&data, &lid("ice-citadel"));
        assert_eq!(
            nav.resolve(&data).back_target(),
            Some(BackTarget::Universe(uid("cryo-wastes")))
        );
    }
}
