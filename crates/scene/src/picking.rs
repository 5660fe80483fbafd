use foundation::bounds::{Aabb2, CANVAS_HEIGHT, CANVAS_WIDTH};
use foundation::math::{Vec2, ViewTransform};

use crate::ids::{LocationId, UniverseId};
use crate::model::{Location, Universe};

/// Side of the square hit box around a universe marker (logical units).
pub const UNIVERSE_MARKER_SIZE: f64 = 140.0;
/// Side of the square hit box around a location marker (logical units).
pub const LOCATION_MARKER_SIZE: f64 = 110.0;

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerHit {
    Universe(UniverseId),
    Location {
        universe: UniverseId,
        location: LocationId,
    },
}

/// A clickable marker in logical space.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub hit: MarkerHit,
    pub bounds: Aabb2,
}

impl Marker {
    pub fn universe(u: &Universe) -> Self {
        Self {
            hit: MarkerHit::Universe(u.id.clone()),
            bounds: Aabb2::centered(u.position(), UNIVERSE_MARKER_SIZE, UNIVERSE_MARKER_SIZE),
        }
    }

    pub fn location(universe: &UniverseId, l: &Location) -> Self {
        Self {
            hit: MarkerHit::Location {
                universe: universe.clone(),
                location: l.id.clone(),
            },
            bounds: Aabb2::centered(l.position(), LOCATION_MARKER_SIZE, LOCATION_MARKER_SIZE),
        }
    }
}

/// Hit-tests markers at a logical point.
///
/// Markers are given in paint order; the last one containing the point is on
/// top and wins.
pub fn pick_marker<'a>(markers: &'a [Marker], logical: Vec2) -> Option<&'a MarkerHit> {
    markers
        .iter()
        .rev()
        .find(|m| m.bounds.contains(logical))
        .map(|m| &m.hit)
}

/// The on-page element size hosting the map, for `xMidYMid meet` mapping of
/// client pixels onto the `0 0 2000 1600` viewBox.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width_px: f64,
    pub height_px: f64,
}

impl Viewport {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self {
            width_px,
            height_px,
        }
    }

    /// Uniform pixels-per-viewBox-unit scale.
    pub fn scale(&self) -> f64 {
        (self.width_px / CANVAS_WIDTH).min(self.height_px / CANVAS_HEIGHT)
    }

    /// Client pixel → viewBox (screen) coordinates. `None` for a degenerate
    /// element size.
    pub fn to_view(&self, px: Vec2) -> Option<Vec2> {
        let s = self.scale();
        if !(s.is_finite() && s > 0.0) {
            return None;
        }
        let offset = Vec2::new(
            (self.width_px - CANVAS_WIDTH * s) / 2.0,
            (self.height_px - CANVAS_HEIGHT * s) / 2.0,
        );
        Some((px - offset).scale(1.0 / s))
    }

    pub fn to_client(&self, view: Vec2) -> Vec2 {
        let s = self.scale();
        let offset = Vec2::new(
            (self.width_px - CANVAS_WIDTH * s) / 2.0,
            (self.height_px - CANVAS_HEIGHT * s) / 2.0,
        );
        view.scale(s) + offset
    }
}

/// Result of routing a click through the picker.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Marker(MarkerHit),
    /// Picking was active and the click reported this logical point.
    Picked(Vec2),
    Background,
}

type PickCallback = Box<dyn FnMut(Vec2) + Send>;

/// Click-to-coordinate mode used by the editor to place entities.
///
/// - At most one callback; `enable` replaces it.
/// - At most one pending coordinate; each pick overwrites it.
/// - Marker hits always take precedence over picks.
#[derive(Default)]
pub struct CoordinatePicker {
    callback: Option<PickCallback>,
    pending: Option<Vec2>,
}

impl std::fmt::Debug for CoordinatePicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatePicker")
            .field("active", &self.is_active())
            .field("pending", &self.pending)
            .finish()
    }
}

impl CoordinatePicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self, callback: impl FnMut(Vec2) + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn disable(&mut self) {
        self.callback = None;
        self.pending = None;
    }

    pub fn is_active(&self) -> bool {
        self.callback.is_some()
    }

    pub fn pending(&self) -> Option<Vec2> {
        self.pending
    }

    pub fn take_pending(&mut self) -> Option<Vec2> {
        self.pending.take()
    }

    /// Routes a click at screen point `screen` under `transform`.
    pub fn handle_click(
        &mut self,
        screen: Vec2,
        transform: &ViewTransform,
        hit: Option<MarkerHit>,
    ) -> ClickOutcome {
        if let Some(hit) = hit {
            return ClickOutcome::Marker(hit);
        }
        let Some(callback) = self.callback.as_mut() else {
            return ClickOutcome::Background;
        };
        let logical = transform.invert(screen);
        self.pending = Some(logical);
        callback(logical);
        ClickOutcome::Picked(logical)
    }
}
