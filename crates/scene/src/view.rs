//! The map view: data snapshot, navigation, camera and picking wired together.
//!
//! Hosts feed input (`click`, `pan_by`, `zoom_at`) and frames (`tick`), render
//! from the accessors, and react to drained [`MapEvent`]s.

use foundation::math::{Vec2, ViewTransform};
use runtime::event_bus::{Event, EventBus};
use runtime::frame::Frame;
use runtime::timers::TimerHandle;
use tracing::{debug, info};

use crate::camera::CameraController;
use crate::ids::{LocationId, UniverseId};
use crate::model::{GlobalConfig, Location, MapData};
use crate::navigation::{BackTarget, Background, Focus, Navigation, Resolved};
use crate::picking::{ClickOutcome, CoordinatePicker, MarkerHit, pick_marker};

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    UniverseEntered(UniverseId),
    /// Location details should open. `origin` is the screen point of the click
    /// that selected it, if any.
    LocationRevealed {
        universe: UniverseId,
        location: LocationId,
        origin: Option<Vec2>,
    },
    LocationClosed(UniverseId),
    ReturnedToOverview,
    CoordinatePicked(Vec2),
    /// New data no longer contained the focused entity.
    SelectionCleared,
}

#[derive(Debug)]
struct Reveal {
    generation: u64,
    universe: UniverseId,
    location: LocationId,
    origin: Option<Vec2>,
}

#[derive(Debug)]
pub struct MapView {
    data: MapData,
    config: GlobalConfig,
    camera: CameraController<Reveal>,
    picker: CoordinatePicker,
    nav: Navigation,
    events: EventBus<MapEvent>,
    pending_reveal: Option<TimerHandle>,
    frame_index: u64,
}

impl MapView {
    pub fn new(data: MapData, config: GlobalConfig) -> Self {
        Self {
            data,
            config,
            camera: CameraController::new(),
            picker: CoordinatePicker::new(),
            nav: Navigation::new(),
            events: EventBus::new(),
            pending_reveal: None,
            frame_index: 0,
        }
    }

    pub fn data(&self) -> &MapData {
        &self.data
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub fn transform(&self) -> ViewTransform {
        self.camera.transform()
    }

    pub fn is_animating(&self) -> bool {
        self.camera.is_animating()
    }

    pub fn focus(&self) -> &Focus {
        self.nav.focus()
    }

    pub fn resolved(&self) -> Resolved<'_> {
        self.nav.resolve(&self.data)
    }

    pub fn visible_locations(&self) -> &[Location] {
        self.nav.resolve(&self.data).visible_locations()
    }

    pub fn background(&self) -> Background {
        self.resolved().background(&self.config)
    }

    pub fn back_target(&self) -> Option<BackTarget> {
        self.resolved().back_target()
    }

    pub fn has_pending_reveal(&self) -> bool {
        self.pending_reveal.is_some()
    }

    /// Routes a click at viewBox point `screen`. Markers win over picking.
    pub fn click(&mut self, screen: Vec2) -> ClickOutcome {
        let transform = self.camera.transform();
        let markers = self.resolved().markers();
        let hit = pick_marker(&markers, transform.invert(screen)).cloned();
        let outcome = self.picker.handle_click(screen, &transform, hit);

        match &outcome {
            ClickOutcome::Marker(MarkerHit::Universe(id)) => {
                self.select_universe(id);
            }
            ClickOutcome::Marker(MarkerHit::Location { location, .. }) => {
                self.select_location(location, Some(screen));
            }
            ClickOutcome::Picked(p) => {
                debug!(x = p.x, y = p.y, "coordinate picked");
                self.emit(MapEvent::CoordinatePicked(*p));
            }
            ClickOutcome::Background => {}
        }
        outcome
    }

    pub fn select_universe(&mut self, id: &UniverseId) -> bool {
        if !self.nav.enter_universe(&self.data, id) {
            return false;
        }
        self.cancel_reveal();
        if let Some(u) = self.data.universe(id) {
            self.camera.zoom_to_universe(u);
        }
        self.emit(MapEvent::UniverseEntered(id.clone()));
        true
    }

    /// Opens a location of the focused universe; details are revealed shortly
    /// after the camera starts moving.
    pub fn select_location(&mut self, id: &LocationId, origin: Option<Vec2>) -> bool {
        if !self.nav.open_location(&self.data, id) {
            return false;
        }
        self.cancel_reveal();
        let Some(universe) = self.nav.focus().universe().cloned() else {
            return false;
        };
        let Some(location) = self.data.universe(&universe).and_then(|u| u.location(id)) else {
            return false;
        };
        let reveal = Reveal {
            generation: self.nav.generation(),
            universe,
            location: id.clone(),
            origin,
        };
        self.pending_reveal = self.camera.zoom_to_location(location, Some(reveal));
        true
    }

    /// Location → universe, re-centring on the parent universe.
    pub fn close_location(&mut self) -> bool {
        let Some(universe) = self.nav.close_location() else {
            return false;
        };
        self.cancel_reveal();
        self.aim_at_focus();
        self.emit(MapEvent::LocationClosed(universe));
        true
    }

    pub fn back_to_overview(&mut self) -> bool {
        if !self.nav.back_to_overview() {
            return false;
        }
        self.cancel_reveal();
        self.camera.reset_to_overview();
        self.emit(MapEvent::ReturnedToOverview);
        true
    }

    /// Follows the back control for the current focus.
    pub fn back(&mut self) -> bool {
        match self.back_target() {
            Some(BackTarget::Universe(_)) => self.close_location(),
            Some(BackTarget::Overview) => self.back_to_overview(),
            None => false,
        }
    }

    /// Replaces the snapshot. A focus on entities that disappeared is dropped
    /// and the camera re-aimed.
    pub fn replace_data(&mut self, data: MapData) {
        self.data = data;
        if self.nav.reconcile(&self.data) {
            info!(focus = ?self.nav.focus(), "focused entity removed, selection cleared");
            self.cancel_reveal();
            self.aim_at_focus();
            self.emit(MapEvent::SelectionCleared);
        }
    }

    pub fn set_config(&mut self, config: GlobalConfig) {
        self.config = config;
    }

    pub fn enable_picking(&mut self, callback: impl FnMut(Vec2) + Send + 'static) {
        self.picker.enable(callback);
    }

    pub fn disable_picking(&mut self) {
        self.picker.disable();
    }

    pub fn is_picking(&self) -> bool {
        self.picker.is_active()
    }

    pub fn take_picked(&mut self) -> Option<Vec2> {
        self.picker.take_pending()
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.camera.pan_by(delta);
    }

    pub fn zoom_at(&mut self, anchor: Vec2, factor: f64) {
        self.camera.zoom_at(anchor, factor);
    }

    /// Advances animations and fires reveals that came due.
    pub fn tick(&mut self, frame: Frame) {
        self.frame_index = frame.index;
        for reveal in self.camera.update(frame.dt_s) {
            self.pending_reveal = None;
            if reveal.generation != self.nav.generation() {
                debug!(location = %reveal.location, "dropping stale reveal");
                continue;
            }
            self.emit(MapEvent::LocationRevealed {
                universe: reveal.universe,
                location: reveal.location,
                origin: reveal.origin,
            });
        }
    }

    pub fn drain_events(&mut self) -> Vec<Event<MapEvent>> {
        self.events.drain()
    }

    fn aim_at_focus(&mut self) {
        match self.nav.focus().universe().and_then(|id| self.data.universe(id)) {
            Some(u) => self.camera.zoom_to_universe(u),
            None => self.camera.reset_to_overview(),
        }
    }

    fn cancel_reveal(&mut self) {
        if let Some(handle) = self.pending_reveal.take() {
            self.camera.cancel_reveal(handle);
        }
    }

    fn emit(&mut self, event: MapEvent) {
        self.events.emit(self.frame_index, event);
    }
}
