//! Scripted and interactive camera over the logical map canvas.
//!
//! The camera owns the one [`ViewTransform`] of a map view. Programmatic
//! moves ("shots") animate towards a target transform; user pan/zoom edits the
//! transform directly and interrupts any move in flight.

use foundation::math::{Vec2, ViewTransform, ease_cubic_in_out};
use foundation::time::{Time, TimeSpan};
use runtime::timers::{TimerHandle, TimerQueue};

use crate::ids::{LocationId, UniverseId};
use crate::model::{Location, Universe};

/// Screen point every shot centres its focus on (middle of the viewBox).
pub const VIEW_ANCHOR: Vec2 = Vec2 { x: 1000.0, y: 800.0 };

/// Logical point centred in the overview.
pub const OVERVIEW_FOCUS: Vec2 = Vec2 { x: 500.0, y: 400.0 };

pub const OVERVIEW_SCALE: f64 = 0.8;
pub const UNIVERSE_SCALE: f64 = 1.2;
pub const LOCATION_SCALE: f64 = 3.5;

/// Duration of overview and universe moves (seconds).
pub const SCENE_TRANSITION_S: f64 = 1.2;
/// Duration of location moves (seconds).
pub const LOCATION_TRANSITION_S: f64 = 0.8;
/// Delay between starting a location move and revealing its details.
///
/// Deliberately shorter than the move: details open while the camera is
/// still travelling.
pub const LOCATION_REVEAL_DELAY_S: f64 = 0.2;

/// Zoom range available to user interaction.
pub const SCALE_EXTENT: (f64, f64) = (0.5, 4.0);

pub fn overview_transform() -> ViewTransform {
    ViewTransform::centered_on(VIEW_ANCHOR, OVERVIEW_SCALE, OVERVIEW_FOCUS)
}

pub fn universe_transform(universe: &Universe) -> ViewTransform {
    ViewTransform::centered_on(VIEW_ANCHOR, UNIVERSE_SCALE, universe.position())
}

pub fn location_transform(location: &Location) -> ViewTransform {
    ViewTransform::centered_on(VIEW_ANCHOR, LOCATION_SCALE, location.position())
}

/// What the camera is (or was last) pointed at.
#[derive(Debug, Clone, PartialEq)]
pub enum Shot {
    Overview,
    Universe(UniverseId),
    Location(LocationId),
    /// User pan/zoom moved the camera off any scripted shot.
    Free,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: ViewTransform,
    to: ViewTransform,
    span: TimeSpan,
}

impl Transition {
    /// Focus moves linearly while zoom interpolates geometrically, so the
    /// perceived zoom speed stays even across large scale changes.
    fn sample(&self, now: Time) -> ViewTransform {
        let t = self.span.progress(now);
        if t >= 1.0 {
            return self.to;
        }
        let e = ease_cubic_in_out(t);
        let from_focus = self.from.focus_at(VIEW_ANCHOR);
        let to_focus = self.to.focus_at(VIEW_ANCHOR);
        let k = self.from.k * (self.to.k / self.from.k).powf(e);
        ViewTransform::centered_on(VIEW_ANCHOR, k, from_focus.lerp(to_focus, e))
    }

    fn is_done(&self, now: Time) -> bool {
        self.span.progress(now) >= 1.0
    }
}

/// Animates the view transform between overview, universe and location shots.
///
/// Ordering contract:
/// - Starting any shot replaces the move in flight (last write wins) and
///   cancels every pending reveal.
/// - A reveal fires from [`CameraController::update`] once its delay has
///   elapsed, independent of whether the move finished.
/// - Dropping the controller drops pending reveals without firing them.
#[derive(Debug)]
pub struct CameraController<T = ()> {
    transform: ViewTransform,
    transition: Option<Transition>,
    shot: Shot,
    now: Time,
    reveals: TimerQueue<T>,
}

impl<T> Default for CameraController<T> {
    fn default() -> Self {
        Self {
            transform: overview_transform(),
            transition: None,
            shot: Shot::Overview,
            now: Time::ZERO,
            reveals: TimerQueue::new(),
        }
    }
}

impl<T> CameraController<T> {
    /// Starts at rest on the overview.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Where the current move ends (or the current transform at rest).
    pub fn target(&self) -> ViewTransform {
        self.transition.map_or(self.transform, |t| t.to)
    }

    pub fn shot(&self) -> &Shot {
        &self.shot
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn has_pending_reveal(&self) -> bool {
        !self.reveals.is_empty()
    }

    pub fn reset_to_overview(&mut self) {
        self.start(overview_transform(), SCENE_TRANSITION_S, Shot::Overview);
    }

    pub fn zoom_to_universe(&mut self, universe: &Universe) {
        self.start(
            universe_transform(universe),
            SCENE_TRANSITION_S,
            Shot::Universe(universe.id.clone()),
        );
    }

    /// Moves to `location`, optionally scheduling `reveal` to fire after
    /// [`LOCATION_REVEAL_DELAY_S`]. The handle cancels the reveal.
    pub fn zoom_to_location(&mut self, location: &Location, reveal: Option<T>) -> Option<TimerHandle> {
        self.start(
            location_transform(location),
            LOCATION_TRANSITION_S,
            Shot::Location(location.id.clone()),
        );
        reveal.map(|payload| self.reveals.schedule_after(LOCATION_REVEAL_DELAY_S, payload))
    }

    /// Cancels a pending reveal; returns its payload if it had not fired.
    pub fn cancel_reveal(&mut self, handle: TimerHandle) -> Option<T> {
        self.reveals.cancel(handle)
    }

    /// Drag-pan by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.interrupt();
        self.transform = ViewTransform::new(
            self.transform.x + delta.x,
            self.transform.y + delta.y,
            self.transform.k,
        );
    }

    /// Wheel zoom by `factor` around screen point `anchor`, clamped to
    /// [`SCALE_EXTENT`].
    pub fn zoom_at(&mut self, anchor: Vec2, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.interrupt();
        let (min_k, max_k) = SCALE_EXTENT;
        let k = (self.transform.k * factor).clamp(min_k, max_k);
        self.transform = self.transform.zoom_about(anchor, k / self.transform.k);
    }

    /// Advances the clock by `dt_s` seconds and returns reveals that came due.
    pub fn update(&mut self, dt_s: f64) -> Vec<T> {
        self.now = self.now.add_seconds(dt_s.max(0.0));
        if let Some(transition) = self.transition {
            self.transform = transition.sample(self.now);
            if transition.is_done(self.now) {
                self.transition = None;
            }
        }
        self.reveals.advance(dt_s)
    }

    fn start(&mut self, to: ViewTransform, duration_s: f64, shot: Shot) {
        self.reveals.cancel_all();
        self.transition = Some(Transition {
            from: self.transform,
            to,
            span: TimeSpan::starting_at(self.now, duration_s),
        });
        self.shot = shot;
    }

    /// Stops the move in flight. Pending reveals still fire: the focus they
    /// belong to has not changed.
    fn interrupt(&mut self) {
        self.transition = None;
        self.shot = Shot::Free;
    }
}
