use crate::math::Vec2;

/// Width of the logical map canvas (viewBox `0 0 2000 1600`).
pub const CANVAS_WIDTH: f64 = 2000.0;
/// Height of the logical map canvas.
pub const CANVAS_HEIGHT: f64 = 1600.0;

/// Axis-aligned 2D box, inclusive on all edges.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Aabb2 { min, max }
    }

    /// The full logical canvas.
    pub fn canvas() -> Self {
        Self::new(Vec2::ZERO, Vec2::new(CANVAS_WIDTH, CANVAS_HEIGHT))
    }

    /// A `width × height` box centred on `center`.
    pub fn centered(center: Vec2, width: f64, height: f64) -> Self {
        let half = Vec2::new(width / 2.0, height / 2.0);
        Self::new(center - half, center + half)
    }

    pub fn center(&self) -> Vec2 {
        self.min.lerp(self.max, 0.5)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Grows the box by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        let m = Vec2::new(margin, margin);
        Self::new(self.min - m, self.max + m)
    }
}
