use super::Vec2;

/// Uniform-scale pan/zoom transform: `screen = logical * k + (x, y)`.
///
/// Composition follows the usual zoom-transform conventions: `translate` is
/// applied in the current (scaled) frame, `scale` multiplies the zoom factor
/// without moving the origin. So
/// `IDENTITY.translate(1000, 800).scale(0.8).translate(-500, -400)` first
/// moves logical `(500, 400)` to the origin, zooms by 0.8, then moves the
/// origin to `(1000, 800)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    pub fn translate(self, tx: f64, ty: f64) -> Self {
        Self::new(self.x + self.k * tx, self.y + self.k * ty, self.k)
    }

    pub fn scale(self, k: f64) -> Self {
        Self::new(self.x, self.y, self.k * k)
    }

    /// The transform that places logical `focus` at screen `anchor` with zoom `k`.
    pub fn centered_on(anchor: Vec2, k: f64, focus: Vec2) -> Self {
        Self::IDENTITY
            .translate(anchor.x, anchor.y)
            .scale(k)
            .translate(-focus.x, -focus.y)
    }

    /// Logical → screen.
    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    /// Screen → logical. Requires `k != 0`.
    pub fn invert(&self, p: Vec2) -> Vec2 {
        Vec2::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
    }

    /// Logical point currently displayed at screen `anchor`.
    pub fn focus_at(&self, anchor: Vec2) -> Vec2 {
        self.invert(anchor)
    }

    /// Zoom by `factor` keeping the logical point under screen `anchor` fixed.
    pub fn zoom_about(&self, anchor: Vec2, factor: f64) -> Self {
        let focus = self.invert(anchor);
        Self::centered_on(anchor, self.k * factor, focus)
    }

    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps
            && (self.y - other.y).abs() <= eps
            && (self.k - other.k).abs() <= eps
    }
}

impl std::fmt::Display for ViewTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // SVG `transform` attribute form.
        write!(f, "translate({},{}) scale({})", self.x, self.y, self.k)
    }
}
