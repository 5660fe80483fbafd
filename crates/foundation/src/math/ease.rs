/// Cubic ease-in-out over `t ∈ [0, 1]` (input is clamped).
///
/// Symmetric: `ease(t) + ease(1 - t) == 1`.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let u = t - 2.0;
        (u * u * u + 2.0) / 2.0
    }
}
