//! Quadratic easing curves over normalized progress `p` in [0, 1].

pub fn ease_in_quad(p: f32) -> f32 {
    p * p
}

pub fn ease_out_quad(p: f32) -> f32 {
    let q = 1.0 - p;
    1.0 - q * q
}

/// Symmetric ease: `2p²` for the first half, `1 - 2(1-p)²` for the second
pub fn ease_in_out_quad(p: f32) -> f32 {
    if p < 0.5 {
        2.0 * p * p
    } else {
        let q = 1.0 - p;
        1.0 - 2.0 * q * q
    }
}

/// Up-then-down arc: 0 at both ends, 1 at the midpoint.
///
/// Ascent uses ease-out, descent uses ease-in.
pub fn bounce_arc(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    if p < 0.5 {
        ease_out_quad(p * 2.0)
    } else {
        1.0 - ease_in_quad((p - 0.5) * 2.0)
    }
}
