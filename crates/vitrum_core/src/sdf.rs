//! Closed-form 2D signed distance primitives
//!
//! Every primitive is centered at the origin; callers translate the query
//! point by `point - center` first. Negative values are inside, zero is the
//! boundary, positive values are outside.

use crate::geometry::Vec2;

/// Floor applied to ellipse radii and gradient lengths
pub const SDF_EPSILON: f32 = 1.0e-4;

/// Axis-aligned box with half extents `half`
pub fn rect(p: Vec2, half: Vec2) -> f32 {
    let d = p.abs() - half;
    d.max(Vec2::ZERO).length() + d.max_element().min(0.0)
}

/// Rounded box with a uniform corner radius
///
/// The radius is clamped to `min(half.x, half.y)`.
pub fn rounded_rect(p: Vec2, half: Vec2, radius: f32) -> f32 {
    let r = clamp_radius(radius, half);
    let q = p.abs() - half + Vec2::splat(r);
    q.max(Vec2::ZERO).length() + q.max_element().min(0.0) - r
}

/// Superellipse corner box (Lp-norm rounded box)
///
/// With `exponent == 2` this is exactly [`rounded_rect`]; larger exponents
/// give squarer corners. Exponents below 1 are raised to 1 since the Lp
/// "norm" stops being a distance there.
pub fn squircle(p: Vec2, half: Vec2, radius: f32, exponent: f32) -> f32 {
    let r = clamp_radius(radius, half);
    let q = p.abs() - half + Vec2::splat(r);
    let m = q.max(Vec2::ZERO);
    let corner = if exponent == 2.0 {
        m.length()
    } else {
        lp_norm(m, exponent.max(1.0))
    };
    corner + q.max_element().min(0.0) - r
}

/// Ellipse with semi-axes `radii`
///
/// Ratio-of-gradients approximation: exact on the boundary, approximate
/// elsewhere for strongly elongated ellipses.
pub fn ellipse(p: Vec2, radii: Vec2) -> f32 {
    let r = radii.max(Vec2::splat(SDF_EPSILON));
    let k1 = p.div_elem(r.mul_elem(r)).length();
    if k1 < SDF_EPSILON {
        // At the center the ratio degenerates to 0/0; its limit is -min(r).
        return -r.min_element();
    }
    let k0 = p.div_elem(r).length();
    k0 * (k0 - 1.0) / k1
}

fn clamp_radius(radius: f32, half: Vec2) -> f32 {
    radius.max(0.0).min(half.min_element().max(0.0))
}

// Scaled so large excursions do not overflow for big exponents.
fn lp_norm(v: Vec2, n: f32) -> f32 {
    let s = v.max_element();
    if s <= 0.0 {
        return 0.0;
    }
    let a = (v.x / s).powf(n);
    let b = (v.y / s).powf(n);
    s * (a + b).powf(1.0 / n)
}
