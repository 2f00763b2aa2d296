//! Surface normal reconstruction
//!
//! Two strategies produce the same thing, a field value plus a unit
//! normal, from different inputs:
//!
//! - **Analytic**: screen-space derivatives of the composed SDF, bent by a
//!   hemispherical drop profile of the given thickness.
//! - **Raster**: a sharp and a blurred coverage mask. The blurred mask
//!   stands in for the distance field and multi-scale Sobel gradients
//!   supply the direction; the slope follows a sessile-drop contact angle.

use std::f32::consts::FRAC_PI_2;

use crate::geometry::{mix, smoothstep, Vec2, Vec3};
use crate::image::AlphaMask;

/// Steepest contact angle of the raster profile, at the edge
pub const MAX_CONTACT_ANGLE: f32 = 60.0 * std::f32::consts::PI / 180.0;

/// Texel offsets of the gradient octaves
pub const SOBEL_SCALES: [f32; 3] = [1.0, 2.0, 4.0];

const MIN_ALPHA: f32 = 1.0e-3;
const MIN_GRADIENT: f32 = 1.0e-5;

/// Per-pixel screen-space derivatives of `field` at `p`
///
/// Central difference over one pixel, the CPU stand-in for `dpdx`/`dpdy`.
pub fn screen_derivatives(p: Vec2, field: impl Fn(Vec2) -> f32) -> Vec2 {
    let dx = field(p + Vec2::new(0.5, 0.0)) - field(p - Vec2::new(0.5, 0.0));
    let dy = field(p + Vec2::new(0.0, 0.5)) - field(p - Vec2::new(0.0, 0.5));
    Vec2::new(dx, dy)
}

/// Normal of the drop surface above a point with distance `sd`
pub fn analytic_normal(sd: f32, derivatives: Vec2, thickness: f32) -> Vec3 {
    let t = thickness.max(1.0e-3);
    let cos_theta = ((t + sd) / t).clamp(0.0, 1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let n = Vec3::new(
        derivatives.x * cos_theta,
        derivatives.y * cos_theta,
        sin_theta,
    )
    .normalize();
    if n == Vec3::ZERO || !n.is_finite() {
        Vec3::UP
    } else {
        n
    }
}

/// Approximate signed distance recovered from blurred coverage
pub fn raster_sdf(blurred_alpha: f32, thickness: f32) -> f32 {
    -smoothstep(0.0, 1.0, blurred_alpha) * thickness
}

/// 3x3 Sobel gradient of `mask` around `uv`, taps `offset` UV apart
///
/// Points toward increasing coverage, i.e. into the shape.
pub fn sobel(mask: &AlphaMask, uv: Vec2, offset: Vec2) -> Vec2 {
    let s = |dx: f32, dy: f32| mask.sample(uv + Vec2::new(dx * offset.x, dy * offset.y));
    let tl = s(-1.0, -1.0);
    let t = s(0.0, -1.0);
    let tr = s(1.0, -1.0);
    let l = s(-1.0, 0.0);
    let r = s(1.0, 0.0);
    let bl = s(-1.0, 1.0);
    let b = s(0.0, 1.0);
    let br = s(1.0, 1.0);
    Vec2::new(
        (tr + 2.0 * r + br) - (tl + 2.0 * l + bl),
        (bl + 2.0 * b + br) - (tl + 2.0 * t + tr),
    )
}

/// Sobel gradient summed over [`SOBEL_SCALES`], weighted by `1 / scale`
pub fn multiscale_gradient(mask: &AlphaMask, uv: Vec2) -> Vec2 {
    let texel = mask.texel_size();
    SOBEL_SCALES.iter().fold(Vec2::ZERO, |acc, &scale| {
        acc + sobel(mask, uv, texel * scale) * (1.0 / scale)
    })
}

/// Field value and normal recovered from the coverage masks
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterSample {
    /// Sharp coverage at the pixel
    pub alpha: f32,
    /// Approximate signed distance (0 outside, `-thickness` deep inside)
    pub sdf: f32,
    pub normal: Vec3,
}

/// Reconstruct the normal at `uv` from the sharp and blurred masks
pub fn raster_normal(
    sharp: &AlphaMask,
    blurred: &AlphaMask,
    uv: Vec2,
    thickness: f32,
) -> RasterSample {
    let alpha = sharp.sample(uv);
    let sdf = raster_sdf(blurred.sample(uv), thickness);
    let mut sample = RasterSample {
        alpha,
        sdf,
        normal: Vec3::UP,
    };
    if alpha < MIN_ALPHA || thickness <= 0.0 {
        return sample;
    }

    let depth = (-sdf / thickness).clamp(0.0, 1.0);
    let g_sharp = multiscale_gradient(sharp, uv);
    let g_blurred = multiscale_gradient(blurred, uv);
    let w = smoothstep(0.0, 0.5, depth);
    let gradient = Vec2::new(
        mix(g_sharp.x, g_blurred.x, w),
        mix(g_sharp.y, g_blurred.y, w),
    );
    if gradient.length() < MIN_GRADIENT {
        return sample;
    }

    let outward = -gradient;
    let azimuth = outward.y.atan2(outward.x);
    let theta = MAX_CONTACT_ANGLE * (depth * FRAC_PI_2).cos();
    let (sin_t, cos_t) = theta.sin_cos();
    sample.normal = Vec3::new(azimuth.cos() * sin_t, azimuth.sin() * sin_t, cos_t);
    sample
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analytic_normal_edge_is_horizontal() {
        let n = analytic_normal(0.0, Vec2::new(1.0, 0.0), 20.0);
        assert!((n.x - 1.0).abs() < 1e-5);
        assert!(n.z.abs() < 1e-5);
    }

    #[test]
    fn test_analytic_normal_core_faces_viewer() {
        let n = analytic_normal(-25.0, Vec2::new(0.3, -0.9), 20.0);
        assert_eq!(n, Vec3::UP);
    }

    #[test]
    fn test_analytic_normal_is_unit() {
        for sd in [-19.0, -10.0, -2.5, -0.1] {
            let n = analytic_normal(sd, Vec2::new(0.6, 0.8), 20.0);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(n.z > 0.0);
        }
    }

    #[test]
    fn test_analytic_normal_flat_gradient_fallback() {
        assert_eq!(analytic_normal(0.0, Vec2::ZERO, 20.0), Vec3::UP);
    }

    #[test]
    fn test_screen_derivatives_of_plane() {
        let d = screen_derivatives(Vec2::new(3.0, 4.0), |p| 2.0 * p.x - p.y);
        assert!((d.x - 2.0).abs() < 1e-5);
        assert!((d.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_raster_sdf_range() {
        assert_eq!(raster_sdf(0.0, 20.0), 0.0);
        assert_eq!(raster_sdf(1.0, 20.0), -20.0);
        assert_eq!(raster_sdf(0.5, 20.0), -10.0);
    }

    #[test]
    fn test_raster_normal_zero_alpha_faces_up() {
        let empty = AlphaMask::from_fn(8, 8, |_, _| 0.0);
        let s = raster_normal(&empty, &empty, Vec2::new(0.5, 0.5), 20.0);
        assert_eq!(s.normal, Vec3::UP);
    }

    #[test]
    fn test_raster_normal_points_outward() {
        // Coverage on the left half, edge at x = 16.
        let mask = AlphaMask::from_fn(32, 32, |x, _| if x < 16 { 1.0 } else { 0.0 });
        let blurred = crate::blur::gaussian_blur_alpha(&mask, 4.0);
        let uv = Vec2::new(15.5 / 32.0, 0.5);
        let s = raster_normal(&mask, &blurred, uv, 20.0);
        assert!(s.normal.x > 0.3, "{:?}", s.normal);
        assert!(s.normal.y.abs() < 1e-3);
        assert!((s.normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_contact_angle_flattens_inside() {
        let mask = AlphaMask::from_fn(64, 8, |x, _| if x < 32 { 1.0 } else { 0.0 });
        let blurred = crate::blur::gaussian_blur_alpha(&mask, 6.0);
        let edge = raster_normal(&mask, &blurred, Vec2::new(31.5 / 64.0, 0.5), 20.0);
        let inner = raster_normal(&mask, &blurred, Vec2::new(26.5 / 64.0, 0.5), 20.0);
        assert!(inner.normal.z > edge.normal.z);
    }
}
