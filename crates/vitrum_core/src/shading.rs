//! Per-pixel glass shading
//!
//! The pipeline is shared by both geometry strategies. A [`GeometrySource`]
//! supplies the field value, normal and coverage for a pixel; everything
//! after that (height, refraction, color adjustment, tint, lighting and the
//! final cross-fade) lives in [`shade`].

use crate::blur::kawase13;
use crate::color::{adjust_saturation_lightness, apply_tint};
use crate::geometry::{mix, smoothstep, Color, Vec2, Vec3};
use crate::image::AlphaMask;
use crate::lighting::{LightingInput, LightingModel};
use crate::normal::{analytic_normal, raster_normal, screen_derivatives};
use crate::scene::Scene;
use crate::settings::GlassSettings;

/// Glass thinner than this is invisible
pub const MIN_THICKNESS: f32 = 0.01;

/// Half width of the anti-aliased edge band, in pixels
pub const DEFAULT_EDGE_BAND: f32 = 1.0;

/// Extra refraction depth, in multiples of the thickness
pub const REFRACTION_DEPTH: f32 = 8.0;

/// Chromatic aberration below this is treated as zero
pub const CHROMATIC_THRESHOLD: f32 = 0.001;

/// Refractive index offsets for R, G, B per unit of chromatic aberration
pub const CHROMATIC_IOR_OFFSETS: [f32; 3] = [-0.04, 0.0, 0.08];

const MIN_REFRACTED_Z: f32 = 1.0e-3;
const MIN_IOR: f32 = 1.0e-4;
const MIN_MASK_ALPHA: f32 = 1.0e-3;

/// Height of the drop profile above a point with distance `sd`
///
/// Zero outside, `thickness` in the core, a quarter circle in between.
pub fn height(sd: f32, thickness: f32) -> f32 {
    if sd >= 0.0 {
        0.0
    } else if sd < -thickness {
        thickness
    } else {
        let x = thickness + sd;
        (thickness * thickness - x * x).max(0.0).sqrt()
    }
}

/// 0 inside, 1 outside, smooth across `[-band, band]`
pub fn edge_alpha(sd: f32, band: f32) -> f32 {
    if band <= 0.0 {
        return if sd < 0.0 { 0.0 } else { 1.0 };
    }
    smoothstep(-band, band, sd)
}

/// Snell refraction of `incident` through `normal` with index ratio `eta`
///
/// Both vectors are unit length. Total internal reflection yields zero.
pub fn refract(incident: Vec3, normal: Vec3, eta: f32) -> Vec3 {
    let n_dot_i = normal.dot(incident);
    let k = 1.0 - eta * eta * (1.0 - n_dot_i * n_dot_i);
    if k < 0.0 {
        return Vec3::ZERO;
    }
    incident * eta - normal * (eta * n_dot_i + k.sqrt())
}

/// Screen-space displacement in pixels for one refractive index
pub fn refraction_offset(normal: Vec3, height: f32, thickness: f32, ior: f32) -> Vec2 {
    let eta = 1.0 / ior.max(MIN_IOR);
    let r = refract(Vec3::FORWARD, normal, eta);
    let depth = height + REFRACTION_DEPTH * thickness;
    r.xy() * (depth / r.z.abs().max(MIN_REFRACTED_Z))
}

/// Pixel displacement per color channel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelOffsets {
    pub r: Vec2,
    pub g: Vec2,
    pub b: Vec2,
}

impl ChannelOffsets {
    pub fn is_split(&self) -> bool {
        self.r != self.g || self.b != self.g
    }
}

/// Displacements for R, G and B; identical unless chromatic aberration is on
pub fn channel_offsets(normal: Vec3, height: f32, settings: &GlassSettings) -> ChannelOffsets {
    let ior = settings.refractive_index;
    let t = settings.thickness;
    let g = refraction_offset(normal, height, t, ior);
    let k = settings.chromatic_aberration;
    if k <= CHROMATIC_THRESHOLD {
        return ChannelOffsets { r: g, g, b: g };
    }
    ChannelOffsets {
        r: refraction_offset(normal, height, t, ior + CHROMATIC_IOR_OFFSETS[0] * k),
        g,
        b: refraction_offset(normal, height, t, ior + CHROMATIC_IOR_OFFSETS[2] * k),
    }
}

/// Field value, normal and coverage of the glass at one pixel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSample {
    pub sd: f32,
    pub normal: Vec3,
    /// Weight of the glass color in the final cross-fade
    pub coverage: f32,
}

/// A way of acquiring the glass surface under a pixel
pub trait GeometrySource: Sync {
    /// Surface at pixel center `p` (device pixels) / `uv`; `None` when the
    /// pixel is fully outside the glass
    fn surface(&self, p: Vec2, uv: Vec2, thickness: f32) -> Option<SurfaceSample>;

    /// Whether the saturation and lightness adjustment applies
    fn adjusts_color(&self) -> bool;
}

/// Geometry from the composed analytic SDF
pub struct AnalyticSurface<'a> {
    pub scene: &'a Scene,
    pub blend: f32,
    pub edge_band: f32,
}

impl GeometrySource for AnalyticSurface<'_> {
    fn surface(&self, p: Vec2, _uv: Vec2, thickness: f32) -> Option<SurfaceSample> {
        let sd = self.scene.field(p, self.blend);
        let coverage = 1.0 - edge_alpha(sd, self.edge_band);
        if coverage <= 0.0 {
            return None;
        }
        let d = screen_derivatives(p, |q| self.scene.field(q, self.blend));
        Some(SurfaceSample {
            sd,
            normal: analytic_normal(sd, d, thickness),
            coverage,
        })
    }

    fn adjusts_color(&self) -> bool {
        true
    }
}

/// Geometry from sharp and blurred coverage masks
pub struct MaskSurface<'a> {
    pub sharp: &'a AlphaMask,
    pub blurred: &'a AlphaMask,
}

impl GeometrySource for MaskSurface<'_> {
    fn surface(&self, _p: Vec2, uv: Vec2, thickness: f32) -> Option<SurfaceSample> {
        let s = raster_normal(self.sharp, self.blurred, uv, thickness);
        if s.alpha < MIN_MASK_ALPHA {
            return None;
        }
        Some(SurfaceSample {
            // The heuristic field is 0 at the rim; nudge it inside where
            // the mask covers the pixel so height and lighting engage.
            sd: s.sdf.min(-f32::EPSILON),
            normal: s.normal,
            coverage: s.alpha.clamp(0.0, 1.0),
        })
    }

    fn adjusts_color(&self) -> bool {
        false
    }
}

/// Per-frame shading parameters
#[derive(Clone, Copy, Debug)]
pub struct ShadeParams<'a> {
    pub settings: &'a GlassSettings,
    pub lighting: LightingModel,
    /// Viewport size in pixels
    pub viewport: Vec2,
    /// Inline 13-tap blur radius in pixels; 0 samples a single point
    pub kawase_radius: f32,
}

/// Shade one pixel
///
/// `background_pixel` is the unrefracted background texel under the pixel
/// and is returned unchanged wherever the glass does not contribute.
/// `sample` reads the background at a normalized UV.
pub fn shade<G, S>(
    geometry: &G,
    params: &ShadeParams<'_>,
    p: Vec2,
    background_pixel: Color,
    sample: S,
) -> Color
where
    G: GeometrySource + ?Sized,
    S: Fn(Vec2) -> Color,
{
    let settings = params.settings;
    let thickness = settings.thickness;
    if thickness.is_nan() || thickness < MIN_THICKNESS {
        return background_pixel;
    }
    let uv = p.div_elem(params.viewport);
    let Some(surface) = geometry.surface(p, uv, thickness) else {
        return background_pixel;
    };

    let h = height(surface.sd, thickness);
    let offsets = channel_offsets(surface.normal, h, settings);
    let refracted = sample_refracted(uv, &offsets, params, &sample);

    let mut rgb = refracted.rgb_vec();
    if geometry.adjusts_color() {
        rgb = adjust_saturation_lightness(rgb, settings.saturation, settings.lightness);
    }
    let tinted = apply_tint(Color::from_rgb_vec(rgb, refracted.a), settings.glass_color);

    let light = params.lighting.contribution(&LightingInput {
        normal: surface.normal,
        sd: surface.sd,
        height: h,
        thickness,
        light_angle: settings.light_angle,
        light_intensity: settings.light_intensity,
        ambient_strength: settings.ambient_strength,
        background: refracted.rgb_vec(),
    });
    let glass = Color::from_rgb_vec(tinted.rgb_vec() + light, tinted.a).clamped();

    let w = surface.coverage;
    Color::rgba(
        mix(background_pixel.r, glass.r, w),
        mix(background_pixel.g, glass.g, w),
        mix(background_pixel.b, glass.b, w),
        mix(background_pixel.a, glass.a, w),
    )
}

fn sample_refracted<S>(uv: Vec2, offsets: &ChannelOffsets, params: &ShadeParams<'_>, sample: &S) -> Color
where
    S: Fn(Vec2) -> Color,
{
    let to_uv = |offset: Vec2| uv + offset.div_elem(params.viewport);
    let tap = |at: Vec2| {
        if params.kawase_radius > 0.0 {
            let radius = Vec2::splat(params.kawase_radius).div_elem(params.viewport);
            kawase13(at, radius, sample)
        } else {
            sample(at)
        }
    };

    // Green carries the canonical displacement and the alpha.
    let g = tap(to_uv(offsets.g));
    if !offsets.is_split() {
        return g;
    }
    let r = tap(to_uv(offsets.r));
    let b = tap(to_uv(offsets.b));
    Color::rgba(r.r, g.g, b.b, g.a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::scene::SceneBuilder;
    use crate::shape::ShapeDescriptor;

    #[test]
    fn test_height_profile() {
        let t = 20.0;
        for sd in [0.0, 0.5, 30.0] {
            assert_eq!(height(sd, t), 0.0);
        }
        for sd in [-20.0, -25.0, -400.0] {
            assert_eq!(height(sd, t), t);
        }
        // Continuous at both ends
        assert!(height(-1.0e-4, t) < 0.1);
        assert!((height(-20.0 + 1.0e-4, t) - t).abs() < 1e-3);
        assert!(height(-10.0, t) > 0.0 && height(-10.0, t) < t);
    }

    #[test]
    fn test_refract_straight_through() {
        let r = refract(Vec3::FORWARD, Vec3::UP, 1.0 / 1.5);
        assert!((r.x).abs() < 1e-6 && (r.y).abs() < 1e-6);
        assert!((r.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_refract_total_internal_reflection() {
        let n = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(refract(Vec3::FORWARD, n, 2.0), Vec3::ZERO);
        let off = refraction_offset(n, 0.0, 20.0, 0.5);
        assert_eq!(off, Vec2::ZERO);
    }

    #[test]
    fn test_flat_normal_has_no_offset() {
        assert_eq!(refraction_offset(Vec3::UP, 20.0, 20.0, 1.2), Vec2::ZERO);
    }

    #[test]
    fn test_zero_chromatic_channels_identical() {
        let settings = GlassSettings::default().with_chromatic_aberration(0.0);
        let n = Vec3::new(0.6, 0.0, 0.8);
        let o = channel_offsets(n, 5.0, &settings);
        assert_eq!(o.r, o.g);
        assert_eq!(o.b, o.g);
        assert!(!o.is_split());
    }

    #[test]
    fn test_chromatic_splits_channels() {
        let settings = GlassSettings::default().with_chromatic_aberration(1.0);
        let n = Vec3::new(0.6, 0.0, 0.8);
        let o = channel_offsets(n, 5.0, &settings);
        assert!(o.is_split());
        assert_ne!(o.r, o.b);
    }

    #[test]
    fn test_degenerate_ior_is_finite() {
        let n = Vec3::new(0.6, 0.0, 0.8);
        for ior in [0.0, -1.0, 1.0e-9, 1.0e9] {
            let o = refraction_offset(n, 10.0, 20.0, ior);
            assert!(o.x.is_finite() && o.y.is_finite(), "ior {ior}");
        }
    }

    fn one_shape_scene() -> Scene {
        SceneBuilder::new()
            .shape(ShapeDescriptor::rounded_rect(
                Vec2::new(50.0, 50.0),
                Size::new(60.0, 40.0),
                10.0,
            ))
            .build()
            .unwrap()
    }

    fn checker(uv: Vec2) -> Color {
        let cell = ((uv.x * 10.0).floor() + (uv.y * 10.0).floor()) as i32;
        if cell % 2 == 0 {
            Color::rgb(0.9, 0.2, 0.1)
        } else {
            Color::rgb(0.1, 0.3, 0.8)
        }
    }

    #[test]
    fn test_thin_glass_is_invisible() {
        let scene = one_shape_scene();
        let settings = GlassSettings::default().with_thickness(0.005);
        let geometry = AnalyticSurface {
            scene: &scene,
            blend: settings.blend,
            edge_band: DEFAULT_EDGE_BAND,
        };
        let params = ShadeParams {
            settings: &settings,
            lighting: LightingModel::Specular,
            viewport: Vec2::new(100.0, 100.0),
            kawase_radius: 0.0,
        };
        let bg = Color::rgba(0.3, 0.5, 0.7, 0.9);
        let out = shade(&geometry, &params, Vec2::new(50.5, 50.5), bg, checker);
        assert_eq!(out, bg);
    }

    #[test]
    fn test_outside_returns_background_exactly() {
        let scene = one_shape_scene();
        let settings = GlassSettings::default();
        let geometry = AnalyticSurface {
            scene: &scene,
            blend: settings.blend,
            edge_band: DEFAULT_EDGE_BAND,
        };
        let params = ShadeParams {
            settings: &settings,
            lighting: LightingModel::Adaptive,
            viewport: Vec2::new(100.0, 100.0),
            kawase_radius: 4.0,
        };
        let bg = Color::rgb(0.25, 0.25, 0.25);
        let out = shade(&geometry, &params, Vec2::new(5.5, 5.5), bg, checker);
        assert_eq!(out, bg);
    }

    #[test]
    fn test_inside_is_finite_and_changes_pixel() {
        let scene = one_shape_scene();
        let settings = GlassSettings::default()
            .with_glass_color(Color::rgba(0.1, 0.1, 0.4, 0.5))
            .with_chromatic_aberration(0.5);
        let geometry = AnalyticSurface {
            scene: &scene,
            blend: settings.blend,
            edge_band: DEFAULT_EDGE_BAND,
        };
        let params = ShadeParams {
            settings: &settings,
            lighting: LightingModel::Specular,
            viewport: Vec2::new(100.0, 100.0),
            kawase_radius: 2.0,
        };
        let bg = Color::rgb(0.9, 0.9, 0.9);
        let out = shade(&geometry, &params, Vec2::new(50.5, 50.5), bg, |_| bg);
        assert!(out.is_finite());
        assert_ne!(out, bg);
    }

    #[test]
    fn test_mask_surface_outside_coverage() {
        let empty = AlphaMask::from_fn(4, 4, |_, _| 0.0);
        let surface = MaskSurface {
            sharp: &empty,
            blurred: &empty,
        };
        assert!(surface
            .surface(Vec2::new(1.5, 1.5), Vec2::new(0.375, 0.375), 20.0)
            .is_none());
        assert!(!surface.adjusts_color());
    }
}
