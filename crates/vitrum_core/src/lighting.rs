//! Glass lighting models
//!
//! Both models light the glass with a primary light at `light_angle` and a
//! dimmer secondary light from the opposite side. Their contribution is
//! additive RGB, gated by the normalized height of the surface so it fades
//! to zero at the outer edge and outside the glass.

use crate::color::{luminance, saturation};
use crate::geometry::{mix, smoothstep, Vec2, Vec3};

/// Weight of the secondary (opposite) light
pub const SECONDARY_LIGHT_WEIGHT: f32 = 0.8;

/// Specular exponent for thin and thick glass
pub const GLINT_EXPONENT_RANGE: (f32, f32) = (120.0, 200.0);

/// Thickness at which the glint reaches its sharpest exponent
const GLINT_THICKNESS: f32 = 40.0;

/// Slightly warm white used for glints
const GLINT_COLOR: Vec3 = Vec3::new(1.0, 1.0, 0.97);

const BLEED_EXPONENT: f32 = 4.0;
const BLEED_WEIGHT: f32 = 0.2;

/// Which lighting model shades the glass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LightingModel {
    /// Rim + sharp specular glint + soft internal bleed, near-white
    #[default]
    Specular,
    /// Highlight color derived from the background, Gaussian edge falloff
    Adaptive,
}

/// Per-pixel inputs to the lighting models
#[derive(Clone, Copy, Debug)]
pub struct LightingInput {
    pub normal: Vec3,
    /// Signed distance at the pixel
    pub sd: f32,
    pub height: f32,
    pub thickness: f32,
    pub light_angle: f32,
    pub light_intensity: f32,
    pub ambient_strength: f32,
    /// Refracted background color under the pixel
    pub background: Vec3,
}

impl LightingInput {
    /// Height divided by thickness, in 0..=1
    pub fn normalized_height(&self) -> f32 {
        if self.thickness <= 0.0 {
            return 0.0;
        }
        (self.height / self.thickness).clamp(0.0, 1.0)
    }

    /// Visibility gate shared by both models
    pub fn shape(&self) -> f32 {
        smoothstep(0.0, 0.1, self.normalized_height())
    }

    fn light_dir(&self) -> Vec2 {
        let (s, c) = self.light_angle.sin_cos();
        Vec2::new(c, s)
    }
}

/// Fresnel-style rim, strongest where the surface turns away from the viewer
pub fn rim(normal: Vec3) -> f32 {
    let f = (1.0 - normal.z.clamp(0.0, 1.0)).max(0.0);
    f * f * f
}

impl LightingModel {
    /// Additive RGB light for one pixel; zero outside the glass
    pub fn contribution(self, input: &LightingInput) -> Vec3 {
        if input.sd >= 0.0 || input.thickness <= 0.0 {
            return Vec3::ZERO;
        }
        let shape = input.shape();
        if shape <= 0.0 {
            return Vec3::ZERO;
        }
        let light = match self {
            LightingModel::Specular => specular(input),
            LightingModel::Adaptive => adaptive(input),
        };
        light * shape
    }
}

fn specular(input: &LightingInput) -> Vec3 {
    let n = input.normal;
    let dir = input.light_dir();
    let main = Vec3::new(dir.x, dir.y, 1.0).normalize();
    let opposite = Vec3::new(-dir.x, -dir.y, 1.0).normalize();

    let thickness_factor = (input.thickness / GLINT_THICKNESS).clamp(0.0, 1.0);
    let exponent = mix(GLINT_EXPONENT_RANGE.0, GLINT_EXPONENT_RANGE.1, thickness_factor);
    let rim = rim(n);

    let single = |l: Vec3| -> (f32, f32) {
        let n_dot_l = n.dot(l).max(0.0);
        let half = (l + Vec3::UP).normalize();
        let glint = n.dot(half).max(0.0).powf(exponent);
        let bleed = BLEED_WEIGHT * n_dot_l.powf(BLEED_EXPONENT) * (1.0 - input.normalized_height());
        (rim * n_dot_l + bleed, glint)
    };

    let (soft_a, glint_a) = single(main);
    let (soft_b, glint_b) = single(opposite);
    let soft = (soft_a + SECONDARY_LIGHT_WEIGHT * soft_b) * input.light_intensity
        + rim * input.ambient_strength;
    let glint = (glint_a + SECONDARY_LIGHT_WEIGHT * glint_b) * input.light_intensity;

    Vec3::new(soft, soft, soft) + GLINT_COLOR * glint
}

fn adaptive(input: &LightingInput) -> Vec3 {
    // No highlights on glass thinner than ~5px.
    let fade = smoothstep(5.0, 15.0, input.thickness);
    if fade <= 0.0 {
        return Vec3::ZERO;
    }

    let bg = input.background;
    let lum = luminance(bg).clamp(0.0, 1.0);
    let sat = saturation(bg);
    let gray = Vec3::new(lum, lum, lum);
    let desaturated = bg + (gray - bg) * (0.5 * sat);
    let whiten = mix(0.9, 0.5, lum);
    let highlight = desaturated + (Vec3::new(1.0, 1.0, 1.0) - desaturated) * whiten;

    let n = input.normal;
    let dir = input.light_dir();
    let facing = Vec2::new(n.x, n.y);
    let main = facing.dot(dir).max(0.0);
    let opposite = facing.dot(-dir).max(0.0);
    let rim = rim(n);

    let sigma = (input.thickness * 0.25).max(1.0);
    let falloff = (-(input.sd * input.sd) / (2.0 * sigma * sigma)).exp();

    let strength = ((main + SECONDARY_LIGHT_WEIGHT * opposite) * input.light_intensity
        + input.ambient_strength)
        * rim
        * falloff
        * fade;
    highlight * strength
}
