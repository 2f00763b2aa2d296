//! Glass material settings and the flat uniform surface
//!
//! [`GlassSettings`] is an immutable value compared by structural equality;
//! renderers diff it against the previous frame instead of mutating a
//! program in place. [`GlassSettings::to_uniforms`] is the one serialization
//! step into the numeric parameter list the shaders consume.

use std::f32::consts::PI;

use crate::error::{GlassError, Result};
use crate::geometry::Color;
use crate::scene::{Scene, MAX_SHAPES};

/// Names of the settings uniforms, in upload order
pub const SETTINGS_UNIFORM_NAMES: [&str; SETTINGS_UNIFORM_COUNT] = [
    "glassColorR",
    "glassColorG",
    "glassColorB",
    "glassColorA",
    "thickness",
    "blur",
    "chromaticAberration",
    "blend",
    "lightAngle",
    "lightIntensity",
    "ambientStrength",
    "refractiveIndex",
    "saturation",
    "lightness",
    "shapeCount",
];

/// Number of scalar settings uniforms (shape count included)
pub const SETTINGS_UNIFORM_COUNT: usize = 15;

/// Number of scalars per shape slot
pub const SHAPE_UNIFORM_STRIDE: usize = 6;

/// Material parameters of the glass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlassSettings {
    /// Tint applied after refraction; alpha is the tint strength
    pub glass_color: Color,
    /// Depth of the height profile in device pixels
    pub thickness: f32,
    /// Background blur radius
    pub blur: f32,
    /// Per-channel refractive index spread
    pub chromatic_aberration: f32,
    /// Smooth-union radius between shapes
    pub blend: f32,
    /// Light azimuth in radians
    pub light_angle: f32,
    /// Specular / rim strength
    pub light_intensity: f32,
    /// Non-directional light floor
    pub ambient_strength: f32,
    /// Base index of refraction
    pub refractive_index: f32,
    /// Saturation factor seen through the glass (1 = identity)
    pub saturation: f32,
    /// Lightness factor seen through the glass (1 = identity)
    pub lightness: f32,
}

impl Default for GlassSettings {
    fn default() -> Self {
        Self {
            glass_color: Color::rgba(1.0, 1.0, 1.0, 0.0),
            thickness: 20.0,
            blur: 0.0,
            chromatic_aberration: 0.01,
            blend: 20.0,
            light_angle: 0.5 * PI,
            light_intensity: 0.5,
            ambient_strength: 0.0,
            refractive_index: 1.2,
            saturation: 1.5,
            lightness: 1.0,
        }
    }
}

impl GlassSettings {
    /// Clear glass: refraction and highlights only
    pub fn clear() -> Self {
        Self {
            saturation: 1.0,
            chromatic_aberration: 0.0,
            ..Default::default()
        }
    }

    /// Frosted glass with a blurred background
    pub fn frosted() -> Self {
        Self {
            blur: 12.0,
            glass_color: Color::rgba(1.0, 1.0, 1.0, 0.15),
            ambient_strength: 0.3,
            ..Default::default()
        }
    }

    /// Thick tinted glass
    pub fn tinted(color: Color) -> Self {
        Self {
            glass_color: color,
            thickness: 32.0,
            refractive_index: 1.5,
            light_intensity: 0.8,
            ..Default::default()
        }
    }

    pub fn with_glass_color(mut self, color: Color) -> Self {
        self.glass_color = color;
        self
    }

    pub fn with_thickness(mut self, thickness: f32) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn with_blur(mut self, blur: f32) -> Self {
        self.blur = blur;
        self
    }

    pub fn with_chromatic_aberration(mut self, amount: f32) -> Self {
        self.chromatic_aberration = amount;
        self
    }

    pub fn with_blend(mut self, blend: f32) -> Self {
        self.blend = blend;
        self
    }

    /// Light azimuth in radians
    /// 0 = light from the right, PI/2 = from below, -PI/2 = from above
    pub fn with_light_angle(mut self, radians: f32) -> Self {
        self.light_angle = radians;
        self
    }

    pub fn with_light_angle_degrees(mut self, degrees: f32) -> Self {
        self.light_angle = degrees.to_radians();
        self
    }

    pub fn with_light_intensity(mut self, intensity: f32) -> Self {
        self.light_intensity = intensity;
        self
    }

    pub fn with_ambient_strength(mut self, strength: f32) -> Self {
        self.ambient_strength = strength;
        self
    }

    pub fn with_refractive_index(mut self, index: f32) -> Self {
        self.refractive_index = index;
        self
    }

    pub fn with_saturation(mut self, saturation: f32) -> Self {
        self.saturation = saturation;
        self
    }

    pub fn with_lightness(mut self, lightness: f32) -> Self {
        self.lightness = lightness;
        self
    }

    /// Interpolate every field, e.g. to animate between two materials
    pub fn lerp(a: &GlassSettings, b: &GlassSettings, t: f32) -> GlassSettings {
        let t = t.clamp(0.0, 1.0);
        let f = |x: f32, y: f32| x + (y - x) * t;
        GlassSettings {
            glass_color: Color::lerp(&a.glass_color, &b.glass_color, t),
            thickness: f(a.thickness, b.thickness),
            blur: f(a.blur, b.blur),
            chromatic_aberration: f(a.chromatic_aberration, b.chromatic_aberration),
            blend: f(a.blend, b.blend),
            light_angle: f(a.light_angle, b.light_angle),
            light_intensity: f(a.light_intensity, b.light_intensity),
            ambient_strength: f(a.ambient_strength, b.ambient_strength),
            refractive_index: f(a.refractive_index, b.refractive_index),
            saturation: f(a.saturation, b.saturation),
            lightness: f(a.lightness, b.lightness),
        }
    }

    /// Settings scalars in [`SETTINGS_UNIFORM_NAMES`] order, minus the shape count
    pub fn to_uniforms(&self) -> [f32; SETTINGS_UNIFORM_COUNT - 1] {
        [
            self.glass_color.r,
            self.glass_color.g,
            self.glass_color.b,
            self.glass_color.a,
            self.thickness,
            self.blur,
            self.chromatic_aberration,
            self.blend,
            self.light_angle,
            self.light_intensity,
            self.ambient_strength,
            self.refractive_index,
            self.saturation,
            self.lightness,
        ]
    }

    pub fn from_uniforms(values: &[f32]) -> Result<Self> {
        let expected = SETTINGS_UNIFORM_COUNT - 1;
        if values.len() != expected {
            return Err(GlassError::InvalidUniforms {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            glass_color: Color::rgba(values[0], values[1], values[2], values[3]),
            thickness: values[4],
            blur: values[5],
            chromatic_aberration: values[6],
            blend: values[7],
            light_angle: values[8],
            light_intensity: values[9],
            ambient_strength: values[10],
            refractive_index: values[11],
            saturation: values[12],
            lightness: values[13],
        })
    }
}

/// Complete flat parameter list of one frame
///
/// Layout: the settings scalars, the shape count, then [`MAX_SHAPES`] slots
/// of (kind, centerX, centerY, sizeW, sizeH, cornerRadius).
#[derive(Clone, Debug, PartialEq)]
pub struct UniformBlock {
    values: Vec<f32>,
}

impl UniformBlock {
    /// Total number of scalars in a block
    pub const LEN: usize = SETTINGS_UNIFORM_COUNT + MAX_SHAPES * SHAPE_UNIFORM_STRIDE;

    pub fn encode(settings: &GlassSettings, scene: &Scene) -> Self {
        let mut values = Vec::with_capacity(Self::LEN);
        values.extend_from_slice(&settings.to_uniforms());
        values.push(scene.len() as f32);
        values.extend(scene.encode_shapes());
        Self { values }
    }

    pub fn from_values(values: Vec<f32>) -> Result<Self> {
        if values.len() != Self::LEN {
            return Err(GlassError::InvalidUniforms {
                expected: Self::LEN,
                actual: values.len(),
            });
        }
        Ok(Self { values })
    }

    pub fn decode(&self) -> Result<(GlassSettings, Scene)> {
        let settings = GlassSettings::from_uniforms(&self.values[..SETTINGS_UNIFORM_COUNT - 1])?;
        let scene = Scene::decode_shapes(
            &self.values[SETTINGS_UNIFORM_COUNT..],
            self.shape_count()?,
        )?;
        Ok((settings, scene))
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// The encoded `shapeCount` slot
    pub fn shape_count(&self) -> Result<usize> {
        let value = self.values[SETTINGS_UNIFORM_COUNT - 1];
        if !(0.0..=MAX_SHAPES as f32).contains(&value) || value.fract() != 0.0 {
            return Err(GlassError::InvalidShapeCount {
                value,
                max: MAX_SHAPES,
            });
        }
        Ok(value as usize)
    }

    /// Named view of the settings part, for debugging and tooling
    pub fn named_settings(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        SETTINGS_UNIFORM_NAMES
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}
