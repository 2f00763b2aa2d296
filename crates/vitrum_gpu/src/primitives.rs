//! GPU primitive definitions
//!
//! These structures are uploaded to GPU buffers and must match the WGSL
//! declarations in `shaders.rs` byte for byte.

use vitrum_core::{
    GlassSettings, LightingModel, Scene, ShapeDescriptor, ShapeKind, MAX_SHAPES,
};

/// Lighting model selector (must match shader constants)
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GpuLightingModel {
    #[default]
    Specular = 0,
    Adaptive = 1,
}

impl From<LightingModel> for GpuLightingModel {
    fn from(model: LightingModel) -> Self {
        match model {
            LightingModel::Specular => GpuLightingModel::Specular,
            LightingModel::Adaptive => GpuLightingModel::Adaptive,
        }
    }
}

/// Uniform buffer for the glass shaders
///
/// Memory layout:
/// - viewport_size: `vec2<f32>` (8 bytes)
/// - shape_count: u32 (4 bytes)
/// - lighting_model: u32 (4 bytes)
/// - glass_color: `vec4<f32>` (16 bytes)
/// - params: `vec4<f32>` thickness, blur, chromatic_aberration, blend (16 bytes)
/// - light: `vec4<f32>` angle, intensity, ambient_strength, refractive_index (16 bytes)
/// - adjust: `vec4<f32>` saturation, lightness, edge_band, unused (16 bytes)
///
/// Total: 80 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlassUniforms {
    pub viewport_size: [f32; 2],
    pub shape_count: u32,
    pub lighting_model: u32,
    pub glass_color: [f32; 4],
    pub params: [f32; 4],
    pub light: [f32; 4],
    pub adjust: [f32; 4],
}

impl GlassUniforms {
    pub fn new(
        settings: &GlassSettings,
        viewport: (u32, u32),
        shape_count: usize,
        lighting: LightingModel,
        edge_band: f32,
    ) -> Self {
        Self {
            viewport_size: [viewport.0 as f32, viewport.1 as f32],
            shape_count: shape_count.min(MAX_SHAPES) as u32,
            lighting_model: GpuLightingModel::from(lighting) as u32,
            glass_color: settings.glass_color.to_array(),
            params: [
                settings.thickness,
                settings.blur,
                settings.chromatic_aberration,
                settings.blend,
            ],
            light: [
                settings.light_angle,
                settings.light_intensity,
                settings.ambient_strength,
                settings.refractive_index,
            ],
            adjust: [settings.saturation, settings.lightness, edge_band, 0.0],
        }
    }
}

/// A single glass shape in the storage buffer
///
/// Memory layout:
/// - bounds: `vec4<f32>` center x, center y, width, height (16 bytes)
/// - params: `vec4<f32>` corner_radius, kind code, unused, unused (16 bytes)
///
/// Total: 32 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuGlassShape {
    pub bounds: [f32; 4],
    pub params: [f32; 4],
}

impl GpuGlassShape {
    pub fn kind(&self) -> ShapeKind {
        ShapeKind::from_code(self.params[1].max(0.0).round() as u32)
    }
}

impl From<&ShapeDescriptor> for GpuGlassShape {
    fn from(shape: &ShapeDescriptor) -> Self {
        Self {
            bounds: [
                shape.center.x,
                shape.center.y,
                shape.size.width,
                shape.size.height,
            ],
            params: [shape.corner_radius, shape.kind.code() as f32, 0.0, 0.0],
        }
    }
}

/// Pack a scene into a fixed-size shape table
///
/// Unused slots stay zeroed, which the shader reads as `ShapeKind::None`.
pub fn encode_scene(scene: &Scene) -> Vec<GpuGlassShape> {
    let mut shapes = vec![GpuGlassShape::default(); MAX_SHAPES];
    for (slot, shape) in shapes.iter_mut().zip(scene.shapes()) {
        *slot = GpuGlassShape::from(shape);
    }
    shapes
}
