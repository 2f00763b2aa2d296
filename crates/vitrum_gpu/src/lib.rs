//! Vitrum GPU Renderer
//!
//! Liquid glass rendering using wgpu. The fragment shaders implement the same
//! shading model as `vitrum_core`, so a frame rendered here matches the CPU
//! reference up to texture filtering precision.
//!
//! # Features
//!
//! - **Analytic Glass**: shape field composed in the fragment shader
//! - **Mask Glass**: normals reconstructed from captured coverage masks
//! - **Headless**: renders into an offscreen target and reads it back
//! - **Shader Validation**: WGSL checked with naga before pipeline creation

pub mod primitives;
pub mod renderer;
pub mod shaders;

pub use primitives::{encode_scene, GlassUniforms, GpuGlassShape, GpuLightingModel};
pub use renderer::{GpuGlassRenderer, RendererConfig, RendererError, OUTPUT_FORMAT};
pub use shaders::{validate_shader, GLASS_ANALYTIC_SHADER, GLASS_MASK_SHADER};
