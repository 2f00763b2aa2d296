//! Vitrum Core
//!
//! Liquid glass rendering on the CPU:
//!
//! - **SDF Primitives**: closed-form rounded rect, squircle, ellipse and box fields
//! - **Scene Composition**: smooth-minimum union of up to 64 shapes
//! - **Normal Reconstruction**: analytic SDF derivatives or multi-scale Sobel on alpha masks
//! - **Shading**: height profile, Snell refraction with chromatic splitting, lighting, tint
//! - **Capture**: per-frame background and foreground snapshots with generation stamps
//!
//! # Example
//!
//! ```rust
//! use vitrum_core::{
//!     Color, FrameCapturer, GlassRenderer, GlassSettings, SampledImage, SceneBuilder,
//!     ShapeDescriptor, Size, Vec2,
//! };
//!
//! let scene = SceneBuilder::new()
//!     .shape(ShapeDescriptor::squircle(Vec2::new(64.0, 48.0), Size::new(96.0, 56.0), 24.0))
//!     .build()
//!     .unwrap();
//!
//! let mut capturer = FrameCapturer::new();
//! let frame = capturer.capture(SampledImage::solid(128, 96, Color::rgb(0.1, 0.4, 0.9)), None);
//!
//! let mut renderer = GlassRenderer::default();
//! let image = renderer
//!     .render_analytic(&scene, &GlassSettings::frosted(), &frame)
//!     .unwrap();
//! assert_eq!(image.dimensions(), (128, 96));
//! ```

pub mod blur;
pub mod capture;
pub mod color;
pub mod error;
pub mod geometry;
pub mod image;
pub mod lighting;
pub mod normal;
pub mod render;
pub mod scene;
pub mod sdf;
pub mod settings;
pub mod shading;
pub mod shape;

pub use capture::{CapturedFrame, FrameCapturer, FrameGuard, ImageRole};
pub use error::{GlassError, Result};
pub use geometry::{Color, Size, Vec2, Vec3};
pub use self::image::{AlphaMask, SampledImage};
pub use lighting::LightingModel;
pub use render::{BlurMode, GeometryMode, GlassRenderer, RenderOptions};
pub use scene::{OverflowPolicy, Scene, SceneBuilder, MAX_SHAPES};
pub use settings::{GlassSettings, UniformBlock, SETTINGS_UNIFORM_NAMES};
pub use shading::{shade, AnalyticSurface, GeometrySource, MaskSurface, SurfaceSample};
pub use shape::{ShapeDescriptor, ShapeKind};
