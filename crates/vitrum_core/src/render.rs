//! CPU glass renderer
//!
//! Shades every pixel of the viewport through [`shade`], rows in parallel.
//! Inputs are a frozen snapshot for the duration of a call: the validated
//! [`Scene`], the [`GlassSettings`] value and a [`CapturedFrame`].

use std::borrow::Cow;

use image::ImageBuffer;
use rayon::prelude::*;

use crate::blur::gaussian_blur_image;
use crate::capture::CapturedFrame;
use crate::error::Result;
use crate::geometry::{Color, Vec2};
use crate::image::SampledImage;
use crate::lighting::LightingModel;
use crate::scene::Scene;
use crate::settings::GlassSettings;
use crate::shading::{
    shade, AnalyticSurface, GeometrySource, MaskSurface, ShadeParams, DEFAULT_EDGE_BAND,
    MIN_THICKNESS,
};

/// Where the glass geometry comes from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GeometryMode {
    /// Composed SDF of the scene's shapes
    #[default]
    Analytic,
    /// Sharp and blurred foreground coverage masks
    Mask,
}

/// How `GlassSettings::blur` is applied to the refracted background
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlurMode {
    /// Inline 13-tap approximation per refracted sample
    #[default]
    Kawase,
    /// Full separable Gaussian over the background, once per frame
    Gaussian,
}

/// Renderer configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    pub lighting: LightingModel,
    pub blur_mode: BlurMode,
    /// Half width of the edge cross-fade band in pixels
    pub edge_band: f32,
    /// Reuse the previous image when scene, settings and frame are unchanged
    pub cache: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            lighting: LightingModel::Specular,
            blur_mode: BlurMode::Kawase,
            edge_band: DEFAULT_EDGE_BAND,
            cache: true,
        }
    }
}

struct CachedFrame {
    mode: GeometryMode,
    scene: Scene,
    settings: GlassSettings,
    frame_id: u64,
    image: SampledImage,
}

/// Renders liquid glass over a captured background
pub struct GlassRenderer {
    options: RenderOptions,
    cached: Option<CachedFrame>,
}

impl Default for GlassRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl GlassRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            cached: None,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Replace the options; drops the cached image
    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
        self.cached = None;
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Render the scene's composed SDF over the frame background
    pub fn render_analytic(
        &mut self,
        scene: &Scene,
        settings: &GlassSettings,
        frame: &CapturedFrame,
    ) -> Result<SampledImage> {
        self.render(GeometryMode::Analytic, scene, settings, frame)
    }

    /// Render the frame's foreground masks as glass
    pub fn render_raster(
        &mut self,
        settings: &GlassSettings,
        frame: &CapturedFrame,
    ) -> Result<SampledImage> {
        self.render(GeometryMode::Mask, &Scene::empty(), settings, frame)
    }

    /// Render one frame; the scene is ignored in [`GeometryMode::Mask`]
    pub fn render(
        &mut self,
        mode: GeometryMode,
        scene: &Scene,
        settings: &GlassSettings,
        frame: &CapturedFrame,
    ) -> Result<SampledImage> {
        frame.validate(mode == GeometryMode::Mask)?;
        let background = frame.background()?;

        if self.options.cache {
            if let Some(cached) = &self.cached {
                if cached.mode == mode
                    && cached.frame_id == frame.id()
                    && cached.settings == *settings
                    && (mode == GeometryMode::Mask || cached.scene == *scene)
                {
                    tracing::trace!(frame = frame.id(), "glass cache hit");
                    return Ok(cached.image.clone());
                }
            }
        }

        let (width, height) = background.dimensions();
        tracing::debug!(
            ?mode,
            shapes = scene.len(),
            width,
            height,
            lighting = ?self.options.lighting,
            "rendering glass frame"
        );

        let image = match mode {
            GeometryMode::Analytic if scene.is_empty() => background.clone(),
            GeometryMode::Analytic => {
                let geometry = AnalyticSurface {
                    scene,
                    blend: settings.blend,
                    edge_band: self.options.edge_band,
                };
                self.shade_frame(&geometry, settings, background)
            }
            GeometryMode::Mask => {
                let geometry = MaskSurface {
                    sharp: frame.foreground()?,
                    blurred: frame.blurred_foreground()?,
                };
                self.shade_frame(&geometry, settings, background)
            }
        };

        if self.options.cache {
            self.cached = Some(CachedFrame {
                mode,
                scene: scene.clone(),
                settings: *settings,
                frame_id: frame.id(),
                image: image.clone(),
            });
        }
        Ok(image)
    }

    /// Like [`render`](Self::render), but degrades to the unmodified
    /// background when the frame cannot be rendered
    pub fn render_or_passthrough(
        &mut self,
        mode: GeometryMode,
        scene: &Scene,
        settings: &GlassSettings,
        frame: &CapturedFrame,
    ) -> SampledImage {
        match self.render(mode, scene, settings, frame) {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(error = %err, "glass frame dropped, passing background through");
                match frame.background() {
                    Ok(background) => background.clone(),
                    Err(_) => SampledImage::solid(0, 0, Color::TRANSPARENT),
                }
            }
        }
    }

    fn shade_frame<G: GeometrySource>(
        &self,
        geometry: &G,
        settings: &GlassSettings,
        background: &SampledImage,
    ) -> SampledImage {
        let (width, height) = background.dimensions();
        let too_thin = settings.thickness.is_nan() || settings.thickness < MIN_THICKNESS;
        if width == 0 || height == 0 || too_thin {
            return background.clone();
        }

        let source: Cow<'_, SampledImage> = match self.options.blur_mode {
            BlurMode::Gaussian if settings.blur > 0.0 => {
                Cow::Owned(gaussian_blur_image(background, settings.blur))
            }
            _ => Cow::Borrowed(background),
        };
        let kawase_radius = match self.options.blur_mode {
            BlurMode::Kawase => settings.blur.max(0.0),
            BlurMode::Gaussian => 0.0,
        };
        let params = ShadeParams {
            settings,
            lighting: self.options.lighting,
            viewport: Vec2::new(width as f32, height as f32),
            kawase_radius,
        };

        let stride = width as usize * 4;
        let mut data = vec![0.0f32; stride * height as usize];
        data.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
            for x in 0..width as usize {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let bg = background.pixel(x as i64, y as i64);
                let color = shade(geometry, &params, p, bg, |uv| source.sample(uv));
                row[x * 4..x * 4 + 4].copy_from_slice(&color.to_array());
            }
        });

        match ImageBuffer::from_raw(width, height, data) {
            Some(buffer) => SampledImage::new(buffer),
            None => background.clone(),
        }
    }
}
