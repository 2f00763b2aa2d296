//! GPU renderer implementation
//!
//! Headless liquid glass renderer: uploads the captured frame, runs one
//! fullscreen glass pass and reads the result back into a [`SampledImage`].

use std::sync::mpsc;

use thiserror::Error;
use vitrum_core::{
    shading::DEFAULT_EDGE_BAND, AlphaMask, CapturedFrame, GeometryMode, GlassError,
    GlassSettings, LightingModel, SampledImage, Scene, MAX_SHAPES,
};

use crate::primitives::{encode_scene, GlassUniforms, GpuGlassShape};
use crate::shaders::{validate_shader, GLASS_ANALYTIC_SHADER, GLASS_MASK_SHADER};

/// Render target format; glass math runs on straight, non-sRGB values
pub const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Error type for renderer operations
#[derive(Error, Debug)]
pub enum RendererError {
    /// Failed to request GPU adapter
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,
    /// Failed to request GPU device
    #[error("failed to request GPU device: {0}")]
    DeviceError(#[from] wgpu::RequestDeviceError),
    /// Shader parse or validation error
    #[error("shader compilation error: {0}")]
    ShaderError(String),
    /// Mapping the readback buffer failed
    #[error("failed to read back render target: {0}")]
    ReadbackError(String),
    /// The frame or scene cannot be rendered
    #[error(transparent)]
    Glass(#[from] GlassError),
}

/// Configuration for creating a renderer
#[derive(Clone, Debug)]
pub struct RendererConfig {
    pub lighting: LightingModel,
    /// Half width of the analytic edge cross-fade band in pixels
    pub edge_band: f32,
    pub power_preference: wgpu::PowerPreference,
    /// Use a software adapter (useful on CI machines without a GPU)
    pub force_fallback_adapter: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            lighting: LightingModel::Specular,
            edge_band: DEFAULT_EDGE_BAND,
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
        }
    }
}

struct BindGroupLayouts {
    analytic: wgpu::BindGroupLayout,
    mask: wgpu::BindGroupLayout,
}

struct Pipelines {
    analytic: wgpu::RenderPipeline,
    mask: wgpu::RenderPipeline,
}

struct Buffers {
    uniforms: wgpu::Buffer,
    shapes: wgpu::Buffer,
}

/// Liquid glass renderer on a wgpu device
pub struct GpuGlassRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: RendererConfig,
    layouts: BindGroupLayouts,
    pipelines: Pipelines,
    buffers: Buffers,
    sampler: wgpu::Sampler,
}

impl GpuGlassRenderer {
    /// Create a headless renderer
    pub async fn new(config: RendererConfig) -> Result<Self, RendererError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: Self::preferred_backends(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: config.force_fallback_adapter,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;

        let info = adapter.get_info();
        tracing::info!(
            adapter = %info.name,
            backend = ?info.backend,
            "vitrum GPU adapter selected"
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Vitrum GPU Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        Self::from_device(device, queue, config)
    }

    /// Blocking variant of [`GpuGlassRenderer::new`]
    pub fn new_blocking(config: RendererConfig) -> Result<Self, RendererError> {
        pollster::block_on(Self::new(config))
    }

    /// Build pipelines on an existing device
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: RendererConfig,
    ) -> Result<Self, RendererError> {
        validate_shader(GLASS_ANALYTIC_SHADER)?;
        validate_shader(GLASS_MASK_SHADER)?;

        let analytic_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Glass Analytic Shader"),
            source: wgpu::ShaderSource::Wgsl(GLASS_ANALYTIC_SHADER.into()),
        });
        let mask_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Glass Mask Shader"),
            source: wgpu::ShaderSource::Wgsl(GLASS_MASK_SHADER.into()),
        });

        let layouts = Self::create_bind_group_layouts(&device);
        let pipelines = Self::create_pipelines(&device, &layouts, &analytic_shader, &mask_shader);

        let buffers = Buffers {
            uniforms: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Glass Uniforms Buffer"),
                size: std::mem::size_of::<GlassUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            shapes: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Glass Shapes Buffer"),
                size: (std::mem::size_of::<GpuGlassShape>() * MAX_SHAPES) as u64,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
        };

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Glass Backdrop Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            device,
            queue,
            config,
            layouts,
            pipelines,
            buffers,
            sampler,
        })
    }

    fn preferred_backends() -> wgpu::Backends {
        #[cfg(target_os = "macos")]
        {
            wgpu::Backends::METAL
        }
        #[cfg(target_os = "windows")]
        {
            wgpu::Backends::DX12
        }
        #[cfg(target_os = "linux")]
        {
            wgpu::Backends::VULKAN | wgpu::Backends::GL
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            wgpu::Backends::all()
        }
    }

    fn create_bind_group_layouts(device: &wgpu::Device) -> BindGroupLayouts {
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let common = [
            // Uniforms
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            // Shape table
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            // Background texture
            texture_entry(2),
            // Background sampler
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ];

        let analytic = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Glass Analytic Bind Group Layout"),
            entries: &common,
        });

        let mut mask_entries = common.to_vec();
        // Sharp and blurred coverage masks
        mask_entries.push(texture_entry(4));
        mask_entries.push(texture_entry(5));
        let mask = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Glass Mask Bind Group Layout"),
            entries: &mask_entries,
        });

        BindGroupLayouts { analytic, mask }
    }

    fn create_pipelines(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        analytic_shader: &wgpu::ShaderModule,
        mask_shader: &wgpu::ShaderModule,
    ) -> Pipelines {
        let create = |label: &str, layout: &wgpu::BindGroupLayout, module: &wgpu::ShaderModule| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: OUTPUT_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        Pipelines {
            analytic: create("Glass Analytic Pipeline", &layouts.analytic, analytic_shader),
            mask: create("Glass Mask Pipeline", &layouts.mask, mask_shader),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Render one frame; the scene is ignored in [`GeometryMode::Mask`]
    pub fn render(
        &self,
        mode: GeometryMode,
        scene: &Scene,
        settings: &GlassSettings,
        frame: &CapturedFrame,
    ) -> Result<SampledImage, RendererError> {
        frame.validate(mode == GeometryMode::Mask)?;
        let background = frame.background()?;
        let (width, height) = background.dimensions();
        // wgpu rejects zero-sized textures.
        if width == 0 || height == 0 {
            return Ok(background.clone());
        }

        tracing::debug!(
            ?mode,
            shapes = scene.len(),
            width,
            height,
            "rendering glass frame on GPU"
        );

        let shape_count = match mode {
            GeometryMode::Analytic => scene.len(),
            GeometryMode::Mask => 0,
        };
        let uniforms = GlassUniforms::new(
            settings,
            (width, height),
            shape_count,
            self.config.lighting,
            self.config.edge_band,
        );
        self.queue
            .write_buffer(&self.buffers.uniforms, 0, bytemuck::bytes_of(&uniforms));
        self.queue.write_buffer(
            &self.buffers.shapes,
            0,
            bytemuck::cast_slice(&encode_scene(scene)),
        );

        let background_texture = self.upload_background(background);
        let background_view = background_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: self.buffers.uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: self.buffers.shapes.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&background_view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            },
        ];

        let mask_views = match mode {
            GeometryMode::Analytic => None,
            GeometryMode::Mask => {
                let sharp = self.upload_mask(frame.foreground()?, "Glass Mask Texture");
                let blurred =
                    self.upload_mask(frame.blurred_foreground()?, "Glass Blurred Mask Texture");
                Some((
                    sharp.create_view(&wgpu::TextureViewDescriptor::default()),
                    blurred.create_view(&wgpu::TextureViewDescriptor::default()),
                ))
            }
        };
        if let Some((sharp, blurred)) = &mask_views {
            entries.push(wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::TextureView(sharp),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::TextureView(blurred),
            });
        }

        let (layout, pipeline) = match mode {
            GeometryMode::Analytic => (&self.layouts.analytic, &self.pipelines.analytic),
            GeometryMode::Mask => (&self.layouts.mask, &self.pipelines.mask),
        };
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Glass Bind Group"),
            layout,
            entries: &entries,
        });

        let target = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Glass Output Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Glass Render Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Glass Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        let pixels = self.read_texture(encoder, &target, width, height)?;
        let image = image::RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            RendererError::ReadbackError("readback size does not match the target".to_string())
        })?;
        Ok(SampledImage::from_rgba8(&image))
    }

    /// Render, falling back to the unmodified background on any error
    pub fn render_or_passthrough(
        &self,
        mode: GeometryMode,
        scene: &Scene,
        settings: &GlassSettings,
        frame: &CapturedFrame,
    ) -> Option<SampledImage> {
        match self.render(mode, scene, settings, frame) {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!("GPU glass render failed, passing background through: {}", e);
                frame.background().ok().cloned()
            }
        }
    }

    fn upload_background(&self, background: &SampledImage) -> wgpu::Texture {
        let (width, height) = background.dimensions();
        let data = background.to_rgba8();
        self.upload_texture(
            "Glass Background Texture",
            wgpu::TextureFormat::Rgba8Unorm,
            width,
            height,
            4,
            data.as_raw(),
        )
    }

    fn upload_mask(&self, mask: &AlphaMask, label: &str) -> wgpu::Texture {
        let (width, height) = mask.dimensions();
        let data: Vec<u8> = mask
            .buffer()
            .pixels()
            .map(|p| (p.0[0].clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();
        self.upload_texture(label, wgpu::TextureFormat::R8Unorm, width, height, 1, &data)
    }

    fn upload_texture(
        &self,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
        data: &[u8],
    ) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_pixel * width),
                rows_per_image: Some(height),
            },
            size,
        );
        texture
    }

    /// Copy an RGBA8 texture back to tightly packed rows
    fn read_texture(
        &self,
        mut encoder: wgpu::CommandEncoder,
        texture: &wgpu::Texture,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RendererError> {
        let unpadded_bytes_per_row = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Glass Readback Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| RendererError::ReadbackError(e.to_string()))?
            .map_err(|e| RendererError::ReadbackError(e.to_string()))?;

        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded_bytes_per_row as usize) {
                pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
            }
        }
        buffer.unmap();
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrum_core::{
        Color, FrameCapturer, GlassRenderer, RenderOptions, SceneBuilder, ShapeDescriptor, Size,
        Vec2,
    };

    fn gradient_background(width: u32, height: u32) -> SampledImage {
        let mut image = image::Rgba32FImage::new(width, height);
        for (x, y, p) in image.enumerate_pixels_mut() {
            *p = image::Rgba([x as f32 / width as f32, y as f32 / height as f32, 0.5, 1.0]);
        }
        SampledImage::new(image)
    }

    fn max_channel_diff(a: &SampledImage, b: &SampledImage) -> f32 {
        a.buffer()
            .pixels()
            .zip(b.buffer().pixels())
            .flat_map(|(p, q)| p.0.iter().zip(q.0.iter()).map(|(x, y)| (x - y).abs()).collect::<Vec<_>>())
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_config_defaults() {
        let config = RendererConfig::default();
        assert_eq!(config.lighting, LightingModel::Specular);
        assert_eq!(config.edge_band, DEFAULT_EDGE_BAND);
        assert!(!config.force_fallback_adapter);
    }

    #[test]
    fn test_glass_errors_convert() {
        let err: RendererError = GlassError::MissingImage(vitrum_core::ImageRole::Background).into();
        assert!(matches!(err, RendererError::Glass(_)));
        assert!(err.to_string().contains("background"));
    }

    #[test]
    #[ignore] // Requires GPU
    fn test_empty_scene_passes_background_through() {
        let renderer = GpuGlassRenderer::new_blocking(RendererConfig::default()).unwrap();
        let mut capturer = FrameCapturer::new();
        let frame = capturer.capture(gradient_background(64, 48), None);

        let image = renderer
            .render(GeometryMode::Analytic, &Scene::empty(), &GlassSettings::default(), &frame)
            .unwrap();
        let expected = SampledImage::from_rgba8(&frame.background().unwrap().to_rgba8());
        assert!(max_channel_diff(&image, &expected) < 1.0 / 255.0 + 1e-6);
    }

    #[test]
    #[ignore] // Requires GPU
    fn test_gpu_matches_cpu_reference() {
        let renderer = GpuGlassRenderer::new_blocking(RendererConfig::default()).unwrap();
        let scene = SceneBuilder::new()
            .shape(ShapeDescriptor::squircle(
                Vec2::new(64.0, 48.0),
                Size::new(80.0, 48.0),
                24.0,
            ))
            .build()
            .unwrap();
        let settings = GlassSettings::clear();

        let mut capturer = FrameCapturer::new();
        let background = SampledImage::from_rgba8(&gradient_background(128, 96).to_rgba8());
        let frame = capturer.capture(background, None);

        let gpu = renderer
            .render(GeometryMode::Analytic, &scene, &settings, &frame)
            .unwrap();
        let cpu = GlassRenderer::new(RenderOptions::default())
            .render_analytic(&scene, &settings, &frame)
            .unwrap();

        // Filtering precision and 8-bit quantization differ between paths.
        assert!(max_channel_diff(&gpu, &cpu) < 0.1);
    }

    #[test]
    #[ignore] // Requires GPU
    fn test_mask_mode_needs_foreground() {
        let renderer = GpuGlassRenderer::new_blocking(RendererConfig::default()).unwrap();
        let mut capturer = FrameCapturer::new();
        let frame = capturer.capture(SampledImage::solid(32, 32, Color::WHITE), None);

        let err = renderer
            .render(GeometryMode::Mask, &Scene::empty(), &GlassSettings::default(), &frame)
            .unwrap_err();
        assert!(matches!(err, RendererError::Glass(GlassError::MissingImage(_))));
    }

    #[test]
    #[ignore] // Requires GPU
    fn test_zero_sized_viewport_returns_background() {
        let renderer = GpuGlassRenderer::new_blocking(RendererConfig::default()).unwrap();
        let scene = SceneBuilder::new()
            .shape(ShapeDescriptor::squircle(Vec2::ZERO, Size::new(8.0, 8.0), 2.0))
            .build()
            .unwrap();
        let mut capturer = FrameCapturer::new();
        let frame = capturer.capture(SampledImage::solid(0, 16, Color::WHITE), None);

        let image = renderer
            .render(GeometryMode::Analytic, &scene, &GlassSettings::default(), &frame)
            .unwrap();
        assert_eq!(image.dimensions(), (0, 16));
    }
}
