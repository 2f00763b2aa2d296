//! Vitrum CLI
//!
//! Render liquid glass scenes described in TOML over a PNG background.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vitrum_core::{
    Color, FrameCapturer, GeometryMode, GlassRenderer, SampledImage, UniformBlock,
};
use vitrum_gpu::{GpuGlassRenderer, RendererConfig};

mod config;

use config::SceneFile;

#[derive(Parser)]
#[command(name = "vitrum")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Liquid glass renderer", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a scene file to a PNG
    Render {
        /// Scene file
        scene: PathBuf,

        /// Output PNG
        #[arg(short, long, default_value = "glass.png")]
        output: PathBuf,

        /// Background PNG, overriding the scene file
        #[arg(short, long)]
        background: Option<PathBuf>,

        /// Render on the GPU instead of the CPU reference renderer
        #[arg(long)]
        gpu: bool,
    },

    /// Print the flat uniform block of a scene as JSON
    Uniforms {
        /// Scene file
        scene: PathBuf,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate a scene file without rendering
    Check {
        /// Scene file
        scene: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Render {
            scene,
            output,
            background,
            gpu,
        } => cmd_render(&scene, &output, background.as_deref(), gpu),

        Commands::Uniforms { scene, pretty } => cmd_uniforms(&scene, pretty),

        Commands::Check { scene } => cmd_check(&scene),
    }
}

fn cmd_render(
    scene_path: &Path,
    output: &Path,
    background_override: Option<&Path>,
    gpu: bool,
) -> Result<()> {
    let file = SceneFile::load(scene_path)?;
    let scene = file.scene()?;
    let settings = file.settings();
    let mode = file.render.geometry_mode();
    let (width, height) = (file.viewport.width, file.viewport.height);

    let background = match background_override {
        Some(path) => load_image(path, width, height)?,
        None => match &file.viewport.background {
            Some(path) => load_image(&file.resolve(path), width, height)?,
            None => SampledImage::solid(
                width,
                height,
                Color::from_array(file.viewport.background_color),
            ),
        },
    };

    let foreground = match &file.render.mask {
        Some(path) => Some(load_image(&file.resolve(path), width, height)?),
        None if mode == GeometryMode::Mask => {
            anyhow::bail!("Mask mode needs a foreground image: set `mask` in [render]")
        }
        None => None,
    };

    let mut capturer = FrameCapturer::new();
    if let Some(radius) = file.render.mask_blur {
        capturer = capturer.with_foreground_blur(radius);
    }
    let frame = capturer.capture(background, foreground.as_ref());

    info!(
        "Rendering {} shapes at {}x{} ({:?}, {})",
        scene.len(),
        width,
        height,
        mode,
        if gpu { "gpu" } else { "cpu" }
    );

    let image = if gpu {
        let renderer = GpuGlassRenderer::new_blocking(RendererConfig {
            lighting: file.render.lighting_model(),
            edge_band: file.render.edge_band,
            ..Default::default()
        })?;
        renderer.render(mode, &scene, &settings, &frame)?
    } else {
        let mut renderer = GlassRenderer::new(file.render.render_options());
        renderer.render(mode, &scene, &settings, &frame)?
    };

    image
        .to_rgba8()
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Wrote {}", output.display());
    Ok(())
}

fn cmd_uniforms(scene_path: &Path, pretty: bool) -> Result<()> {
    let file = SceneFile::load(scene_path)?;
    let scene = file.scene()?;
    let block = UniformBlock::encode(&file.settings(), &scene);

    let mut settings = serde_json::Map::new();
    for (name, value) in block.named_settings() {
        settings.insert(name.to_string(), serde_json::json!(value));
    }
    let shapes: Vec<[f32; 6]> = scene.shapes().iter().map(|s| s.to_uniforms()).collect();

    let json = serde_json::json!({
        "settings": settings,
        "shapes": shapes,
        "values": block.values(),
    });

    let text = if pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    println!("{}", text);
    Ok(())
}

fn cmd_check(scene_path: &Path) -> Result<()> {
    let file = SceneFile::load(scene_path)?;
    info!("Checking scene: {}", scene_path.display());

    let scene = file.scene()?;
    if scene.truncated() > 0 {
        warn!(
            "{} shapes beyond the limit will be ignored",
            scene.truncated()
        );
    }

    for path in file
        .viewport
        .background
        .iter()
        .chain(file.render.mask.iter())
    {
        let resolved = file.resolve(path);
        if !resolved.exists() {
            anyhow::bail!("Image not found: {}", resolved.display());
        }
    }
    if file.render.geometry_mode() == GeometryMode::Mask && file.render.mask.is_none() {
        anyhow::bail!("Mask mode needs a foreground image: set `mask` in [render]");
    }

    let settings = file.settings();
    if settings.thickness < vitrum_core::shading::MIN_THICKNESS {
        warn!(
            "Thickness {} is below {}; glass will render as plain background",
            settings.thickness,
            vitrum_core::shading::MIN_THICKNESS
        );
    }

    println!("Scene OK");
    println!("  viewport: {}x{}", file.viewport.width, file.viewport.height);
    println!("  shapes:   {}", scene.len());
    println!("  mode:     {:?}", file.render.geometry_mode());
    println!("  lighting: {:?}", file.render.lighting_model());
    Ok(())
}

/// Load a PNG and resize it to the viewport if needed
fn load_image(path: &Path, width: u32, height: u32) -> Result<SampledImage> {
    let image =
        image::open(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let image = if image.width() != width || image.height() != height {
        warn!(
            "{} is {}x{}, resizing to {}x{}",
            path.display(),
            image.width(),
            image.height(),
            width,
            height
        );
        image.resize_exact(width, height, image::imageops::FilterType::Triangle)
    } else {
        image
    };
    Ok(SampledImage::from_dynamic(&image))
}
