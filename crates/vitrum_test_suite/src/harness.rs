//! Glass scenario harness
//!
//! A [`TestContext`] paints the backdrop and coverage mask and lists the
//! glass shapes; [`TestHarness`] renders it on the CPU, writes the PNG and
//! checks it against a stored reference. Missing references are created
//! from the first render.

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba, Rgba32FImage, RgbaImage};
use std::path::{Path, PathBuf};

use vitrum_core::{
    Color, FrameCapturer, GeometryMode, GlassRenderer, GlassSettings, OverflowPolicy,
    RenderOptions, SampledImage, SceneBuilder, ShapeDescriptor,
};

/// Outcome of rendering one scenario against its reference
#[derive(Debug)]
pub enum TestResult {
    /// Within the threshold of the reference image
    Passed,
    /// No reference existed; the render became the reference
    PassedWithNewReference,
    /// `difference` is the mean per-channel error in 0..=1
    Failed { difference: f32, diff_path: PathBuf },
    /// The frame could not be rendered or saved
    Errored { message: String },
}

impl TestResult {
    pub fn is_passed(&self) -> bool {
        matches!(
            self,
            TestResult::Passed | TestResult::PassedWithNewReference
        )
    }
}

/// Everything one test case sets up before rendering
pub struct TestContext {
    /// `suite::case` name
    pub name: String,
    /// Viewport size in pixels
    pub size: (u32, u32),
    background: Rgba32FImage,
    foreground: Option<Rgba32FImage>,
    shapes: Vec<ShapeDescriptor>,
    /// Glass appearance for the frame
    pub settings: GlassSettings,
    /// Where the glass geometry comes from
    pub mode: GeometryMode,
    /// Renderer options (lighting model, blur kind, edge band)
    pub options: RenderOptions,
    /// Blur radius for the smoothed foreground mask
    pub mask_blur: Option<f32>,
}

impl TestContext {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            size: (width, height),
            background: ImageBuffer::from_pixel(width, height, Rgba([0.5, 0.5, 0.5, 1.0])),
            foreground: None,
            shapes: Vec::new(),
            settings: GlassSettings::default(),
            mode: GeometryMode::Analytic,
            options: RenderOptions {
                cache: false,
                ..Default::default()
            },
            mask_blur: None,
        }
    }

    pub fn width(&self) -> f32 {
        self.size.0 as f32
    }

    pub fn height(&self) -> f32 {
        self.size.1 as f32
    }

    /// Fill the whole background with one color
    pub fn fill_background(&mut self, color: Color) {
        let px = Rgba(color.to_array());
        for p in self.background.pixels_mut() {
            *p = px;
        }
    }

    /// Paint a solid axis-aligned rectangle into the background
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let px = Rgba(color.to_array());
        for_each_in_rect(&mut self.background, x, y, width, height, |p| *p = px);
    }

    /// Checkerboard of `cell`-pixel squares
    pub fn checkerboard(&mut self, cell: u32, a: Color, b: Color) {
        let cell = cell.max(1);
        for (x, y, p) in self.background.enumerate_pixels_mut() {
            let c = if (x / cell + y / cell) % 2 == 0 { a } else { b };
            *p = Rgba(c.to_array());
        }
    }

    /// Vertical gradient from `top` to `bottom`
    pub fn vertical_gradient(&mut self, top: Color, bottom: Color) {
        let h = self.size.1.max(1) as f32;
        for (_, y, p) in self.background.enumerate_pixels_mut() {
            let t = (y as f32 + 0.5) / h;
            *p = Rgba(Color::lerp(&top, &bottom, t).to_array());
        }
    }

    /// Add a glass shape to the analytic scene
    pub fn add_shape(&mut self, shape: ShapeDescriptor) -> &mut Self {
        self.shapes.push(shape);
        self
    }

    /// Paint an opaque rectangle into the foreground mask
    pub fn mask_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let (w, h) = self.size;
        let mask = self
            .foreground
            .get_or_insert_with(|| ImageBuffer::from_pixel(w, h, Rgba([0.0, 0.0, 0.0, 0.0])));
        for_each_in_rect(mask, x, y, width, height, |p| *p = Rgba([1.0, 1.0, 1.0, 1.0]));
    }

    /// Paint an opaque ellipse into the foreground mask
    pub fn mask_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        let (w, h) = self.size;
        let mask = self
            .foreground
            .get_or_insert_with(|| ImageBuffer::from_pixel(w, h, Rgba([0.0, 0.0, 0.0, 0.0])));
        for (x, y, p) in mask.enumerate_pixels_mut() {
            let dx = (x as f32 + 0.5 - cx) / rx.max(1e-3);
            let dy = (y as f32 + 0.5 - cy) / ry.max(1e-3);
            if dx * dx + dy * dy <= 1.0 {
                *p = Rgba([1.0, 1.0, 1.0, 1.0]);
            }
        }
    }

    /// Background as currently painted
    pub fn background(&self) -> SampledImage {
        SampledImage::new(self.background.clone())
    }
}

fn for_each_in_rect(
    image: &mut Rgba32FImage,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    mut f: impl FnMut(&mut Rgba<f32>),
) {
    let (w, h) = image.dimensions();
    let x0 = x.max(0.0).floor() as u32;
    let y0 = y.max(0.0).floor() as u32;
    let x1 = ((x + width).max(0.0).ceil() as u32).min(w);
    let y1 = ((y + height).max(0.0).ceil() as u32).min(h);
    for py in y0..y1 {
        for px in x0..x1 {
            f(image.get_pixel_mut(px, py));
        }
    }
}

/// Visual test harness
pub struct TestHarness {
    output_dir: PathBuf,
    reference_dir: PathBuf,
    default_size: (u32, u32),
    threshold: f32,
}

impl TestHarness {
    /// Harness writing under `test_output/`
    pub fn new() -> Result<Self> {
        Self::with_config(TestHarnessConfig::default())
    }

    /// Harness with explicit directories; both are created if missing
    pub fn with_config(config: TestHarnessConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;
        std::fs::create_dir_all(&config.reference_dir)
            .with_context(|| format!("Failed to create {}", config.reference_dir.display()))?;

        Ok(Self {
            output_dir: config.output_dir,
            reference_dir: config.reference_dir,
            default_size: config.default_size,
            threshold: config.threshold,
        })
    }

    pub fn default_size(&self) -> (u32, u32) {
        self.default_size
    }

    /// Create a test context with the default size
    pub fn create_context(&self, name: &str) -> TestContext {
        TestContext::new(name, self.default_size.0, self.default_size.1)
    }

    /// Create a test context with a custom size
    pub fn create_context_with_size(&self, name: &str, width: u32, height: u32) -> TestContext {
        TestContext::new(name, width, height)
    }

    /// Capture the context's frame and render the glass over it
    pub fn render(ctx: &TestContext) -> Result<RgbaImage> {
        let scene = SceneBuilder::new()
            .with_policy(OverflowPolicy::Truncate)
            .extend(ctx.shapes.iter().copied())
            .build()
            .context("Invalid test scene")?;

        let mut capturer = FrameCapturer::new();
        if let Some(radius) = ctx.mask_blur {
            capturer = capturer.with_foreground_blur(radius);
        }
        let foreground = ctx.foreground.clone().map(SampledImage::new);
        let frame = capturer.capture(ctx.background(), foreground.as_ref());

        let mut renderer = GlassRenderer::new(ctx.options);
        let image = renderer
            .render(ctx.mode, &scene, &ctx.settings, &frame)
            .with_context(|| format!("Failed to render '{}'", ctx.name))?;
        Ok(image.to_rgba8())
    }

    /// Mean absolute channel error over all pixels, in 0..=1
    ///
    /// Images of different sizes count as entirely different.
    pub fn compare_images(img1: &RgbaImage, img2: &RgbaImage) -> f32 {
        if img1.dimensions() != img2.dimensions() {
            return 1.0;
        }

        let (width, height) = img1.dimensions();
        let total_pixels = (width as f64) * (height as f64);
        if total_pixels == 0.0 {
            return 0.0;
        }

        let diff_sum: f64 = img1
            .pixels()
            .zip(img2.pixels())
            .map(|(p1, p2)| {
                let channel = |i: usize| (p1[i] as f64 - p2[i] as f64).abs() / 255.0;
                (channel(0) + channel(1) + channel(2) + channel(3)) / 4.0
            })
            .sum();

        (diff_sum / total_pixels) as f32
    }

    /// Pixels whose RGB differs by more than 2 levels in red, the rest dimmed
    pub fn generate_diff_image(img1: &RgbaImage, img2: &RgbaImage) -> Option<RgbaImage> {
        if img1.dimensions() != img2.dimensions() {
            return None;
        }

        let (width, height) = img1.dimensions();
        let diff = ImageBuffer::from_fn(width, height, |x, y| {
            let p1 = img1.get_pixel(x, y);
            let p2 = img2.get_pixel(x, y);
            let max_diff = (0..3)
                .map(|i| (p1[i] as i32 - p2[i] as i32).abs())
                .max()
                .unwrap_or(0);

            if max_diff > 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([p1[0] / 3, p1[1] / 3, p1[2] / 3, 128])
            }
        });

        Some(diff)
    }

    /// [`run_test_with_size`](Self::run_test_with_size) at the default viewport
    pub fn run_test<F>(&self, name: &str, setup: F) -> Result<TestResult>
    where
        F: FnOnce(&mut TestContext),
    {
        self.run_test_with_size(name, self.default_size.0, self.default_size.1, setup)
    }

    /// Set up a `width`x`height` scenario, render it, save the PNG and compare
    pub fn run_test_with_size<F>(
        &self,
        name: &str,
        width: u32,
        height: u32,
        setup: F,
    ) -> Result<TestResult>
    where
        F: FnOnce(&mut TestContext),
    {
        let mut ctx = self.create_context_with_size(name, width, height);
        setup(&mut ctx);
        tracing::info!(
            case = name,
            shapes = ctx.shapes.len(),
            mode = ?ctx.mode,
            width,
            height,
            "rendering"
        );

        let output = Self::render(&ctx)?;
        let output_path = self.output_path(name);
        output
            .save(&output_path)
            .with_context(|| format!("Failed to save {}", output_path.display()))?;

        self.compare_with_reference(name, &output, &output_path)
    }

    fn compare_with_reference(
        &self,
        name: &str,
        output: &RgbaImage,
        output_path: &Path,
    ) -> Result<TestResult> {
        let reference_path = self.reference_path(name);
        if !reference_path.exists() {
            std::fs::copy(output_path, &reference_path).with_context(|| {
                format!("Failed to store reference {}", reference_path.display())
            })?;
            tracing::info!(case = name, path = %reference_path.display(), "new reference");
            return Ok(TestResult::PassedWithNewReference);
        }

        let reference = image::open(&reference_path)
            .with_context(|| format!("Failed to read reference {}", reference_path.display()))?
            .to_rgba8();
        let difference = Self::compare_images(output, &reference);
        if difference <= self.threshold {
            tracing::debug!(case = name, difference, "matches reference");
            return Ok(TestResult::Passed);
        }

        let diff_path = self.diff_path(name);
        if let Some(diff) = Self::generate_diff_image(output, &reference) {
            if let Err(err) = diff.save(&diff_path) {
                tracing::warn!(case = name, "could not write diff image: {}", err);
            }
        }
        Ok(TestResult::Failed {
            difference,
            diff_path,
        })
    }

    /// `references/suite__case.png`
    pub fn reference_path(&self, name: &str) -> PathBuf {
        self.reference_dir.join(format!("{}.png", file_stem(name)))
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.png", file_stem(name)))
    }

    pub fn diff_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}_diff.png", file_stem(name)))
    }
}

/// `suite::case` names become `suite__case` file names
fn file_stem(name: &str) -> String {
    name.replace("::", "__")
}

/// Where the harness writes images and how strict it compares
#[derive(Debug, Clone)]
pub struct TestHarnessConfig {
    /// Rendered PNGs and diff images
    pub output_dir: PathBuf,
    /// Stored references, one PNG per `suite::case`
    pub reference_dir: PathBuf,
    /// Viewport for cases that do not set their own
    pub default_size: (u32, u32),
    /// Largest [`TestHarness::compare_images`] value that still passes
    pub threshold: f32,
}

impl Default for TestHarnessConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("test_output"),
            reference_dir: PathBuf::from("test_output/references"),
            default_size: (400, 300),
            threshold: 0.001, // 0.1% difference allowed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrum_core::{Size, Vec2};

    fn temp_harness(tag: &str) -> TestHarness {
        let root = std::env::temp_dir().join(format!(
            "vitrum_harness_{}_{}",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);
        TestHarness::with_config(TestHarnessConfig {
            output_dir: root.clone(),
            reference_dir: root.join("references"),
            default_size: (64, 48),
            threshold: 0.001,
        })
        .unwrap()
    }

    #[test]
    fn test_compare_identical_images() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
        assert_eq!(TestHarness::compare_images(&img, &img), 0.0);
    }

    #[test]
    fn test_compare_size_mismatch() {
        let a = RgbaImage::new(8, 8);
        let b = RgbaImage::new(4, 8);
        assert_eq!(TestHarness::compare_images(&a, &b), 1.0);
        assert!(TestHarness::generate_diff_image(&a, &b).is_none());
    }

    #[test]
    fn test_compare_opposite_images() {
        let a = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let b = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        assert!((TestHarness::compare_images(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_diff_image_marks_changed_pixels() {
        let a = RgbaImage::from_pixel(2, 1, Rgba([90, 90, 90, 255]));
        let mut b = a.clone();
        b.put_pixel(1, 0, Rgba([200, 90, 90, 255]));

        let diff = TestHarness::generate_diff_image(&a, &b).unwrap();
        assert_eq!(diff.get_pixel(0, 0), &Rgba([30, 30, 30, 128]));
        assert_eq!(diff.get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_context_painting() {
        let mut ctx = TestContext::new("paint", 10, 10);
        ctx.fill_background(Color::BLACK);
        ctx.fill_rect(2.0, 2.0, 3.0, 3.0, Color::RED);

        let bg = ctx.background();
        assert_eq!(bg.pixel(3, 3), Color::RED);
        assert_eq!(bg.pixel(6, 6), Color::BLACK);
    }

    #[test]
    fn test_mask_painting_creates_foreground() {
        let mut ctx = TestContext::new("mask", 10, 10);
        assert!(ctx.foreground.is_none());
        ctx.mask_ellipse(5.0, 5.0, 3.0, 3.0);

        let mask = ctx.foreground.as_ref().unwrap();
        assert_eq!(mask.get_pixel(5, 5).0[3], 1.0);
        assert_eq!(mask.get_pixel(0, 0).0[3], 0.0);
    }

    #[test]
    fn test_run_creates_then_matches_reference() {
        let harness = temp_harness("reference");
        let setup = |ctx: &mut TestContext| {
            ctx.vertical_gradient(Color::BLUE, Color::WHITE);
            ctx.add_shape(ShapeDescriptor::squircle(
                Vec2::new(32.0, 24.0),
                Size::new(40.0, 24.0),
                12.0,
            ));
        };

        let first = harness.run_test("glass::pill", setup).unwrap();
        assert!(matches!(first, TestResult::PassedWithNewReference));
        assert!(harness.reference_path("glass::pill").exists());

        let second = harness.run_test("glass::pill", setup).unwrap();
        assert!(matches!(second, TestResult::Passed));
    }

    #[test]
    fn test_run_detects_regression() {
        let harness = temp_harness("regression");
        harness
            .run_test("glass::regress", |ctx| ctx.fill_background(Color::BLACK))
            .unwrap();

        let result = harness
            .run_test("glass::regress", |ctx| ctx.fill_background(Color::WHITE))
            .unwrap();
        match result {
            TestResult::Failed {
                difference,
                diff_path,
            } => {
                assert!(difference > 0.5);
                assert!(diff_path.exists());
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
