//! Sampleable CPU images
//!
//! [`SampledImage`] holds straight-alpha RGBA in `f32` and [`AlphaMask`] a
//! single coverage channel. Both are addressed by normalized UV with pixel
//! centers at `(i + 0.5) / width`, bilinear filtering and clamp-to-edge.

use image::{ImageBuffer, Luma, Rgba, Rgba32FImage, RgbaImage};

use crate::geometry::{Color, Vec2};

/// Single-channel `f32` buffer
pub type AlphaBuffer = ImageBuffer<Luma<f32>, Vec<f32>>;

/// RGBA image in normalized float channels
#[derive(Clone, Debug, PartialEq)]
pub struct SampledImage {
    buffer: Rgba32FImage,
}

impl SampledImage {
    pub fn new(buffer: Rgba32FImage) -> Self {
        Self { buffer }
    }

    /// Image filled with one color
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let px = Rgba(color.to_array());
        Self::new(ImageBuffer::from_pixel(width, height, px))
    }

    pub fn from_rgba8(image: &RgbaImage) -> Self {
        let buffer = ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
            let p = image.get_pixel(x, y).0;
            Rgba([
                p[0] as f32 / 255.0,
                p[1] as f32 / 255.0,
                p[2] as f32 / 255.0,
                p[3] as f32 / 255.0,
            ])
        });
        Self::new(buffer)
    }

    pub fn from_dynamic(image: &image::DynamicImage) -> Self {
        Self::from_rgba8(&image.to_rgba8())
    }

    /// Quantize back to 8-bit, clamping out-of-range channels
    pub fn to_rgba8(&self) -> RgbaImage {
        ImageBuffer::from_fn(self.width(), self.height(), |x, y| {
            let p = self.buffer.get_pixel(x, y).0;
            Rgba(p.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
        })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn buffer(&self) -> &Rgba32FImage {
        &self.buffer
    }

    pub fn into_buffer(self) -> Rgba32FImage {
        self.buffer
    }

    /// Exact texel, clamped to the image bounds
    pub fn pixel(&self, x: i64, y: i64) -> Color {
        if self.buffer.width() == 0 || self.buffer.height() == 0 {
            return Color::TRANSPARENT;
        }
        let x = x.clamp(0, self.width() as i64 - 1) as u32;
        let y = y.clamp(0, self.height() as i64 - 1) as u32;
        Color::from_array(self.buffer.get_pixel(x, y).0)
    }

    /// Bilinear sample at normalized `uv`
    pub fn sample(&self, uv: Vec2) -> Color {
        let Some(taps) = BilinearTaps::new(uv, self.width(), self.height()) else {
            return Color::TRANSPARENT;
        };
        let c00 = self.pixel(taps.x0, taps.y0).to_array();
        let c10 = self.pixel(taps.x0 + 1, taps.y0).to_array();
        let c01 = self.pixel(taps.x0, taps.y0 + 1).to_array();
        let c11 = self.pixel(taps.x0 + 1, taps.y0 + 1).to_array();
        let mut out = [0.0; 4];
        for i in 0..4 {
            out[i] = taps.blend(c00[i], c10[i], c01[i], c11[i]);
        }
        Color::from_array(out)
    }

    /// Alpha channel as a mask
    pub fn alpha_mask(&self) -> AlphaMask {
        let buffer = ImageBuffer::from_fn(self.width(), self.height(), |x, y| {
            Luma([self.buffer.get_pixel(x, y).0[3]])
        });
        AlphaMask::new(buffer)
    }
}

/// Coverage mask in 0..=1
#[derive(Clone, Debug, PartialEq)]
pub struct AlphaMask {
    buffer: AlphaBuffer,
}

impl AlphaMask {
    pub fn new(buffer: AlphaBuffer) -> Self {
        Self { buffer }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        Self::new(ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)])))
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn buffer(&self) -> &AlphaBuffer {
        &self.buffer
    }

    /// Size of one texel in UV units
    pub fn texel_size(&self) -> Vec2 {
        Vec2::new(
            1.0 / self.width().max(1) as f32,
            1.0 / self.height().max(1) as f32,
        )
    }

    pub fn value(&self, x: i64, y: i64) -> f32 {
        if self.buffer.width() == 0 || self.buffer.height() == 0 {
            return 0.0;
        }
        let x = x.clamp(0, self.width() as i64 - 1) as u32;
        let y = y.clamp(0, self.height() as i64 - 1) as u32;
        self.buffer.get_pixel(x, y).0[0]
    }

    pub fn sample(&self, uv: Vec2) -> f32 {
        let Some(taps) = BilinearTaps::new(uv, self.width(), self.height()) else {
            return 0.0;
        };
        taps.blend(
            self.value(taps.x0, taps.y0),
            self.value(taps.x0 + 1, taps.y0),
            self.value(taps.x0, taps.y0 + 1),
            self.value(taps.x0 + 1, taps.y0 + 1),
        )
    }
}

struct BilinearTaps {
    x0: i64,
    y0: i64,
    fx: f32,
    fy: f32,
}

impl BilinearTaps {
    fn new(uv: Vec2, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || !uv.x.is_finite() || !uv.y.is_finite() {
            return None;
        }
        let x = uv.x * width as f32 - 0.5;
        let y = uv.y * height as f32 - 0.5;
        let fx0 = x.floor();
        let fy0 = y.floor();
        Some(Self {
            x0: fx0 as i64,
            y0: fy0 as i64,
            fx: x - fx0,
            fy: y - fy0,
        })
    }

    fn blend(&self, c00: f32, c10: f32, c01: f32, c11: f32) -> f32 {
        let top = c00 + (c10 - c00) * self.fx;
        let bottom = c01 + (c11 - c01) * self.fx;
        top + (bottom - top) * self.fy
    }
}
