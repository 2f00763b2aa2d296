//! Background and mask blurs
//!
//! [`kawase13`] is the cheap fixed-tap approximation used inline during
//! refraction. The separable Gaussian passes produce full-filter copies:
//! the blurred foreground mask for raster mode, and the pre-blurred
//! background for [`BlurMode::Gaussian`](crate::render::BlurMode::Gaussian).

use image::ImageBuffer;
use rayon::prelude::*;

use crate::geometry::{Color, Vec2};
use crate::image::{AlphaMask, SampledImage};

const KAWASE_CENTER_WEIGHT: f32 = 0.2;
const KAWASE_INNER_WEIGHT: f32 = 0.1;
const KAWASE_OUTER_WEIGHT: f32 = 0.05;

/// 13-tap two-ring blur around `uv`
///
/// One center tap, four diagonal taps at half the radius and eight taps on
/// a ring at the full radius. `radius` is in UV units per axis.
pub fn kawase13(uv: Vec2, radius: Vec2, sample: impl Fn(Vec2) -> Color) -> Color {
    let mut acc = scaled(sample(uv), KAWASE_CENTER_WEIGHT);

    let half = radius * 0.5;
    for (sx, sy) in [(1.0, 1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
        let offset = Vec2::new(half.x * sx, half.y * sy);
        acc = add(acc, scaled(sample(uv + offset), KAWASE_INNER_WEIGHT));
    }

    for i in 0..8 {
        let angle = i as f32 * std::f32::consts::FRAC_PI_4;
        let offset = Vec2::new(radius.x * angle.cos(), radius.y * angle.sin());
        acc = add(acc, scaled(sample(uv + offset), KAWASE_OUTER_WEIGHT));
    }
    acc
}

fn scaled(c: Color, w: f32) -> Color {
    Color::rgba(c.r * w, c.g * w, c.b * w, c.a * w)
}

fn add(a: Color, b: Color) -> Color {
    Color::rgba(a.r + b.r, a.g + b.g, a.b + b.b, a.a + b.a)
}

/// Normalized 1D Gaussian weights for a blur of `radius` pixels
///
/// The kernel spans `ceil(radius)` taps each side with sigma = radius / 2.
/// A non-positive radius gives the identity kernel.
pub fn gaussian_kernel(radius: f32) -> Vec<f32> {
    if radius.is_nan() || radius <= 0.0 {
        return vec![1.0];
    }
    let half = radius.ceil() as i32;
    let sigma = (radius * 0.5).max(1.0e-3);
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Separable Gaussian blur of a coverage mask
pub fn gaussian_blur_alpha(mask: &AlphaMask, radius: f32) -> AlphaMask {
    let (w, h) = mask.dimensions();
    let kernel = gaussian_kernel(radius);
    if kernel.len() == 1 || w == 0 || h == 0 {
        return mask.clone();
    }
    let data = separable(mask.buffer().as_raw(), w as usize, h as usize, 1, &kernel);
    match ImageBuffer::from_raw(w, h, data) {
        Some(buffer) => AlphaMask::new(buffer),
        None => mask.clone(),
    }
}

/// Separable Gaussian blur of an RGBA image, all four channels
pub fn gaussian_blur_image(image: &SampledImage, radius: f32) -> SampledImage {
    let (w, h) = image.dimensions();
    let kernel = gaussian_kernel(radius);
    if kernel.len() == 1 || w == 0 || h == 0 {
        return image.clone();
    }
    let data = separable(image.buffer().as_raw(), w as usize, h as usize, 4, &kernel);
    match ImageBuffer::from_raw(w, h, data) {
        Some(buffer) => SampledImage::new(buffer),
        None => image.clone(),
    }
}

fn separable(src: &[f32], w: usize, h: usize, channels: usize, kernel: &[f32]) -> Vec<f32> {
    let mut tmp = vec![0.0; src.len()];
    let mut out = vec![0.0; src.len()];
    let half = (kernel.len() / 2) as isize;
    let stride = w * channels;

    // Horizontal
    tmp.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        let line = &src[y * stride..(y + 1) * stride];
        for x in 0..w {
            for c in 0..channels {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - half).clamp(0, w as isize - 1) as usize;
                    acc += line[sx * channels + c] * weight;
                }
                row[x * channels + c] = acc;
            }
        }
    });

    // Vertical
    out.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        for (k, weight) in kernel.iter().enumerate() {
            let sy = (y as isize + k as isize - half).clamp(0, h as isize - 1) as usize;
            let line = &tmp[sy * stride..(sy + 1) * stride];
            for (dst, v) in row.iter_mut().zip(line) {
                *dst += v * weight;
            }
        }
    });

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kawase_weights_sum_to_one() {
        let c = kawase13(Vec2::new(0.5, 0.5), Vec2::new(0.1, 0.1), |_| Color::WHITE);
        assert!((c.r - 1.0).abs() < 1e-5);
        assert!((c.a - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_kawase_zero_radius_is_point_sample() {
        let uv = Vec2::new(0.3, 0.7);
        let c = kawase13(uv, Vec2::ZERO, |p| Color::rgb(p.x, p.y, 0.0));
        assert!((c.r - 0.3).abs() < 1e-5);
        assert!((c.g - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_kawase_tap_count() {
        let taps = std::cell::Cell::new(0);
        kawase13(Vec2::ZERO, Vec2::ONE, |_| {
            taps.set(taps.get() + 1);
            Color::BLACK
        });
        assert_eq!(taps.get(), 13);
    }

    #[test]
    fn test_gaussian_kernel_normalized_and_symmetric() {
        let k = gaussian_kernel(4.0);
        assert_eq!(k.len(), 9);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((k[0] - k[8]).abs() < 1e-7);
        assert!(k[4] > k[3]);
        assert_eq!(gaussian_kernel(0.0), vec![1.0]);
    }

    #[test]
    fn test_blur_preserves_constant_mask() {
        let mask = AlphaMask::from_fn(16, 9, |_, _| 0.75);
        let blurred = gaussian_blur_alpha(&mask, 3.0);
        for y in 0..9 {
            for x in 0..16 {
                assert!((blurred.value(x, y) - 0.75).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_blur_spreads_edge() {
        let mask = AlphaMask::from_fn(32, 1, |x, _| if x < 16 { 1.0 } else { 0.0 });
        let blurred = gaussian_blur_alpha(&mask, 4.0);
        let inner = blurred.value(15, 0);
        let outer = blurred.value(16, 0);
        assert!(inner < 1.0 && inner > 0.5);
        assert!(outer > 0.0 && outer < 0.5);
        assert!((blurred.value(0, 0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_blur_image_keeps_size() {
        let img = SampledImage::solid(10, 6, Color::rgba(0.2, 0.4, 0.6, 1.0));
        let out = gaussian_blur_image(&img, 2.5);
        assert_eq!(out.dimensions(), (10, 6));
        let c = out.pixel(5, 3);
        assert!((c.b - 0.6).abs() < 1e-5);
    }
}
