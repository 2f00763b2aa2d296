//! Color math used by the tint and lighting stages

use crate::geometry::{mix, Color, Vec3};

/// Rec. 709 luma weights
pub const LUMA: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

/// Perceived brightness of an RGB triple
pub fn luminance(rgb: Vec3) -> f32 {
    rgb.dot(LUMA)
}

/// HSL saturation of an RGB triple, in 0..=1
pub fn saturation(rgb: Vec3) -> f32 {
    rgb_to_hsl(rgb).y
}

/// Convert RGB to (hue, saturation, lightness), all in 0..=1
pub fn rgb_to_hsl(rgb: Vec3) -> Vec3 {
    let max = rgb.x.max(rgb.y).max(rgb.z);
    let min = rgb.x.min(rgb.y).min(rgb.z);
    let l = (max + min) * 0.5;
    let delta = max - min;
    if delta < 1.0e-6 {
        return Vec3::new(0.0, 0.0, l);
    }

    let s = if l < 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min).max(1.0e-6)
    };

    let h = if max == rgb.x {
        (rgb.y - rgb.z) / delta + if rgb.y < rgb.z { 6.0 } else { 0.0 }
    } else if max == rgb.y {
        (rgb.z - rgb.x) / delta + 2.0
    } else {
        (rgb.x - rgb.y) / delta + 4.0
    };

    Vec3::new(h / 6.0, s, l)
}

/// Inverse of [`rgb_to_hsl`]
pub fn hsl_to_rgb(hsl: Vec3) -> Vec3 {
    let (h, s, l) = (hsl.x, hsl.y, hsl.z);
    if s <= 0.0 {
        return Vec3::new(l, l, l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Vec3::new(
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Scale HSL saturation and lightness; factors of 1 are the identity
pub fn adjust_saturation_lightness(rgb: Vec3, saturation: f32, lightness: f32) -> Vec3 {
    if saturation == 1.0 && lightness == 1.0 {
        return rgb;
    }
    let hsl = rgb_to_hsl(rgb);
    hsl_to_rgb(Vec3::new(
        hsl.x,
        (hsl.y * saturation).clamp(0.0, 1.0),
        (hsl.z * lightness).clamp(0.0, 1.0),
    ))
}

/// Apply the glass tint to a refracted color
///
/// Dark tints multiply the color down toward the tint, light tints screen
/// it up. The tint alpha is the blend strength; `color.a` is untouched.
pub fn apply_tint(color: Color, tint: Color) -> Color {
    let strength = tint.a.clamp(0.0, 1.0);
    if strength <= 0.0 {
        return color;
    }
    let c = color.rgb_vec();
    let t = tint.rgb_vec();
    let blended = if luminance(t) < 0.5 {
        Vec3::new(c.x * t.x, c.y * t.y, c.z * t.z)
    } else {
        Vec3::new(
            1.0 - (1.0 - c.x) * (1.0 - t.x),
            1.0 - (1.0 - c.y) * (1.0 - t.y),
            1.0 - (1.0 - c.z) * (1.0 - t.z),
        )
    };
    Color::rgba(
        mix(c.x, blended.x, strength),
        mix(c.y, blended.y, strength),
        mix(c.z, blended.z, strength),
        color.a,
    )
}
