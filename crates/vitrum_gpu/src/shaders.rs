//! WGSL shader sources for liquid glass rendering
//!
//! Both shaders share one prelude (uniforms, fullscreen triangle, SDF
//! composition, refraction, color adjustment and lighting) and differ only
//! in where the surface comes from:
//!
//! - [`GLASS_ANALYTIC_SHADER`]: composed shape field, normals from central differences
//! - [`GLASS_MASK_SHADER`]: sharp and blurred coverage masks, normals from multi-scale Sobel

use crate::renderer::RendererError;

macro_rules! glass_prelude {
    () => {
        r#"
// ============================================================================
// Shared glass prelude
// ============================================================================

struct GlassUniforms {
    viewport_size: vec2<f32>,
    shape_count: u32,
    lighting_model: u32,
    glass_color: vec4<f32>,
    // thickness, blur, chromatic_aberration, blend
    params: vec4<f32>,
    // light_angle, light_intensity, ambient_strength, refractive_index
    light: vec4<f32>,
    // saturation, lightness, edge_band, unused
    adjust: vec4<f32>,
}

struct GlassShape {
    // center x, center y, width, height
    bounds: vec4<f32>,
    // corner_radius, kind, unused, unused
    params: vec4<f32>,
}

const SHAPE_NONE: u32 = 0u;
const SHAPE_SQUIRCLE: u32 = 1u;
const SHAPE_ELLIPSE: u32 = 2u;
const SHAPE_ROUNDED_RECT: u32 = 3u;
const MAX_SHAPES: u32 = 64u;

const LIGHTING_SPECULAR: u32 = 0u;
const LIGHTING_ADAPTIVE: u32 = 1u;

const PI: f32 = 3.14159265;
const FAR_DISTANCE: f32 = 1.0e9;
const SDF_EPSILON: f32 = 1.0e-4;
const MIN_THICKNESS: f32 = 0.01;
const REFRACTION_DEPTH: f32 = 8.0;
const CHROMATIC_THRESHOLD: f32 = 0.001;
const SQUIRCLE_EXPONENT: f32 = 2.0;
const SECONDARY_LIGHT_WEIGHT: f32 = 0.8;
const GLINT_THICKNESS: f32 = 40.0;
const GLINT_COLOR: vec3<f32> = vec3<f32>(1.0, 1.0, 0.97);

@group(0) @binding(0) var<uniform> uniforms: GlassUniforms;
@group(0) @binding(1) var<storage, read> shapes: array<GlassShape>;
@group(0) @binding(2) var background_texture: texture_2d<f32>;
@group(0) @binding(3) var background_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

// Fullscreen triangle, no vertex buffer
@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    let x = f32((vertex_index << 1u) & 2u);
    let y = f32(vertex_index & 2u);
    var out: VertexOutput;
    out.position = vec4<f32>(x * 2.0 - 1.0, 1.0 - y * 2.0, 0.0, 1.0);
    out.uv = vec2<f32>(x, y);
    return out;
}

// ----------------------------------------------------------------------------
// Signed distance fields
// ----------------------------------------------------------------------------

fn clamp_radius(radius: f32, half_size: vec2<f32>) -> f32 {
    return min(max(radius, 0.0), max(min(half_size.x, half_size.y), 0.0));
}

fn sd_rounded_rect(p: vec2<f32>, half_size: vec2<f32>, radius: f32) -> f32 {
    let r = clamp_radius(radius, half_size);
    let q = abs(p) - half_size + vec2<f32>(r);
    return length(max(q, vec2<f32>(0.0))) + min(max(q.x, q.y), 0.0) - r;
}

fn sd_squircle(p: vec2<f32>, half_size: vec2<f32>, radius: f32, exponent: f32) -> f32 {
    let r = clamp_radius(radius, half_size);
    let q = abs(p) - half_size + vec2<f32>(r);
    let m = max(q, vec2<f32>(0.0));
    var corner = length(m);
    if (exponent != 2.0) {
        let n = max(exponent, 1.0);
        let s = max(m.x, m.y);
        corner = 0.0;
        if (s > 0.0) {
            corner = s * pow(pow(m.x / s, n) + pow(m.y / s, n), 1.0 / n);
        }
    }
    return corner + min(max(q.x, q.y), 0.0) - r;
}

fn sd_ellipse(p: vec2<f32>, radii: vec2<f32>) -> f32 {
    let r = max(radii, vec2<f32>(SDF_EPSILON));
    let k1 = length(p / (r * r));
    if (k1 < SDF_EPSILON) {
        return -min(r.x, r.y);
    }
    let k0 = length(p / r);
    return k0 * (k0 - 1.0) / k1;
}

fn shape_distance(shape: GlassShape, p: vec2<f32>) -> f32 {
    let kind = u32(max(shape.params.y, 0.0) + 0.5);
    let size = shape.bounds.zw;
    var d = FAR_DISTANCE;
    if (kind == SHAPE_NONE || size.x <= 0.0 || size.y <= 0.0) {
        return d;
    }
    let q = p - shape.bounds.xy;
    let half_size = size * 0.5;
    switch kind {
        case 1u: {
            d = sd_squircle(q, half_size, shape.params.x, SQUIRCLE_EXPONENT);
        }
        case 2u: {
            d = sd_ellipse(q, half_size);
        }
        case 3u: {
            d = sd_rounded_rect(q, half_size, shape.params.x);
        }
        default: {
            d = FAR_DISTANCE;
        }
    }
    return d;
}

fn smooth_union(d1: f32, d2: f32, k: f32) -> f32 {
    if (k <= 0.0) {
        return min(d1, d2);
    }
    let e = max(k - abs(d1 - d2), 0.0);
    return min(d1, d2) - e * e / (4.0 * k);
}

fn scene_distance(p: vec2<f32>) -> f32 {
    let count = min(uniforms.shape_count, MAX_SHAPES);
    if (count == 0u) {
        return FAR_DISTANCE;
    }
    var d = shape_distance(shapes[0], p);
    for (var i = 1u; i < count; i++) {
        d = smooth_union(d, shape_distance(shapes[i], p), uniforms.params.w);
    }
    return d;
}

// ----------------------------------------------------------------------------
// Refraction
// ----------------------------------------------------------------------------

// Quarter-circle bevel: 0 outside, `thickness` once deep enough
fn glass_height(sd: f32, thickness: f32) -> f32 {
    if (sd >= 0.0) {
        return 0.0;
    }
    if (sd < -thickness) {
        return thickness;
    }
    let x = thickness + sd;
    return sqrt(max(thickness * thickness - x * x, 0.0));
}

fn refraction_offset(normal: vec3<f32>, height: f32, thickness: f32, ior: f32) -> vec2<f32> {
    let r = refract(vec3<f32>(0.0, 0.0, -1.0), normal, 1.0 / max(ior, 1.0e-4));
    return r.xy * ((height + REFRACTION_DEPTH * thickness) / max(abs(r.z), 1.0e-3));
}

fn sample_background(uv: vec2<f32>) -> vec4<f32> {
    return textureSampleLevel(background_texture, background_sampler, uv, 0.0);
}

fn background_texel(p: vec2<f32>) -> vec4<f32> {
    let dims = vec2<i32>(textureDimensions(background_texture));
    let texel = clamp(vec2<i32>(floor(p)), vec2<i32>(0), dims - vec2<i32>(1));
    return textureLoad(background_texture, texel, 0);
}

// 13-tap dual-Kawase style blur, `radius` in UV units
fn kawase13(uv: vec2<f32>, radius: vec2<f32>) -> vec4<f32> {
    var acc = sample_background(uv) * 0.2;
    let h = radius * 0.5;
    acc += sample_background(uv + vec2<f32>(-h.x, -h.y)) * 0.1;
    acc += sample_background(uv + vec2<f32>(h.x, -h.y)) * 0.1;
    acc += sample_background(uv + vec2<f32>(-h.x, h.y)) * 0.1;
    acc += sample_background(uv + vec2<f32>(h.x, h.y)) * 0.1;
    for (var i = 0; i < 8; i++) {
        let a = f32(i) * PI * 0.25;
        acc += sample_background(uv + vec2<f32>(radius.x * cos(a), radius.y * sin(a))) * 0.05;
    }
    return acc;
}

fn tap(uv: vec2<f32>) -> vec4<f32> {
    let blur = uniforms.params.y;
    if (blur > 0.0) {
        return kawase13(uv, vec2<f32>(blur) / uniforms.viewport_size);
    }
    return sample_background(uv);
}

fn sample_refracted(uv: vec2<f32>, normal: vec3<f32>, height: f32) -> vec4<f32> {
    let thickness = uniforms.params.x;
    let k = uniforms.params.z;
    let ior = uniforms.light.w;
    let viewport = uniforms.viewport_size;

    // Green carries the canonical displacement and the alpha.
    let g = tap(uv + refraction_offset(normal, height, thickness, ior) / viewport);
    if (k <= CHROMATIC_THRESHOLD) {
        return g;
    }
    let r = tap(uv + refraction_offset(normal, height, thickness, ior - 0.04 * k) / viewport);
    let b = tap(uv + refraction_offset(normal, height, thickness, ior + 0.08 * k) / viewport);
    return vec4<f32>(r.r, g.g, b.b, g.a);
}

// ----------------------------------------------------------------------------
// Color
// ----------------------------------------------------------------------------

fn luminance(c: vec3<f32>) -> f32 {
    return dot(c, vec3<f32>(0.2126, 0.7152, 0.0722));
}

fn rgb_to_hsl(c: vec3<f32>) -> vec3<f32> {
    let max_c = max(max(c.r, c.g), c.b);
    let min_c = min(min(c.r, c.g), c.b);
    let l = (max_c + min_c) * 0.5;
    let delta = max_c - min_c;
    if (delta < 1.0e-6) {
        return vec3<f32>(0.0, 0.0, l);
    }

    var s = delta / max(2.0 - max_c - min_c, 1.0e-6);
    if (l < 0.5) {
        s = delta / (max_c + min_c);
    }

    var h = (c.r - c.g) / delta + 4.0;
    if (max_c == c.r) {
        h = (c.g - c.b) / delta;
        if (c.g < c.b) {
            h += 6.0;
        }
    } else if (max_c == c.g) {
        h = (c.b - c.r) / delta + 2.0;
    }
    return vec3<f32>(h / 6.0, s, l);
}

fn hue_to_channel(p: f32, q: f32, hue: f32) -> f32 {
    let t = fract(hue);
    if (t < 1.0 / 6.0) {
        return p + (q - p) * 6.0 * t;
    }
    if (t < 0.5) {
        return q;
    }
    if (t < 2.0 / 3.0) {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    return p;
}

fn hsl_to_rgb(hsl: vec3<f32>) -> vec3<f32> {
    if (hsl.y <= 0.0) {
        return vec3<f32>(hsl.z);
    }
    var q = hsl.z + hsl.y - hsl.z * hsl.y;
    if (hsl.z < 0.5) {
        q = hsl.z * (1.0 + hsl.y);
    }
    let p = 2.0 * hsl.z - q;
    return vec3<f32>(
        hue_to_channel(p, q, hsl.x + 1.0 / 3.0),
        hue_to_channel(p, q, hsl.x),
        hue_to_channel(p, q, hsl.x - 1.0 / 3.0),
    );
}

fn adjust_saturation_lightness(c: vec3<f32>, saturation: f32, lightness: f32) -> vec3<f32> {
    if (saturation == 1.0 && lightness == 1.0) {
        return c;
    }
    let hsl = rgb_to_hsl(c);
    return hsl_to_rgb(vec3<f32>(
        hsl.x,
        clamp(hsl.y * saturation, 0.0, 1.0),
        clamp(hsl.z * lightness, 0.0, 1.0),
    ));
}

// Multiply for dark tints, screen for light ones
fn apply_tint(c: vec4<f32>, tint: vec4<f32>) -> vec4<f32> {
    let strength = clamp(tint.a, 0.0, 1.0);
    var blended = vec3<f32>(1.0) - (vec3<f32>(1.0) - c.rgb) * (vec3<f32>(1.0) - tint.rgb);
    if (luminance(tint.rgb) < 0.5) {
        blended = c.rgb * tint.rgb;
    }
    return vec4<f32>(mix(c.rgb, blended, vec3<f32>(strength)), c.a);
}

// ----------------------------------------------------------------------------
// Lighting
// ----------------------------------------------------------------------------

fn rim_term(n: vec3<f32>) -> f32 {
    let f = max(1.0 - clamp(n.z, 0.0, 1.0), 0.0);
    return f * f * f;
}

fn light_dir() -> vec2<f32> {
    return vec2<f32>(cos(uniforms.light.x), sin(uniforms.light.x));
}

// Returns (soft, glint) for one light
fn specular_terms(n: vec3<f32>, l: vec3<f32>, rim: f32, exponent: f32, normalized_height: f32) -> vec2<f32> {
    let n_dot_l = max(dot(n, l), 0.0);
    let half_vector = normalize(l + vec3<f32>(0.0, 0.0, 1.0));
    let glint = pow(max(dot(n, half_vector), 0.0), exponent);
    let bleed = 0.2 * pow(n_dot_l, 4.0) * (1.0 - normalized_height);
    return vec2<f32>(rim * n_dot_l + bleed, glint);
}

fn specular_light(n: vec3<f32>, thickness: f32, normalized_height: f32) -> vec3<f32> {
    let dir = light_dir();
    let main_light = normalize(vec3<f32>(dir, 1.0));
    let opposite_light = normalize(vec3<f32>(-dir, 1.0));
    let exponent = mix(120.0, 200.0, clamp(thickness / GLINT_THICKNESS, 0.0, 1.0));
    let rim = rim_term(n);

    let a = specular_terms(n, main_light, rim, exponent, normalized_height);
    let b = specular_terms(n, opposite_light, rim, exponent, normalized_height);
    let intensity = uniforms.light.y;
    let soft = (a.x + SECONDARY_LIGHT_WEIGHT * b.x) * intensity + rim * uniforms.light.z;
    let glint = (a.y + SECONDARY_LIGHT_WEIGHT * b.y) * intensity;
    return vec3<f32>(soft) + GLINT_COLOR * glint;
}

fn adaptive_light(n: vec3<f32>, sd: f32, thickness: f32, background: vec3<f32>) -> vec3<f32> {
    let fade = smoothstep(5.0, 15.0, thickness);
    let lum = clamp(luminance(background), 0.0, 1.0);
    let sat = rgb_to_hsl(background).y;
    let desaturated = mix(background, vec3<f32>(lum), vec3<f32>(0.5 * sat));
    let highlight = mix(desaturated, vec3<f32>(1.0), vec3<f32>(mix(0.9, 0.5, lum)));

    let dir = light_dir();
    let main_light = max(dot(n.xy, dir), 0.0);
    let opposite_light = max(dot(n.xy, -dir), 0.0);
    let sigma = max(thickness * 0.25, 1.0);
    let falloff = exp(-(sd * sd) / (2.0 * sigma * sigma));

    let strength = ((main_light + SECONDARY_LIGHT_WEIGHT * opposite_light) * uniforms.light.y
        + uniforms.light.z) * rim_term(n) * falloff * fade;
    return highlight * strength;
}

fn glass_lighting(n: vec3<f32>, sd: f32, height: f32, thickness: f32, background: vec3<f32>) -> vec3<f32> {
    if (sd >= 0.0 || thickness <= 0.0) {
        return vec3<f32>(0.0);
    }
    let normalized_height = clamp(height / thickness, 0.0, 1.0);
    let shape = smoothstep(0.0, 0.1, normalized_height);
    var light = specular_light(n, thickness, normalized_height);
    if (uniforms.lighting_model == LIGHTING_ADAPTIVE) {
        light = adaptive_light(n, sd, thickness, background);
    }
    return light * shape;
}

// ----------------------------------------------------------------------------
// Composite
// ----------------------------------------------------------------------------

fn shade_glass(uv: vec2<f32>, sd: f32, normal: vec3<f32>, coverage: f32, adjust_color: bool, background: vec4<f32>) -> vec4<f32> {
    let thickness = uniforms.params.x;
    let h = glass_height(sd, thickness);
    let refracted = sample_refracted(uv, normal, h);

    var rgb = refracted.rgb;
    if (adjust_color) {
        rgb = adjust_saturation_lightness(rgb, uniforms.adjust.x, uniforms.adjust.y);
    }
    let tinted = apply_tint(vec4<f32>(rgb, refracted.a), uniforms.glass_color);
    let light = glass_lighting(normal, sd, h, thickness, refracted.rgb);
    let glass = clamp(vec4<f32>(tinted.rgb + light, tinted.a), vec4<f32>(0.0), vec4<f32>(1.0));
    return mix(background, glass, vec4<f32>(coverage));
}
"#
    };
}

/// Analytic glass: surface from the composed shape field
pub const GLASS_ANALYTIC_SHADER: &str = concat!(
    glass_prelude!(),
    r#"
// ============================================================================
// Analytic surface
// ============================================================================

fn analytic_normal(sd: f32, derivatives: vec2<f32>, thickness: f32) -> vec3<f32> {
    let t = max(thickness, 1.0e-3);
    let cos_theta = clamp((t + sd) / t, 0.0, 1.0);
    let sin_theta = sqrt(max(1.0 - cos_theta * cos_theta, 0.0));
    let n = vec3<f32>(derivatives * cos_theta, sin_theta);
    let len = length(n);
    if (len <= 0.0) {
        return vec3<f32>(0.0, 0.0, 1.0);
    }
    return n / len;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let p = in.position.xy;
    let background = background_texel(p);
    let thickness = uniforms.params.x;
    if (thickness < MIN_THICKNESS) {
        return background;
    }

    let sd = scene_distance(p);
    let band = uniforms.adjust.z;
    var edge: f32 = 1.0;
    if (band > 0.0) {
        edge = smoothstep(-band, band, sd);
    } else if (sd < 0.0) {
        edge = 0.0;
    }
    let coverage = 1.0 - edge;
    if (coverage <= 0.0) {
        return background;
    }

    // Central differences at half a pixel
    let derivatives = vec2<f32>(
        scene_distance(p + vec2<f32>(0.5, 0.0)) - scene_distance(p - vec2<f32>(0.5, 0.0)),
        scene_distance(p + vec2<f32>(0.0, 0.5)) - scene_distance(p - vec2<f32>(0.0, 0.5)),
    );
    let normal = analytic_normal(sd, derivatives, thickness);
    let uv = p / uniforms.viewport_size;
    return shade_glass(uv, sd, normal, coverage, true, background);
}
"#
);

/// Raster glass: surface from sharp and blurred coverage masks
pub const GLASS_MASK_SHADER: &str = concat!(
    glass_prelude!(),
    r#"
// ============================================================================
// Mask surface
// ============================================================================

const MAX_CONTACT_ANGLE: f32 = 1.04719755;
const MIN_ALPHA: f32 = 1.0e-3;
const MIN_GRADIENT: f32 = 1.0e-5;

@group(0) @binding(4) var mask_texture: texture_2d<f32>;
@group(0) @binding(5) var blurred_mask_texture: texture_2d<f32>;

fn mask_value(tex: texture_2d<f32>, uv: vec2<f32>) -> f32 {
    return textureSampleLevel(tex, background_sampler, uv, 0.0).r;
}

// Points toward increasing coverage
fn sobel(tex: texture_2d<f32>, uv: vec2<f32>, offset: vec2<f32>) -> vec2<f32> {
    let tl = mask_value(tex, uv + vec2<f32>(-offset.x, -offset.y));
    let t = mask_value(tex, uv + vec2<f32>(0.0, -offset.y));
    let tr = mask_value(tex, uv + vec2<f32>(offset.x, -offset.y));
    let l = mask_value(tex, uv + vec2<f32>(-offset.x, 0.0));
    let r = mask_value(tex, uv + vec2<f32>(offset.x, 0.0));
    let bl = mask_value(tex, uv + vec2<f32>(-offset.x, offset.y));
    let b = mask_value(tex, uv + vec2<f32>(0.0, offset.y));
    let br = mask_value(tex, uv + vec2<f32>(offset.x, offset.y));
    return vec2<f32>(
        (tr + 2.0 * r + br) - (tl + 2.0 * l + bl),
        (bl + 2.0 * b + br) - (tl + 2.0 * t + tr),
    );
}

fn multiscale_gradient(tex: texture_2d<f32>, uv: vec2<f32>, texel: vec2<f32>) -> vec2<f32> {
    return sobel(tex, uv, texel)
        + sobel(tex, uv, texel * 2.0) * 0.5
        + sobel(tex, uv, texel * 4.0) * 0.25;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let p = in.position.xy;
    let background = background_texel(p);
    let thickness = uniforms.params.x;
    if (thickness < MIN_THICKNESS) {
        return background;
    }

    let uv = p / uniforms.viewport_size;
    let alpha = mask_value(mask_texture, uv);
    if (alpha < MIN_ALPHA) {
        return background;
    }

    let sdf = -smoothstep(0.0, 1.0, mask_value(blurred_mask_texture, uv)) * thickness;
    let depth = clamp(-sdf / thickness, 0.0, 1.0);
    let texel = vec2<f32>(1.0) / vec2<f32>(textureDimensions(mask_texture));
    let g_sharp = multiscale_gradient(mask_texture, uv, texel);
    let g_blurred = multiscale_gradient(blurred_mask_texture, uv, texel);
    let gradient = mix(g_sharp, g_blurred, vec2<f32>(smoothstep(0.0, 0.5, depth)));

    var normal = vec3<f32>(0.0, 0.0, 1.0);
    if (length(gradient) >= MIN_GRADIENT) {
        let outward = -gradient;
        let azimuth = atan2(outward.y, outward.x);
        let theta = MAX_CONTACT_ANGLE * cos(depth * PI * 0.5);
        normal = vec3<f32>(cos(azimuth) * sin(theta), sin(azimuth) * sin(theta), cos(theta));
    }

    let sd = min(sdf, -1.0e-7);
    return shade_glass(uv, sd, normal, clamp(alpha, 0.0, 1.0), false, background);
}
"#
);

/// Parse and validate a WGSL module with naga before handing it to the device
///
/// wgpu reports invalid shaders through the device error callback, which
/// panics by default. Checking up front turns that into a `RendererError`.
pub fn validate_shader(source: &str) -> Result<(), RendererError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| RendererError::ShaderError(e.emit_to_string(source)))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| RendererError::ShaderError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_points(source: &str) -> Vec<String> {
        let module = naga::front::wgsl::parse_str(source).unwrap();
        module.entry_points.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_analytic_shader_validates() {
        validate_shader(GLASS_ANALYTIC_SHADER).unwrap();
    }

    #[test]
    fn test_mask_shader_validates() {
        validate_shader(GLASS_MASK_SHADER).unwrap();
    }

    #[test]
    fn test_entry_points() {
        for source in [GLASS_ANALYTIC_SHADER, GLASS_MASK_SHADER] {
            let names = entry_points(source);
            assert!(names.contains(&"vs_main".to_string()));
            assert!(names.contains(&"fs_main".to_string()));
        }
    }

    #[test]
    fn test_invalid_shader_is_reported() {
        let err = validate_shader("fn broken( -> f32 {").unwrap_err();
        assert!(matches!(err, RendererError::ShaderError(_)));
    }

    #[test]
    fn test_shape_constants_match_core() {
        use vitrum_core::ShapeKind;
        assert!(GLASS_ANALYTIC_SHADER.contains(&format!(
            "SHAPE_SQUIRCLE: u32 = {}u",
            ShapeKind::Squircle.code()
        )));
        assert!(GLASS_ANALYTIC_SHADER.contains(&format!(
            "SHAPE_ELLIPSE: u32 = {}u",
            ShapeKind::Ellipse.code()
        )));
        assert!(GLASS_ANALYTIC_SHADER.contains(&format!(
            "SHAPE_ROUNDED_RECT: u32 = {}u",
            ShapeKind::RoundedRect.code()
        )));
    }
}
