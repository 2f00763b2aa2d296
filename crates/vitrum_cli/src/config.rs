//! Scene file handling
//!
//! A scene file is TOML with four tables:
//! - `[viewport]` - output size and background source
//! - `[settings]` - glass appearance, every field optional
//! - `[[shapes]]` - one entry per glass shape
//! - `[render]` - geometry mode, lighting model and overflow policy

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use vitrum_core::{
    BlurMode, Color, GeometryMode, GlassSettings, LightingModel, OverflowPolicy, RenderOptions,
    Scene, SceneBuilder, ShapeDescriptor, ShapeKind, Size, Vec2,
};

/// Parsed `scene.toml`
#[derive(Debug, Deserialize, Serialize)]
pub struct SceneFile {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub shapes: Vec<ShapeConfig>,
    #[serde(default)]
    pub render: RenderConfig,

    /// Directory the file was loaded from, for resolving image paths
    #[serde(skip)]
    pub base_dir: PathBuf,
}

// =============================================================================
// [viewport]
// =============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct ViewportConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// PNG to place behind the glass; resized to the viewport
    #[serde(default)]
    pub background: Option<String>,
    /// Solid RGBA fill used when no background image is given
    #[serde(default = "default_background_color")]
    pub background_color: [f32; 4],
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_background_color() -> [f32; 4] {
    [0.5, 0.5, 0.5, 1.0]
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            background: None,
            background_color: default_background_color(),
        }
    }
}

// =============================================================================
// [settings]
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetConfig {
    #[default]
    Default,
    Clear,
    Frosted,
    Tinted,
}

/// Glass settings overrides on top of a preset
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SettingsConfig {
    #[serde(default)]
    pub preset: PresetConfig,
    pub glass_color: Option<[f32; 4]>,
    pub thickness: Option<f32>,
    pub blur: Option<f32>,
    pub chromatic_aberration: Option<f32>,
    pub blend: Option<f32>,
    /// Radians
    pub light_angle: Option<f32>,
    pub light_angle_degrees: Option<f32>,
    pub light_intensity: Option<f32>,
    pub ambient_strength: Option<f32>,
    pub refractive_index: Option<f32>,
    pub saturation: Option<f32>,
    pub lightness: Option<f32>,
}

impl SettingsConfig {
    pub fn to_settings(&self) -> GlassSettings {
        let color = self.glass_color.map(Color::from_array);
        let mut settings = match self.preset {
            PresetConfig::Default => GlassSettings::default(),
            PresetConfig::Clear => GlassSettings::clear(),
            PresetConfig::Frosted => GlassSettings::frosted(),
            PresetConfig::Tinted => GlassSettings::tinted(color.unwrap_or(Color::WHITE)),
        };

        if let Some(c) = color {
            settings = settings.with_glass_color(c);
        }
        if let Some(v) = self.thickness {
            settings = settings.with_thickness(v);
        }
        if let Some(v) = self.blur {
            settings = settings.with_blur(v);
        }
        if let Some(v) = self.chromatic_aberration {
            settings = settings.with_chromatic_aberration(v);
        }
        if let Some(v) = self.blend {
            settings = settings.with_blend(v);
        }
        if let Some(v) = self.light_angle_degrees {
            settings = settings.with_light_angle_degrees(v);
        }
        if let Some(v) = self.light_angle {
            settings = settings.with_light_angle(v);
        }
        if let Some(v) = self.light_intensity {
            settings = settings.with_light_intensity(v);
        }
        if let Some(v) = self.ambient_strength {
            settings = settings.with_ambient_strength(v);
        }
        if let Some(v) = self.refractive_index {
            settings = settings.with_refractive_index(v);
        }
        if let Some(v) = self.saturation {
            settings = settings.with_saturation(v);
        }
        if let Some(v) = self.lightness {
            settings = settings.with_lightness(v);
        }
        settings
    }
}

// =============================================================================
// [[shapes]]
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKindConfig {
    Squircle,
    Ellipse,
    RoundedRect,
}

impl From<ShapeKindConfig> for ShapeKind {
    fn from(kind: ShapeKindConfig) -> Self {
        match kind {
            ShapeKindConfig::Squircle => ShapeKind::Squircle,
            ShapeKindConfig::Ellipse => ShapeKind::Ellipse,
            ShapeKindConfig::RoundedRect => ShapeKind::RoundedRect,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShapeConfig {
    pub kind: ShapeKindConfig,
    pub center: [f32; 2],
    pub size: [f32; 2],
    #[serde(default)]
    pub corner_radius: f32,
}

impl ShapeConfig {
    pub fn to_descriptor(&self) -> ShapeDescriptor {
        ShapeDescriptor::new(
            self.kind.into(),
            Vec2::new(self.center[0], self.center[1]),
            Size::new(self.size[0], self.size[1]),
            self.corner_radius,
        )
    }
}

// =============================================================================
// [render]
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeConfig {
    #[default]
    Analytic,
    Mask,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingConfig {
    #[default]
    Specular,
    Adaptive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowConfig {
    #[default]
    Reject,
    Truncate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurConfig {
    #[default]
    Kawase,
    Gaussian,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub mode: ModeConfig,
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default)]
    pub overflow: OverflowConfig,
    #[serde(default)]
    pub blur: BlurConfig,
    #[serde(default = "default_edge_band")]
    pub edge_band: f32,
    /// Foreground PNG whose alpha drives mask mode
    #[serde(default)]
    pub mask: Option<String>,
    /// Blur radius for the smoothed mask, in pixels
    #[serde(default)]
    pub mask_blur: Option<f32>,
}

fn default_edge_band() -> f32 {
    vitrum_core::shading::DEFAULT_EDGE_BAND
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: ModeConfig::default(),
            lighting: LightingConfig::default(),
            overflow: OverflowConfig::default(),
            blur: BlurConfig::default(),
            edge_band: default_edge_band(),
            mask: None,
            mask_blur: None,
        }
    }
}

impl RenderConfig {
    pub fn geometry_mode(&self) -> GeometryMode {
        match self.mode {
            ModeConfig::Analytic => GeometryMode::Analytic,
            ModeConfig::Mask => GeometryMode::Mask,
        }
    }

    pub fn lighting_model(&self) -> LightingModel {
        match self.lighting {
            LightingConfig::Specular => LightingModel::Specular,
            LightingConfig::Adaptive => LightingModel::Adaptive,
        }
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        match self.overflow {
            OverflowConfig::Reject => OverflowPolicy::Reject,
            OverflowConfig::Truncate => OverflowPolicy::Truncate,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            lighting: self.lighting_model(),
            blur_mode: match self.blur {
                BlurConfig::Kawase => BlurMode::Kawase,
                BlurConfig::Gaussian => BlurMode::Gaussian,
            },
            edge_band: self.edge_band,
            cache: false,
        }
    }
}

impl SceneFile {
    /// Load a scene file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut file = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        file.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(file)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Assemble and validate the shape list
    pub fn scene(&self) -> Result<Scene> {
        let scene = SceneBuilder::new()
            .with_policy(self.render.overflow_policy())
            .extend(self.shapes.iter().map(ShapeConfig::to_descriptor))
            .build()
            .context("Invalid glass scene")?;
        Ok(scene)
    }

    pub fn settings(&self) -> GlassSettings {
        self.settings.to_settings()
    }

    /// Resolve a path from the file relative to the file's directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize scene")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
        [viewport]
        width = 320
        height = 200

        [settings]
        preset = "frosted"
        thickness = 28.0
        light_angle_degrees = 45.0

        [[shapes]]
        kind = "squircle"
        center = [100.0, 100.0]
        size = [120.0, 60.0]
        corner_radius = 30.0

        [[shapes]]
        kind = "ellipse"
        center = [200.0, 100.0]
        size = [80.0, 80.0]

        [render]
        lighting = "adaptive"
        overflow = "truncate"
    "#;

    #[test]
    fn test_parse_scene_file() {
        let file = SceneFile::parse(SCENE).unwrap();
        assert_eq!(file.viewport.width, 320);
        assert_eq!(file.shapes.len(), 2);
        assert_eq!(file.shapes[1].corner_radius, 0.0);
        assert_eq!(file.render.lighting_model(), LightingModel::Adaptive);
        assert_eq!(file.render.overflow_policy(), OverflowPolicy::Truncate);
        assert_eq!(file.render.geometry_mode(), GeometryMode::Analytic);

        let scene = file.scene().unwrap();
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.shapes()[0].kind, ShapeKind::Squircle);
    }

    #[test]
    fn test_settings_overrides_apply_on_preset() {
        let file = SceneFile::parse(SCENE).unwrap();
        let settings = file.settings();
        let frosted = GlassSettings::frosted();

        assert_eq!(settings.thickness, 28.0);
        assert_eq!(settings.blur, frosted.blur);
        assert!((settings.light_angle - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = SceneFile::parse("").unwrap();
        assert_eq!(file.viewport.width, 800);
        assert_eq!(file.settings(), GlassSettings::default());
        assert!(file.scene().unwrap().is_empty());
    }

    #[test]
    fn test_negative_size_is_rejected() {
        let file = SceneFile::parse(
            r#"
            [[shapes]]
            kind = "rounded_rect"
            center = [0.0, 0.0]
            size = [-5.0, 10.0]
            "#,
        )
        .unwrap();
        assert!(file.scene().is_err());
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        let result = SceneFile::parse(
            r#"
            [[shapes]]
            kind = "triangle"
            center = [0.0, 0.0]
            size = [5.0, 10.0]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let mut file = SceneFile::parse("").unwrap();
        file.base_dir = PathBuf::from("scenes");
        assert_eq!(file.resolve("bg.png"), PathBuf::from("scenes/bg.png"));
    }

    #[test]
    fn test_round_trip_toml() {
        let file = SceneFile::parse(SCENE).unwrap();
        let again = SceneFile::parse(&file.to_toml().unwrap()).unwrap();
        assert_eq!(again.shapes.len(), 2);
        assert_eq!(again.settings(), file.settings());
    }
}
