//! Glass shape descriptors
//!
//! A [`ShapeDescriptor`] is the plain geometric record the layout layer hands
//! over once per frame. The kind is a closed enum dispatched by pattern
//! match; the numeric codes only exist at the uniform-array boundary.

use crate::geometry::{Size, Vec2};
use crate::sdf;

/// Exponent of the superellipse used for [`ShapeKind::Squircle`]
pub const SQUIRCLE_EXPONENT: f32 = 2.0;

/// Distance reported for "no shape here"
///
/// Large enough to never win a union, small enough that squaring it in the
/// smooth-min stays finite in `f32`.
pub const FAR_DISTANCE: f32 = 1.0e9;

/// Shape kinds (codes must match shader constants)
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Empty slot
    #[default]
    None = 0,
    /// Superellipse / continuous-corner rounded rectangle
    Squircle = 1,
    /// Axis-aligned ellipse inscribed in the size box
    Ellipse = 2,
    /// Circular-corner rounded rectangle
    RoundedRect = 3,
}

impl ShapeKind {
    /// Numeric code used in the flat uniform array
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Decode a uniform code; unknown codes are treated as an empty slot
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => ShapeKind::Squircle,
            2 => ShapeKind::Ellipse,
            3 => ShapeKind::RoundedRect,
            _ => ShapeKind::None,
        }
    }
}

/// One glass element of the frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    /// Center in device pixels
    pub center: Vec2,
    /// Full width and height in device pixels
    pub size: Size,
    /// Requested corner radius (clamped at evaluation time)
    pub corner_radius: f32,
}

impl ShapeDescriptor {
    pub const fn new(kind: ShapeKind, center: Vec2, size: Size, corner_radius: f32) -> Self {
        Self {
            kind,
            center,
            size,
            corner_radius,
        }
    }

    /// Empty slot sentinel
    pub const fn none() -> Self {
        Self::new(ShapeKind::None, Vec2::ZERO, Size::ZERO, 0.0)
    }

    pub fn squircle(center: Vec2, size: Size, corner_radius: f32) -> Self {
        Self::new(ShapeKind::Squircle, center, size, corner_radius)
    }

    pub fn ellipse(center: Vec2, size: Size) -> Self {
        Self::new(ShapeKind::Ellipse, center, size, 0.0)
    }

    pub fn rounded_rect(center: Vec2, size: Size, corner_radius: f32) -> Self {
        Self::new(ShapeKind::RoundedRect, center, size, corner_radius)
    }

    /// Build from a top-left origin instead of a center
    pub fn from_rect(kind: ShapeKind, x: f32, y: f32, width: f32, height: f32, radius: f32) -> Self {
        Self::new(
            kind,
            Vec2::new(x + width * 0.5, y + height * 0.5),
            Size::new(width, height),
            radius,
        )
    }

    pub fn half_size(&self) -> Vec2 {
        self.size.to_vec2() * 0.5
    }

    /// Corner radius clamped to half the shorter side
    pub fn effective_radius(&self) -> f32 {
        let half = self.half_size();
        self.corner_radius.max(0.0).min(half.min_element().max(0.0))
    }

    /// Whether this slot contributes anything to the scene
    pub fn is_degenerate(&self) -> bool {
        self.kind == ShapeKind::None || self.size.is_empty()
    }

    /// Signed distance from `point` to this shape's boundary
    pub fn distance(&self, point: Vec2) -> f32 {
        if self.is_degenerate() {
            return FAR_DISTANCE;
        }
        let p = point - self.center;
        let half = self.half_size();
        match self.kind {
            ShapeKind::None => FAR_DISTANCE,
            ShapeKind::Squircle => {
                sdf::squircle(p, half, self.effective_radius(), SQUIRCLE_EXPONENT)
            }
            ShapeKind::Ellipse => sdf::ellipse(p, half),
            ShapeKind::RoundedRect => sdf::rounded_rect(p, half, self.effective_radius()),
        }
    }

    /// Flat uniform layout: kind, center x/y, size w/h, corner radius
    pub fn to_uniforms(&self) -> [f32; 6] {
        [
            self.kind.code() as f32,
            self.center.x,
            self.center.y,
            self.size.width,
            self.size.height,
            self.corner_radius,
        ]
    }

    pub fn from_uniforms(values: &[f32; 6]) -> Self {
        let code = if values[0] >= 0.0 { values[0].round() as u32 } else { 0 };
        Self::new(
            ShapeKind::from_code(code),
            Vec2::new(values[1], values[2]),
            Size::new(values[3], values[4]),
            values[5],
        )
    }
}
