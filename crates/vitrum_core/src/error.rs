//! Error types for vitrum_core

use thiserror::Error;

use crate::capture::ImageRole;

/// Errors raised while assembling a glass scene or preparing a frame
///
/// Numeric degeneracies never show up here; they are clamped inside the
/// shading math instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlassError {
    /// More shapes than the composer supports
    #[error("scene has {count} shapes but at most {max} are supported")]
    ShapeLimitExceeded { count: usize, max: usize },

    /// A shape with negative (or non-finite) extents
    #[error("shape {index} has invalid size {width}x{height}")]
    InvalidShapeSize {
        index: usize,
        width: f32,
        height: f32,
    },

    /// A captured image required by the render mode is absent
    #[error("missing {0} image")]
    MissingImage(ImageRole),

    /// A captured image does not cover the viewport
    #[error("{role} image is {actual:?}, expected {expected:?}")]
    SizeMismatch {
        role: ImageRole,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// A captured image belongs to an earlier frame
    #[error("{role} image is from frame {captured}, current frame is {current}")]
    StaleImage {
        role: ImageRole,
        captured: u64,
        current: u64,
    },

    /// A flat uniform list of the wrong length
    #[error("expected {expected} uniform values, got {actual}")]
    InvalidUniforms { expected: usize, actual: usize },

    /// An encoded shape count that is not a whole number in `0..=max`
    #[error("invalid shape count {value}, expected 0..={max}")]
    InvalidShapeCount { value: f32, max: usize },
}

impl GlassError {
    /// Errors detected while assembling the scene, before any shading
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GlassError::ShapeLimitExceeded { .. }
                | GlassError::InvalidShapeSize { .. }
                | GlassError::InvalidUniforms { .. }
                | GlassError::InvalidShapeCount { .. }
        )
    }

    /// Errors that make the current frame unrenderable
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            GlassError::MissingImage(_)
                | GlassError::SizeMismatch { .. }
                | GlassError::StaleImage { .. }
        )
    }
}

/// Result type for vitrum_core operations
pub type Result<T> = std::result::Result<T, GlassError>;
